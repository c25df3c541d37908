//! 再生同期
//!
//! 現在の動画のメタデータが読み込まれたかを追跡し、検索結果からの
//! 「その時刻へ移動して再生」をメディア要素に中継する。
//! メディア要素は [`MediaElement`] の背後に隠し、読み込み完了・失敗は
//! [`MediaEvent`] として届く。

use crate::api::InfraError;
use crate::domain::error::DomainError;
use crate::domain::session::{SearchResult, SessionHandle, VideoId};
use crate::error_severity::ErrorSeverity;
use std::future::Future;
use thiserror::Error;
use tracing::{debug, info, warn};

pub const PLAYBACK_ERROR_TEXT: &str =
    "Could not load the video (unsupported codec or bad path). Check that the name is valid and exists.";

/// メディア要素の操作インターフェース
pub trait MediaElement: Send {
    /// 動画ソースの読み込みを開始する
    ///
    /// 完了・失敗は後から [`MediaEvent`] で通知される。
    fn load(
        &mut self,
        video_id: &VideoId,
        source_url: &str,
    ) -> impl Future<Output = Result<(), InfraError>> + Send;

    /// 再生位置を移動して再生を開始する
    fn seek_and_play(&mut self, seconds: f64) -> impl Future<Output = Result<(), InfraError>> + Send;
}

/// メディア要素から届くイベント
#[derive(Debug, Clone, PartialEq)]
pub enum MediaEvent {
    MetadataLoaded(VideoId),
    Failed { video_id: VideoId, detail: String },
}

/// 検索結果に表示するシーク操作
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SeekAction {
    Enabled { seconds: f64 },
    /// 再生準備中（無効表示）
    Disabled,
}

#[derive(Error, Debug)]
pub enum PlaybackError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error("failed to control the media element")]
    Media(#[source] InfraError),
}

impl PlaybackError {
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            Self::Domain(e) => e.severity(),
            Self::Media(e) => e.severity(),
        }
    }

    pub fn hint(&self) -> Option<&str> {
        match self {
            Self::Domain(e) => e.hint(),
            Self::Media(e) => e.hint(),
        }
    }
}

pub struct PlaybackSynchronizer<M> {
    media: M,
    session: SessionHandle,
}

impl<M: MediaElement> PlaybackSynchronizer<M> {
    pub fn new(media: M, session: SessionHandle) -> Self {
        Self { media, session }
    }

    #[cfg(test)]
    pub fn media(&self) -> &M {
        &self.media
    }

    /// 再生対象が変わった
    ///
    /// 再生準備をリセットしてから新しいソースを読み込む。
    pub async fn on_video_identifier_changed(&mut self, video_id: VideoId, source_url: &str) {
        self.session.update(|s| s.set_video(video_id.clone()));
        info!(video = %video_id, url = source_url, "playback: loading source");

        if let Err(e) = self.media.load(&video_id, source_url).await {
            self.on_playback_error(&video_id, &e.to_string());
        }
    }

    /// メタデータの読み込みが完了した
    pub fn on_metadata_loaded(&self, video_id: &VideoId) -> bool {
        let accepted = self.session.update(|s| s.mark_playback_ready(video_id));
        if accepted {
            info!(video = %video_id, "playback: ready");
        } else {
            debug!(video = %video_id, "playback: ignoring metadata for a superseded source");
        }
        accepted
    }

    /// 動画ソースを読み込めなかった
    pub fn on_playback_error(&self, video_id: &VideoId, detail: &str) -> bool {
        let accepted = self
            .session
            .update(|s| s.mark_playback_failed(video_id, PLAYBACK_ERROR_TEXT));
        if accepted {
            warn!(video = %video_id, detail, "playback: source failed to load");
        }
        accepted
    }

    /// メディア要素からのイベントを振り分ける
    pub fn handle_event(&self, event: MediaEvent) -> bool {
        match event {
            MediaEvent::MetadataLoaded(video_id) => self.on_metadata_loaded(&video_id),
            MediaEvent::Failed { video_id, detail } => self.on_playback_error(&video_id, &detail),
        }
    }

    /// 検索結果のシーク操作を有効にするか
    pub fn seek_action(&self, result: &SearchResult) -> SeekAction {
        if self.session.read(|s| s.is_playback_ready()) {
            SeekAction::Enabled {
                seconds: result.time,
            }
        } else {
            SeekAction::Disabled
        }
    }

    /// 指定秒へ移動して再生する
    ///
    /// 再生準備前の呼び出しは呼び出し側の誤りとして `PlaybackNotReady` を返す。
    pub async fn seek_to(&mut self, seconds: f64) -> Result<(), PlaybackError> {
        if !seconds.is_finite() || seconds < 0.0 {
            return Err(DomainError::InvalidTimestamp { value: seconds }.into());
        }
        if !self.session.read(|s| s.is_playback_ready()) {
            return Err(DomainError::PlaybackNotReady.into());
        }

        debug!(seconds, "playback: seek");
        self.media
            .seek_and_play(seconds)
            .await
            .map_err(PlaybackError::Media)
    }
}
