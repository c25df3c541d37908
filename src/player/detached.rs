//! 外部プレイヤー向けのメディア要素
//!
//! ストリームURLの先頭を取得して読み込み可否を判定し、
//! シーク時はメディアフラグメント付きURL（`#t=<秒>`）を表示する。

use crate::api::{ApiClient, InfraError};
use crate::domain::formatter::format_clock;
use crate::domain::playback::{MediaElement, MediaEvent};
use crate::domain::session::VideoId;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::debug;

pub struct DetachedPlayer {
    client: ApiClient,
    events: mpsc::Sender<MediaEvent>,
    current_url: Option<String>,
    monitor: Option<JoinHandle<()>>,
}

impl DetachedPlayer {
    pub fn new(client: ApiClient, events: mpsc::Sender<MediaEvent>) -> Self {
        Self {
            client,
            events,
            current_url: None,
            monitor: None,
        }
    }

    /// シーク先のリンク
    pub fn link_at(source_url: &str, seconds: f64) -> String {
        format!("{}#t={}", source_url, seconds)
    }
}

/// Content-Type から再生可能か判定する（不明な場合は可とする）
fn is_playable(content_type: Option<&str>) -> bool {
    match content_type {
        Some(ct) => ct.starts_with("video/") || ct.starts_with("application/octet-stream"),
        None => true,
    }
}

impl MediaElement for DetachedPlayer {
    async fn load(&mut self, video_id: &VideoId, source_url: &str) -> Result<(), InfraError> {
        if let Some(previous) = self.monitor.take() {
            previous.abort();
        }
        self.current_url = Some(source_url.to_string());

        let client = self.client.clone();
        let events = self.events.clone();
        let video_id = video_id.clone();
        let url = source_url.to_string();

        self.monitor = Some(tokio::spawn(async move {
            let event = match client.check_media(&url).await {
                Ok(content_type) if is_playable(content_type.as_deref()) => {
                    MediaEvent::MetadataLoaded(video_id)
                }
                Ok(content_type) => MediaEvent::Failed {
                    video_id,
                    detail: format!(
                        "unsupported content type: {}",
                        content_type.unwrap_or_default()
                    ),
                },
                Err(e) => MediaEvent::Failed {
                    video_id,
                    detail: e.to_string(),
                },
            };
            debug!(?event, "detached: stream check finished");
            // 受信側が閉じていればセッション終了済み
            let _ = events.send(event).await;
        }));

        Ok(())
    }

    async fn seek_and_play(&mut self, seconds: f64) -> Result<(), InfraError> {
        let url = self
            .current_url
            .as_deref()
            .ok_or_else(|| InfraError::media("no video source has been loaded"))?;

        let clock = format_clock(seconds).map_err(|e| InfraError::media(e.to_string()))?;
        eprintln!("▶ {}  {}", clock, Self::link_at(url, seconds));
        Ok(())
    }
}

impl Drop for DetachedPlayer {
    fn drop(&mut self) {
        if let Some(monitor) = self.monitor.take() {
            monitor.abort();
        }
    }
}
