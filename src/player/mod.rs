//! メディア要素の実装
//!
//! ユーザー設定の `player.kind` に応じて実装を選ぶ。

pub mod detached;
#[cfg(unix)]
pub mod mpv;

use crate::api::{ApiClient, InfraError};
use crate::config::{PlayerKind, UserConfig};
use crate::domain::playback::{MediaElement, MediaEvent};
use crate::domain::session::VideoId;
use detached::DetachedPlayer;
use tokio::sync::mpsc;

pub enum Player {
    Detached(DetachedPlayer),
    #[cfg(unix)]
    Mpv(mpv::MpvPlayer),
}

impl Player {
    /// 設定からメディア要素を作る
    pub fn from_config(
        config: &UserConfig,
        client: ApiClient,
        events: mpsc::Sender<MediaEvent>,
    ) -> Self {
        match config.player.kind {
            PlayerKind::Detached => Self::Detached(DetachedPlayer::new(client, events)),
            #[cfg(unix)]
            PlayerKind::Mpv => Self::Mpv(mpv::MpvPlayer::new(&config.player.mpv_path, events)),
            #[cfg(not(unix))]
            PlayerKind::Mpv => {
                tracing::warn!("player: mpv IPC is only supported on unix, using detached player");
                Self::Detached(DetachedPlayer::new(client, events))
            }
        }
    }

    pub fn kind(&self) -> PlayerKind {
        match self {
            Self::Detached(_) => PlayerKind::Detached,
            #[cfg(unix)]
            Self::Mpv(_) => PlayerKind::Mpv,
        }
    }
}

impl MediaElement for Player {
    async fn load(&mut self, video_id: &VideoId, source_url: &str) -> Result<(), InfraError> {
        match self {
            Self::Detached(p) => p.load(video_id, source_url).await,
            #[cfg(unix)]
            Self::Mpv(p) => p.load(video_id, source_url).await,
        }
    }

    async fn seek_and_play(&mut self, seconds: f64) -> Result<(), InfraError> {
        match self {
            Self::Detached(p) => p.seek_and_play(seconds).await,
            #[cfg(unix)]
            Self::Mpv(p) => p.seek_and_play(seconds).await,
        }
    }
}
