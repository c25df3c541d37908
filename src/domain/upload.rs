//! アップロードコントローラー
//!
//! ファイル選択からアップロード完了までのライフサイクルを管理する。
//! 送信中は疑似進捗を流し、応答の成否にかかわらずティッカーを必ず停止する。

use crate::api::{InfraError, VideoSearchApi};
use crate::domain::error::DomainError;
use crate::domain::progress::ProgressEstimator;
use crate::domain::session::{AnalysisResult, SelectedFile, SessionHandle, VideoId};
use crate::domain::validator;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, info, warn};

pub const UPLOADING_TEXT: &str = "Uploading and analyzing the video... this may take a few moments.";
pub const UPLOAD_SUCCESS_TEXT: &str = "Analysis complete! You can now search the index.";
pub const UPLOAD_ERROR_TEXT: &str = "Failed to upload the video. Make sure the server is running.";

/// `upload()` の結果
#[derive(Debug)]
pub enum UploadOutcome {
    /// ファイル未選択、または送信中のため何もしなかった
    Skipped,
    Succeeded { video_id: VideoId },
    Failed { error: InfraError },
}

pub struct UploadController<A> {
    api: Arc<A>,
    session: SessionHandle,
    progress: ProgressEstimator,
}

impl<A: VideoSearchApi> UploadController<A> {
    pub fn new(api: Arc<A>, session: SessionHandle, progress: ProgressEstimator) -> Self {
        Self {
            api,
            session,
            progress,
        }
    }

    /// ファイルを選択する
    ///
    /// 選択経路によらず動画（`video/*`）のみ受け付ける。
    pub fn select_file(&self, candidate: SelectedFile) -> Result<(), DomainError> {
        validator::ensure_video_mime(&candidate)?;

        let name = candidate.name().to_string();
        if !self.session.update(|s| s.select_file(candidate)) {
            return Err(DomainError::UploadInProgress);
        }

        info!(file = %name, "upload: file selected");
        Ok(())
    }

    pub fn clear_file(&self) {
        self.session.update(|s| s.clear_file());
    }

    /// 表示用の進捗(0〜100)を購読する
    pub fn progress(&self) -> watch::Receiver<f64> {
        self.progress.subscribe()
    }

    /// 選択中のファイルを解析エンドポイントに送信する
    pub async fn upload(&self) -> UploadOutcome {
        let Some(file) = self.session.update(|s| s.begin_upload(UPLOADING_TEXT)) else {
            debug!("upload: nothing to do (no file selected or upload in flight)");
            return UploadOutcome::Skipped;
        };

        info!(file = %file.name(), size = file.size_bytes(), "upload: started");
        let run = self.progress.start();

        match self.api.upload_video(&file).await {
            Ok(response) => {
                run.complete();
                let video_id = VideoId::new(response.filename);
                let analysis = AnalysisResult::new(response.analysis);
                self.session.update(|s| {
                    s.finish_upload_success(analysis, video_id.clone(), UPLOAD_SUCCESS_TEXT)
                });
                info!(video = %video_id, "upload: analysis complete");
                UploadOutcome::Succeeded { video_id }
            }
            Err(e) => {
                run.abandon();
                warn!(err = %e, file = %file.name(), "upload: failed");
                self.session.update(|s| s.finish_upload_failure(UPLOAD_ERROR_TEXT));
                UploadOutcome::Failed { error: e }
            }
        }
    }
}
