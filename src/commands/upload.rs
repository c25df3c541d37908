use crate::api::{ApiClient, VideoSearchApi};
use crate::commands::result::{CommandResult, UploadResult};
use crate::domain::progress::{ProgressEstimator, ProgressSettings};
use crate::domain::session::SessionHandle;
use crate::domain::upload::{UploadController, UploadOutcome};
use crate::domain::validator;
use crate::presentation::progress::{ProgressFormat, ProgressRenderer};
use anyhow::{Context, Result, bail};
use std::sync::Arc;

/// アップロードコマンドを実行する
///
/// # 引数
/// * `file_path` - アップロード対象の動画ファイルのパス
/// * `progress` - 進捗表示の形式（`None` なら表示しない）
///
/// # エラー
/// このレイヤーでは anyhow::Result を返し、
/// ドメイン層・インフラ層のエラーを集約する。
pub async fn execute(file_path: &str, progress: Option<ProgressFormat>) -> Result<CommandResult> {
    let api = Arc::new(ApiClient::production().context("Failed to create API client")?);
    run(api, file_path, progress).await
}

async fn run<A: VideoSearchApi>(
    api: Arc<A>,
    file_path: &str,
    progress: Option<ProgressFormat>,
) -> Result<CommandResult> {
    // ドメイン層のバリデーションを実行
    // DomainError は自動的に anyhow::Error に変換される
    let file = validator::inspect_file(file_path).context("File validation failed")?;

    let session = SessionHandle::new();
    let controller = UploadController::new(
        Arc::clone(&api),
        session.clone(),
        ProgressEstimator::new(ProgressSettings::from_config()),
    );
    controller
        .select_file(file.clone())
        .context("File validation failed")?;

    let renderer = progress.map(|format| ProgressRenderer::spawn(controller.progress(), format));
    let outcome = controller.upload().await;
    if let Some(renderer) = renderer {
        renderer.finish();
    }

    let video_id = match outcome {
        UploadOutcome::Succeeded { video_id } => video_id,
        UploadOutcome::Failed { error } => {
            return Err(error).context(format!("Failed to upload '{}'", file.name()));
        }
        UploadOutcome::Skipped => bail!("Upload did not start"),
    };

    let analysis = session
        .read(|s| s.analysis().cloned())
        .context("Server response did not include an analysis result")?;

    Ok(CommandResult::Upload(UploadResult {
        file_path: file.path().display().to_string(),
        file_size: file.size_bytes(),
        mime_type: file.mime_type().to_string(),
        stream_url: api.video_url(&video_id),
        video_id: video_id.to_string(),
        labels: analysis.summary(),
        analysis: analysis.raw().clone(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::client::local_client;
    use crate::api::InfraError;
    use crate::domain::error::DomainError;
    use crate::test_support::serve_once;
    use std::io::Write;

    fn video_file(dir: &tempfile::TempDir, name: &str) -> String {
        let path = dir.path().join(name);
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(b"fake video bytes").unwrap();
        path.display().to_string()
    }

    #[tokio::test]
    async fn test_upload_returns_stream_url_and_summary() {
        let dir = tempfile::tempdir().unwrap();
        let path = video_file(&dir, "cat.mp4");
        let body = r#"{"analysis":[{"object":"cat","time":1.5},{"object":"cat","time":0.5}],"filename":"cat.mp4"}"#;
        let (base_url, request) = serve_once("200 OK", body).await;

        let result = run(Arc::new(local_client(&base_url)), &path, None)
            .await
            .unwrap();

        let CommandResult::Upload(upload) = result else {
            panic!("expected an upload result");
        };
        assert_eq!(upload.video_id, "cat.mp4");
        assert_eq!(upload.stream_url, format!("{base_url}/videos/cat.mp4"));
        assert_eq!(upload.mime_type, "video/mp4");
        assert_eq!(upload.labels.len(), 1);
        assert_eq!(upload.labels[0].count, 2);
        assert_eq!(upload.labels[0].first_seen, 0.5);

        let request = request.await.unwrap();
        assert!(request.starts_with("POST /upload-video"));
    }

    #[tokio::test]
    async fn test_non_video_file_is_rejected_before_sending() {
        let dir = tempfile::tempdir().unwrap();
        let path = video_file(&dir, "notes.txt");

        let err = run(Arc::new(local_client("http://127.0.0.1:9")), &path, None)
            .await
            .unwrap_err();

        assert!(matches!(
            err.root_cause().downcast_ref::<DomainError>(),
            Some(DomainError::UnsupportedMediaType { .. })
        ));
    }

    #[tokio::test]
    async fn test_server_error_surfaces_infra_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = video_file(&dir, "cat.mp4");
        let (base_url, _request) = serve_once("500 Internal Server Error", r#"{"detail":"boom"}"#).await;

        let err = run(Arc::new(local_client(&base_url)), &path, None)
            .await
            .unwrap_err();

        assert!(err.chain().any(|c| c.downcast_ref::<InfraError>().is_some()));
    }
}
