//! 解析・検索サーバーとの通信
//!
//! - `POST /upload-video` : 動画を1リクエストで送信し、解析結果とファイル名を受け取る
//! - `GET /search?object=<label>` : ラベルで検出結果を検索する
//! - `GET /videos/{filename}` : アップロード済み動画のストリーム（URLとしてのみ使用）
//!
//! ドメイン層のコントローラーは [`VideoSearchApi`] にのみ依存し、
//! テストでは差し替え可能な実装を使う。

pub mod client;
pub mod error;
pub mod types;

pub use client::ApiClient;
pub use error::InfraError;

use crate::domain::session::{SelectedFile, VideoId};
use std::future::Future;
use types::{SearchResponse, UploadResponse};

/// APIクライアントの結果型
pub type ApiResult<T> = Result<T, InfraError>;

/// 解析・検索バックエンドの境界
pub trait VideoSearchApi: Send + Sync {
    /// 動画を送信し、解析結果を受け取る
    fn upload_video(
        &self,
        file: &SelectedFile,
    ) -> impl Future<Output = ApiResult<UploadResponse>> + Send;

    /// ラベルで検索する（`label` は整形済み）
    fn search(&self, label: &str) -> impl Future<Output = ApiResult<SearchResponse>> + Send;

    /// 動画のストリームURL
    fn video_url(&self, video_id: &VideoId) -> String;
}
