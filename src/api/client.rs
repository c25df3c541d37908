//! HTTPクライアント
//!
//! 解析・検索サーバーとの通信を担当するHTTPクライアント。
//! タイムアウトとエラーの分類を含みます。

use crate::api::error::InfraError;
use crate::api::types::{SearchResponse, UploadResponse};
use crate::api::{ApiResult, VideoSearchApi};
use crate::config::APP_CONFIG;
use crate::domain::session::{SelectedFile, VideoId};
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Response};
use tracing::{debug, info};

const UPLOAD_ENDPOINT: &str = "/upload-video";
const SEARCH_ENDPOINT: &str = "/search";
const VIDEOS_ENDPOINT: &str = "/videos";

/// APIクライアント
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
}

impl ApiClient {
    /// 新しいAPIクライアントを作成
    ///
    /// # Arguments
    /// * `base_url` - APIのベースURL（例: "http://localhost:8000"）
    pub fn new(base_url: impl Into<String>) -> ApiResult<Self> {
        let client = Client::builder()
            .timeout(APP_CONFIG.api.timeout())
            .build()
            .map_err(|e| InfraError::network(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self::with_client(client, base_url))
    }

    /// 設定済みのエンドポイントに接続するクライアントを作成
    pub fn production() -> ApiResult<Self> {
        Self::new(APP_CONFIG.api.endpoint.as_str())
    }

    fn with_client(client: Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { client, base_url }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// ストリームURLの先頭1バイトだけを要求し、到達性とContent-Typeを確認する
    pub async fn check_media(&self, url: &str) -> ApiResult<Option<String>> {
        let request = self.client.get(url).header(reqwest::header::RANGE, "bytes=0-0");
        let response = Self::send_with_error_handling(request, url, "GET").await?;
        let response = Self::check_response(response, url).await?;

        Ok(response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.to_string()))
    }

    /// URLを構築
    fn build_url(&self, endpoint: &str) -> String {
        format!("{}{}", self.base_url, endpoint)
    }

    /// リクエストを送信し、エラーを分類する
    async fn send_with_error_handling(
        request: reqwest::RequestBuilder,
        endpoint: &str,
        method: &str,
    ) -> ApiResult<Response> {
        request.send().await.map_err(|e| {
            if e.is_timeout() {
                InfraError::timeout(format!("{} {}", method, endpoint))
            } else if e.is_connect() {
                InfraError::network(format!("Connection failed for {} {}: {}", method, endpoint, e))
            } else {
                InfraError::network(format!("Request failed for {} {}: {}", method, endpoint, e))
            }
        })
    }

    /// 非2xx応答をエラーに変換する
    pub async fn check_response(response: Response, endpoint: &str) -> ApiResult<Response> {
        let status = response.status();

        if status.is_success() {
            return Ok(response);
        }

        let status_code = status.as_u16();
        let error_body = response
            .text()
            .await
            .unwrap_or_else(|_| "Unable to read error response".to_string());

        Err(InfraError::api(endpoint, error_body, Some(status_code)))
    }

    /// JSONレスポンスをデシリアライズ
    pub async fn parse_json<T: serde::de::DeserializeOwned>(
        response: Response,
        endpoint: &str,
    ) -> ApiResult<T> {
        response.json().await.map_err(|e| {
            InfraError::invalid_response(endpoint, format!("Failed to parse JSON response: {}", e))
        })
    }

    /// 送信するmultipartボディを作成（フィールド名は `file`）
    async fn build_upload_form(file: &SelectedFile) -> ApiResult<Form> {
        let bytes = tokio::fs::read(file.path()).await.map_err(|e| {
            InfraError::io(format!("Failed to read {}", file.path().display()), e)
        })?;

        let part = Part::bytes(bytes)
            .file_name(file.name().to_string())
            .mime_str(file.mime_type())
            .map_err(|e| {
                InfraError::network(format!("Invalid MIME type '{}': {}", file.mime_type(), e))
            })?;

        Ok(Form::new().part("file", part))
    }
}

impl VideoSearchApi for ApiClient {
    async fn upload_video(&self, file: &SelectedFile) -> ApiResult<UploadResponse> {
        let form = Self::build_upload_form(file).await?;
        info!(file = %file.name(), size = file.size_bytes(), "api: POST {}", UPLOAD_ENDPOINT);

        let request = self.client.post(self.build_url(UPLOAD_ENDPOINT)).multipart(form);
        let response = Self::send_with_error_handling(request, UPLOAD_ENDPOINT, "POST").await?;
        let response = Self::check_response(response, UPLOAD_ENDPOINT).await?;
        let body: UploadResponse = Self::parse_json(response, UPLOAD_ENDPOINT).await?;

        if !body.is_valid() {
            return Err(InfraError::invalid_response(
                UPLOAD_ENDPOINT,
                "response did not include a filename",
            ));
        }
        Ok(body)
    }

    async fn search(&self, label: &str) -> ApiResult<SearchResponse> {
        debug!(label, "api: GET {}", SEARCH_ENDPOINT);

        let request = self
            .client
            .get(self.build_url(SEARCH_ENDPOINT))
            .query(&[("object", label)]);
        let response = Self::send_with_error_handling(request, SEARCH_ENDPOINT, "GET").await?;
        let response = Self::check_response(response, SEARCH_ENDPOINT).await?;
        let body: SearchResponse = Self::parse_json(response, SEARCH_ENDPOINT).await?;

        if !body.is_valid() {
            return Err(InfraError::invalid_response(
                SEARCH_ENDPOINT,
                "result contained a negative or non-finite time",
            ));
        }
        Ok(body)
    }

    fn video_url(&self, video_id: &VideoId) -> String {
        format!(
            "{}{}/{}",
            self.base_url,
            VIDEOS_ENDPOINT,
            urlencoding::encode(video_id.as_str())
        )
    }
}

/// テスト用: プロキシ設定を無視するクライアント
#[cfg(test)]
pub(crate) fn local_client(base_url: &str) -> ApiClient {
    let client = Client::builder()
        .no_proxy()
        .timeout(std::time::Duration::from_secs(5))
        .build()
        .unwrap();
    ApiClient::with_client(client, base_url)
}
