//! API通信用の型定義
//!
//! 解析・検索サーバーのJSONレスポンスをデシリアライズするための構造体。

use crate::domain::session::SearchResult;
use serde::{Deserialize, Serialize};

/// POST /upload-video のレスポンス
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadResponse {
    /// 解析結果（内容はサーバー依存）
    #[serde(default)]
    pub analysis: serde_json::Value,

    /// サーバーに保存されたファイル名
    pub filename: String,
}

impl UploadResponse {
    /// ストリームURLを組み立てられる応答か
    pub fn is_valid(&self) -> bool {
        !self.filename.trim().is_empty()
    }
}

/// GET /search のレスポンス
///
/// `results` が無い場合は空リストとして扱う。
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub results: Vec<SearchResult>,
}

impl SearchResponse {
    /// 秒数が負数・非有限の結果を含まないか
    pub fn is_valid(&self) -> bool {
        self.results
            .iter()
            .all(|r| r.time.is_finite() && r.time >= 0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upload_response_deserialization() {
        let json = r#"{
            "filename": "cat.mp4",
            "analysis": [{"object": "cat", "time": 2.0}]
        }"#;

        let response: UploadResponse = serde_json::from_str(json).expect("Failed to parse");
        assert_eq!(response.filename, "cat.mp4");
        assert!(response.analysis.is_array());
        assert!(response.is_valid());
    }

    #[test]
    fn test_upload_response_without_filename_fails() {
        let json = r#"{ "analysis": [] }"#;
        assert!(serde_json::from_str::<UploadResponse>(json).is_err());
    }

    #[test]
    fn test_search_response_missing_results_is_empty() {
        let response: SearchResponse = serde_json::from_str("{}").unwrap();
        assert!(response.results.is_empty());
        assert!(response.is_valid());
    }

    #[test]
    fn test_search_response_keeps_server_order() {
        let json = r#"{ "results": [
            {"object": "dog", "time": 12.4},
            {"object": "dog", "time": 3.0}
        ] }"#;
        let response: SearchResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.results[0].time, 12.4);
        assert_eq!(response.results[1].time, 3.0);
    }

    #[test]
    fn test_search_response_rejects_negative_time() {
        let response = SearchResponse {
            results: vec![SearchResult {
                object: "dog".into(),
                time: -1.0,
            }],
        };
        assert!(!response.is_valid());
    }
}
