//! インフラ層のエラー定義
//!
//! 解析・検索サーバーおよびメディア要素とのやり取りで発生するエラー。
//! 上位層では解析/検索の失敗（転送エラー）と動画読み込み失敗に分類される。

use crate::error_severity::ErrorSeverity;
use std::io;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum InfraError {
    /// ネットワークエラー（接続不可など）
    #[error("network error: {message}")]
    Network { message: String },

    /// 非2xx応答
    #[error("API error: {endpoint} - {message}")]
    Api {
        endpoint: String,
        message: String,
        status_code: Option<u16>,
    },

    /// タイムアウトエラー
    #[error("operation timed out: {operation}")]
    Timeout { operation: String },

    /// 応答の形式が想定と異なる
    #[error("invalid response from {endpoint}: {message}")]
    InvalidResponse { endpoint: String, message: String },

    /// 動画ソースが読み込めない（未対応の形式・到達不能）
    #[error("media error: {message}")]
    Media { message: String },

    /// その他のI/Oエラー
    #[error("I/O error: {context}")]
    Io {
        context: String,
        #[source]
        source: io::Error,
    },
}

impl InfraError {
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network {
            message: message.into(),
        }
    }

    pub fn api(endpoint: impl Into<String>, message: impl Into<String>, status_code: Option<u16>) -> Self {
        Self::Api {
            endpoint: endpoint.into(),
            message: message.into(),
            status_code,
        }
    }

    pub fn timeout(operation: impl Into<String>) -> Self {
        Self::Timeout {
            operation: operation.into(),
        }
    }

    pub fn invalid_response(endpoint: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidResponse {
            endpoint: endpoint.into(),
            message: message.into(),
        }
    }

    pub fn media(message: impl Into<String>) -> Self {
        Self::Media {
            message: message.into(),
        }
    }

    pub fn io(context: impl Into<String>, source: io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// エラーの深刻度を返す
    pub fn severity(&self) -> ErrorSeverity {
        ErrorSeverity::SystemError
    }

    /// ユーザー向けのヒントメッセージを返す
    pub fn hint(&self) -> Option<&str> {
        match self {
            Self::Network { .. } | Self::Timeout { .. } => {
                Some("Make sure the analysis server is running and reachable.")
            }
            Self::Api { .. } | Self::InvalidResponse { .. } => {
                Some("The server rejected the request. Check the server logs.")
            }
            Self::Media { .. } => {
                Some("The video could not be loaded. Check that the file name exists on the server.")
            }
            Self::Io { .. } => None,
        }
    }
}
