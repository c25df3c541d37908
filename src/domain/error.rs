//! ドメイン層のエラー定義
//!
//! ファイル選択・アップロード・再生に関するビジネスルール違反を表現する。
//! 外部クレートのエラーは含まない。

use crate::error_severity::ErrorSeverity;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum DomainError {
    /// ファイルが見つからない
    #[error("file not found: {path}")]
    FileNotFound { path: String },

    /// ディレクトリが指定された（ファイルが期待される場所）
    #[error("'{path}' is a directory, not a file")]
    NotAFile { path: String },

    /// ファイルが空
    #[error("file is empty: {path}")]
    EmptyFile { path: String },

    /// ファイルサイズが制限を超過
    #[error("file too large: {size} bytes (maximum allowed: {max} bytes)")]
    FileTooLarge { size: u64, max: u64 },

    /// 動画ではないファイルが選択された
    #[error("unsupported media type for '{name}': {mime_type} (expected video/*)")]
    UnsupportedMediaType { name: String, mime_type: String },

    /// アップロード中にファイルを差し替えようとした
    #[error("an upload is already in progress")]
    UploadInProgress,

    /// 再生準備が整う前にシークしようとした
    #[error("playback is not ready for the current video")]
    PlaybackNotReady,

    /// 負数・非有限の秒数
    #[error("invalid timestamp: {value}")]
    InvalidTimestamp { value: f64 },
}

impl DomainError {
    pub fn file_not_found(path: impl Into<String>) -> Self {
        Self::FileNotFound { path: path.into() }
    }

    pub fn not_a_file(path: impl Into<String>) -> Self {
        Self::NotAFile { path: path.into() }
    }

    pub fn empty_file(path: impl Into<String>) -> Self {
        Self::EmptyFile { path: path.into() }
    }

    pub fn unsupported_media_type(name: impl Into<String>, mime_type: impl Into<String>) -> Self {
        Self::UnsupportedMediaType {
            name: name.into(),
            mime_type: mime_type.into(),
        }
    }

    /// エラーの深刻度を返す
    ///
    /// ドメインエラーはすべてユーザーが対処できるもの
    pub fn severity(&self) -> ErrorSeverity {
        ErrorSeverity::UserError
    }

    /// ユーザー向けのヒントメッセージを返す
    pub fn hint(&self) -> Option<&str> {
        match self {
            Self::FileNotFound { .. } => {
                Some("Please check the file path and ensure the file exists.")
            }
            Self::NotAFile { .. } => Some("Please specify a file, not a directory."),
            Self::EmptyFile { .. } => Some("The file appears to be empty or corrupted."),
            Self::FileTooLarge { .. } => Some("Try compressing the video or use a smaller file."),
            Self::UnsupportedMediaType { .. } => {
                Some("Supported formats: mp4, mov, avi, mkv, webm")
            }
            Self::UploadInProgress => Some("Wait for the current upload to finish."),
            Self::PlaybackNotReady => {
                Some("Wait until the video has loaded before jumping to a timestamp.")
            }
            Self::InvalidTimestamp { .. } => None,
        }
    }
}
