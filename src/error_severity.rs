//! プレゼンテーション層が使用するエラー深刻度
//!
//! 各層のエラー（DomainError / InfraError / ConfigError / PlaybackError）は
//! この分類に写像され、終了コードとJSONエラー出力の `exit_code` に使われる。
//!
//! **依存方向の原則:**
//! - 内側層（domain, api, config, player）はこのモジュールに依存してOK
//! - このモジュールは他のモジュールに依存しない

use serde::Serialize;
use std::fmt;

/// エラーの深刻度と対応する終了コード
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorSeverity {
    /// ユーザーが直せる入力エラー
    ///
    /// 動画以外のファイル、空のファイル、再生準備前のシークなど。
    ///
    /// **Exit Code: 1**
    UserError,

    /// 設定エラー
    ///
    /// ユーザー設定ファイルの破損や不正な値。
    ///
    /// **Exit Code: 2**
    ConfigError,

    /// システムエラー
    ///
    /// 解析サーバーに接続できない、非2xx応答、動画ソースを読み込めないなど。
    ///
    /// **Exit Code: 3**
    SystemError,
}

impl ErrorSeverity {
    /// 対応する Unix 終了コードを返す
    pub fn exit_code(self) -> i32 {
        match self {
            Self::UserError => 1,
            Self::ConfigError => 2,
            Self::SystemError => 3,
        }
    }
}

impl fmt::Display for ErrorSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UserError => write!(f, "user error"),
            Self::ConfigError => write!(f, "configuration error"),
            Self::SystemError => write!(f, "system error"),
        }
    }
}
