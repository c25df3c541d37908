//! 設定管理モジュール
//!
//! 2層の設定構造を提供します:
//! 1. AppConfig - config.toml をビルド時に埋め込んだ静的設定（APP_CONFIG）
//! 2. UserConfig - 実行時に読み込まれる動的設定（プレイヤーの選択）

pub mod app;
pub mod error;
pub mod user;

pub use app::APP_CONFIG;
pub use user::{PlayerKind, UserConfig};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_app_config_direct_access() {
        assert_eq!(APP_CONFIG.api.endpoint, "http://localhost:8000");
        assert!(!APP_CONFIG.upload.supported_formats.is_empty());
        assert!(APP_CONFIG.upload.max_file_size > 0);
    }

    #[test]
    fn test_independent_config_usage() {
        let user_config = UserConfig::default();
        assert!(user_config.validate().is_ok());
        assert_eq!(user_config.player.kind, PlayerKind::Detached);
    }
}
