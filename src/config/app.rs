//! アプリケーション設定モジュール
//!
//! ビルド時に config.toml から読み込まれる静的設定を管理します。
//! バックエンドのアドレスはここで固定され、実行時には変更できません。

use serde::Deserialize;
use std::sync::LazyLock;
use std::time::Duration;

/// 埋め込み設定のグローバルインスタンス
pub static APP_CONFIG: LazyLock<AppConfig> = LazyLock::new(AppConfig::load);

/// アプリケーション全体の設定
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub api: ApiConfig,
    pub upload: UploadConfig,
    pub progress: ProgressConfig,
    pub logging: LoggingConfig,
}

/// API関連の設定
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    /// 解析・検索バックエンドのベースURL
    pub endpoint: String,

    /// APIリクエストのタイムアウト(秒)
    pub timeout_seconds: u64,
}

/// アップロード関連の設定
#[derive(Debug, Clone, Deserialize)]
pub struct UploadConfig {
    /// アップロード可能な最大ファイルサイズ (バイト)
    pub max_file_size: u64,

    /// 対応する動画フォーマット（拡張子とMIMEタイプの対応表）
    pub supported_formats: Vec<VideoFormat>,
}

/// 拡張子とMIMEタイプの組
#[derive(Debug, Clone, Deserialize)]
pub struct VideoFormat {
    pub extension: String,
    pub mime_type: String,
}

/// 疑似進捗の設定
#[derive(Debug, Clone, Deserialize)]
pub struct ProgressConfig {
    /// 進捗を進める間隔(ミリ秒)
    pub tick_interval_ms: u64,

    /// 1ティックあたりの最大増分(%)
    pub max_increment: f64,

    /// 応答待ちの間に表示できる上限(%)。90未満であること
    pub in_flight_cap: f64,

    /// 完了後に0へ戻すまでの遅延(ミリ秒)
    pub decay_delay_ms: u64,
}

/// ロギング関連の設定
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// ログレベル (trace, debug, info, warn, error)
    pub level: String,
}

impl ApiConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

impl UploadConfig {
    /// 拡張子(小文字)に対応するMIMEタイプを返す
    pub fn mime_for_extension(&self, extension: &str) -> Option<&str> {
        self.supported_formats
            .iter()
            .find(|f| f.extension.eq_ignore_ascii_case(extension))
            .map(|f| f.mime_type.as_str())
    }
}

impl AppConfig {
    /// ビルド時に埋め込まれたconfig.tomlから設定を読み込む
    ///
    /// # Panics
    /// 設定ファイルのパースに失敗した場合はパニックします。
    /// これはビルド時設定なので、実行時エラーではなくビルドの誤りとして扱います。
    pub fn load() -> Self {
        const CONFIG_STR: &str = include_str!("../../config.toml");
        toml::from_str(CONFIG_STR)
            .expect("Failed to parse embedded config.toml. This is a build-time configuration error.")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_config() {
        let config = AppConfig::load();
        assert_eq!(config.api.endpoint, "http://localhost:8000");
        assert!(config.api.timeout_seconds > 0);
        assert!(!config.upload.supported_formats.is_empty());
    }

    #[test]
    fn test_progress_cap_stays_below_ninety() {
        let config = AppConfig::load();
        assert!(config.progress.in_flight_cap < 90.0);
        assert!(config.progress.max_increment > 0.0);
        assert!(config.progress.tick_interval_ms > 0);
    }

    #[test]
    fn test_mime_lookup_is_case_insensitive() {
        let config = AppConfig::load();
        assert_eq!(config.upload.mime_for_extension("MP4"), Some("video/mp4"));
        assert_eq!(config.upload.mime_for_extension("mov"), Some("video/quicktime"));
        assert_eq!(config.upload.mime_for_extension("txt"), None);
    }

    #[test]
    fn test_every_supported_format_is_video() {
        let config = AppConfig::load();
        for format in &config.upload.supported_formats {
            assert!(format.mime_type.starts_with("video/"), "{}", format.mime_type);
        }
    }
}
