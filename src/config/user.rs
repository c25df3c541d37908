//! ユーザー設定モジュール
//!
//! 実行時にユーザーディレクトリから読み込まれる動的設定を管理します。
//! Windows: C:\Users\<User>\AppData\Roaming\vidsearch\config.toml
//! macOS:   /Users/<User>/Library/Application Support/vidsearch/config.toml
//! Linux:   /home/<user>/.config/vidsearch/config.toml
//!
//! 初回起動時にデフォルト値から自動的にconfig.tomlを作成します。

use crate::config::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// デフォルトのmpv実行ファイル名
const DEFAULT_MPV_PATH: &str = "mpv";

/// 検索結果からのシーク先となるメディア要素の種類
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlayerKind {
    /// ストリームURLの到達性だけを確認し、シーク時はURLを表示する
    #[default]
    Detached,
    /// mpvをJSON IPC経由で操作する
    Mpv,
}

/// プレイヤー設定
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerConfig {
    #[serde(default)]
    pub kind: PlayerKind,

    /// mpvの実行ファイルパス
    #[serde(default = "default_mpv_path")]
    pub mpv_path: String,
}

/// ユーザー設定
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UserConfig {
    #[serde(default)]
    pub player: PlayerConfig,
}

// プライベート関数（serde用）
fn default_mpv_path() -> String {
    DEFAULT_MPV_PATH.to_string()
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            kind: PlayerKind::default(),
            mpv_path: default_mpv_path(),
        }
    }
}

impl UserConfig {
    /// ユーザー設定ファイルのパスを取得
    ///
    /// # Errors
    /// 設定ディレクトリが取得できない場合に ConfigError::DirectoryNotFound を返します。
    pub fn config_path() -> Result<PathBuf, ConfigError> {
        dirs::config_dir()
            .ok_or_else(|| ConfigError::directory_not_found("Failed to get user config directory"))
            .map(|config_dir| config_dir.join("vidsearch").join("config.toml"))
    }

    /// ユーザー設定を既定の場所から読み込む
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::config_path()?)
    }

    /// 指定パスからユーザー設定を読み込む
    ///
    /// ファイルが存在しない場合はデフォルトテンプレートを書き出してから読み込みます。
    /// 読み込み後、自動的に検証を実行します（Fail Fast）。
    pub fn load_from(config_path: &Path) -> Result<Self, ConfigError> {
        if !config_path.exists() {
            Self::create_default_config(config_path)?;
        }

        let content = fs::read_to_string(config_path).map_err(|e| {
            ConfigError::file_system(
                format!("Failed to read config file: {}", config_path.display()),
                e,
            )
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| {
            ConfigError::parse_error(
                format!("Failed to parse config file ({})", config_path.display()),
                e,
            )
        })?;

        config.validate()?;

        Ok(config)
    }

    /// デフォルト設定ファイルを作成
    fn create_default_config(config_path: &Path) -> Result<(), ConfigError> {
        Self::ensure_parent_dir(config_path)?;

        fs::write(config_path, Self::default_toml_content()).map_err(|e| {
            ConfigError::file_system(
                format!("Failed to create default config file: {}", config_path.display()),
                e,
            )
        })
    }

    /// デフォルトTOML設定を生成
    fn default_toml_content() -> String {
        format!(
            r#"# vidsearch - User Configuration

[player]
# "detached": check the stream URL and print seek links
# "mpv": control an mpv window over its IPC socket
kind = "detached"
mpv_path = "{}"
"#,
            DEFAULT_MPV_PATH
        )
    }

    fn ensure_parent_dir(config_path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                ConfigError::file_system(
                    format!("Failed to create config directory: {}", parent.display()),
                    e,
                )
            })?;
        }
        Ok(())
    }

    /// ユーザー設定を検証
    ///
    /// # 検証内容
    /// - player.kind = "mpv" の場合、mpv_path が空でないこと
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.player.kind == PlayerKind::Mpv && self.player.mpv_path.trim().is_empty() {
            return Err(ConfigError::validation_error(
                "player.mpv_path cannot be empty when player.kind = \"mpv\"",
            ));
        }
        Ok(())
    }
}
