mod api;
mod cli;
mod commands;
mod config;
mod domain;
mod error_severity;
mod player;
mod presentation;
#[cfg(test)]
mod test_support;

use api::error::InfraError;
use config::APP_CONFIG;
use config::error::ConfigError;
use domain::error::DomainError;
use domain::playback::PlaybackError;
use std::env;

#[tokio::main]
async fn main() {
    init_logging();

    let args: Vec<String> = env::args().collect();
    let (machine_output, result) = cli::run(&args).await;

    if let Err(e) = result {
        handle_error(e, machine_output);
    }
}

/// ログ出力を初期化する（stderr、レベルは設定ファイルで指定）
fn init_logging() {
    let level = APP_CONFIG
        .logging
        .level
        .parse::<tracing::Level>()
        .unwrap_or(tracing::Level::WARN);

    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();
}

/// エラーハンドリングとユーザーへの表示
///
/// anyhow::Error から元のエラー型を downcast して、
/// エラーの種類に応じた exit code とメッセージを決定する。
fn handle_error(error: anyhow::Error, machine_output: bool) {
    let exit_code = determine_exit_code(&error);
    let hint = get_error_hint(&error);

    presentation::output::output_error(&error, exit_code, hint.as_deref(), machine_output);

    // 適切な終了コードで終了
    std::process::exit(exit_code);
}

/// エラーチェーンから適切な終了コードを決定
fn determine_exit_code(error: &anyhow::Error) -> i32 {
    // エラーチェーン全体を探索
    for cause in error.chain() {
        if let Some(domain_err) = cause.downcast_ref::<DomainError>() {
            return domain_err.severity().exit_code();
        }

        if let Some(infra_err) = cause.downcast_ref::<InfraError>() {
            return infra_err.severity().exit_code();
        }

        if let Some(config_err) = cause.downcast_ref::<ConfigError>() {
            return config_err.severity().exit_code();
        }

        if let Some(playback_err) = cause.downcast_ref::<PlaybackError>() {
            return playback_err.severity().exit_code();
        }
    }

    // 不明なエラーの場合はデフォルトの終了コード
    1
}

/// エラーに対するユーザー向けヒントを取得
fn get_error_hint(error: &anyhow::Error) -> Option<String> {
    for cause in error.chain() {
        if let Some(domain_err) = cause.downcast_ref::<DomainError>()
            && let Some(hint) = domain_err.hint()
        {
            return Some(hint.to_string());
        }

        if let Some(infra_err) = cause.downcast_ref::<InfraError>()
            && let Some(hint) = infra_err.hint()
        {
            return Some(hint.to_string());
        }

        if let Some(config_err) = cause.downcast_ref::<ConfigError>()
            && let Some(hint) = config_err.hint()
        {
            return Some(hint.to_string());
        }

        if let Some(playback_err) = cause.downcast_ref::<PlaybackError>()
            && let Some(hint) = playback_err.hint()
        {
            return Some(hint.to_string());
        }
    }

    None
}
