use crate::commands::result::CommandResult;

/// ヘルプコマンドを実行
///
/// 表示はプレゼンテーション層が行う。
pub async fn execute() -> anyhow::Result<CommandResult> {
    Ok(CommandResult::Help)
}
