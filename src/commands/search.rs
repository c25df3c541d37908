use crate::api::{ApiClient, VideoSearchApi};
use crate::commands::result::{CommandResult, MatchEntry, SearchCommandResult};
use crate::domain::error::DomainError;
use crate::domain::search::{SearchController, SearchOutcome};
use crate::domain::session::SessionHandle;
use anyhow::{Context, Result, bail};
use std::sync::Arc;

/// 検索コマンドを実行する
///
/// # 引数
/// * `label` - 検索するラベル（前後の空白は無視される）
pub async fn execute(label: &str) -> Result<CommandResult> {
    let api = Arc::new(ApiClient::production().context("Failed to create API client")?);
    run(api, label).await
}

async fn run<A: VideoSearchApi>(api: Arc<A>, label: &str) -> Result<CommandResult> {
    let session = SessionHandle::new();
    let controller = SearchController::new(api, session.clone());

    match controller.submit(label).await {
        SearchOutcome::Completed { .. } => {}
        SearchOutcome::Failed { error } => {
            return Err(error).context(format!("Search for '{}' failed", label.trim()));
        }
        SearchOutcome::Skipped => bail!("Please specify a label to search for"),
    }

    let matches: Vec<MatchEntry> = session.read(|s| {
        s.search_results()
            .map(|set| {
                set.results()
                    .iter()
                    .map(MatchEntry::from_result)
                    .collect::<Result<Vec<_>, DomainError>>()
            })
            .unwrap_or_else(|| Ok(Vec::new()))
    })?;

    Ok(CommandResult::Search(SearchCommandResult {
        query: label.trim().to_string(),
        matches,
    }))
}
