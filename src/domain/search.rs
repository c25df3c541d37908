//! 検索コントローラー
//!
//! 入力文字列と検索のライフサイクルを管理する。
//! ボタン操作とEnterキーはどちらも [`SearchController::search`] を通り、
//! 同じ検証と重複防止が適用される。

use crate::api::{InfraError, VideoSearchApi};
use crate::domain::session::SessionHandle;
use std::sync::Arc;
use tracing::{debug, info, warn};

pub const SEARCH_ERROR_TEXT: &str = "Search failed. Make sure the server is running.";

/// `search()` の結果
#[derive(Debug)]
pub enum SearchOutcome {
    /// 空白のみの入力、または検索中のため何もしなかった
    Skipped,
    Completed { matches: usize },
    Failed { error: InfraError },
}

pub struct SearchController<A> {
    api: Arc<A>,
    session: SessionHandle,
}

impl<A: VideoSearchApi> SearchController<A> {
    pub fn new(api: Arc<A>, session: SessionHandle) -> Self {
        Self { api, session }
    }

    /// 入力文字列を保持する（通信はしない）
    pub fn set_query(&self, text: impl Into<String>) {
        let text = text.into();
        self.session.update(|s| s.set_query(text));
    }

    /// Enterキーでの確定: 入力を反映してから検索する
    pub async fn submit(&self, text: impl Into<String>) -> SearchOutcome {
        self.set_query(text);
        self.search().await
    }

    /// 現在の入力で検索する
    pub async fn search(&self) -> SearchOutcome {
        let Some(query) = self.session.update(|s| s.begin_search()) else {
            debug!("search: nothing to do (blank query or search in flight)");
            return SearchOutcome::Skipped;
        };

        info!(query = %query, "search: started");

        match self.api.search(&query).await {
            Ok(response) => {
                let matches = response.results.len();
                self.session.update(|s| s.finish_search_success(response.results));
                info!(query = %query, matches, "search: complete");
                SearchOutcome::Completed { matches }
            }
            Err(e) => {
                warn!(err = %e, query = %query, "search: failed");
                self.session.update(|s| s.finish_search_failure(SEARCH_ERROR_TEXT));
                SearchOutcome::Failed { error: e }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::types::{SearchResponse, UploadResponse};
    use crate::api::ApiResult;
    use crate::domain::session::{SearchResult, SearchResultSet, SelectedFile, StatusKind, VideoId};
    use std::sync::Mutex;
    use std::time::Duration;

    /// 受け取ったクエリを記録し、順に応答を返すバックエンド
    #[derive(Default)]
    struct FakeIndex {
        replies: Mutex<Vec<ApiResult<SearchResponse>>>,
        queries: Mutex<Vec<String>>,
    }

    impl FakeIndex {
        fn with_replies(replies: Vec<ApiResult<SearchResponse>>) -> Arc<Self> {
            Arc::new(Self {
                replies: Mutex::new(replies.into_iter().rev().collect()),
                queries: Mutex::new(Vec::new()),
            })
        }

        fn queries(&self) -> Vec<String> {
            self.queries.lock().unwrap().clone()
        }
    }

    impl VideoSearchApi for FakeIndex {
        async fn upload_video(&self, _file: &SelectedFile) -> ApiResult<UploadResponse> {
            Err(InfraError::network("not used"))
        }

        async fn search(&self, label: &str) -> ApiResult<SearchResponse> {
            self.queries.lock().unwrap().push(label.to_string());
            tokio::time::sleep(Duration::from_millis(100)).await;
            self.replies
                .lock()
                .unwrap()
                .pop()
                .unwrap_or_else(|| Ok(SearchResponse::default()))
        }

        fn video_url(&self, video_id: &VideoId) -> String {
            format!("http://test/videos/{video_id}")
        }
    }

    fn dog_at(time: f64) -> SearchResult {
        SearchResult {
            object: "dog".into(),
            time,
        }
    }

    fn controller(api: Arc<FakeIndex>) -> (SearchController<FakeIndex>, SessionHandle) {
        let session = SessionHandle::new();
        (SearchController::new(api, session.clone()), session)
    }

    #[tokio::test(start_paused = true)]
    async fn test_whitespace_query_is_noop() {
        let api = FakeIndex::with_replies(vec![]);
        let (ctrl, session) = controller(Arc::clone(&api));

        ctrl.set_query("   \t ");
        assert!(matches!(ctrl.search().await, SearchOutcome::Skipped));
        assert!(api.queries().is_empty());
        assert_eq!(
            session.read(|s| s.search_results().cloned()),
            Some(SearchResultSet::NotSearched)
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_set_query_has_no_network_effect() {
        let api = FakeIndex::with_replies(vec![]);
        let (ctrl, session) = controller(Arc::clone(&api));

        ctrl.set_query("dog");
        assert!(api.queries().is_empty());
        assert_eq!(session.read(|s| s.query().to_string()), "dog");
    }

    #[tokio::test(start_paused = true)]
    async fn test_search_sends_trimmed_query() {
        let api = FakeIndex::with_replies(vec![Ok(SearchResponse {
            results: vec![dog_at(12.4)],
        })]);
        let (ctrl, session) = controller(Arc::clone(&api));

        let outcome = ctrl.submit("  dog  ").await;

        assert!(matches!(outcome, SearchOutcome::Completed { matches: 1 }));
        assert_eq!(api.queries(), vec!["dog".to_string()]);
        assert_eq!(
            session.read(|s| s.search_results().cloned()),
            Some(SearchResultSet::NonEmpty(vec![dog_at(12.4)]))
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_results_is_empty_not_unsearched() {
        let api = FakeIndex::with_replies(vec![Ok(SearchResponse { results: vec![] })]);
        let (ctrl, session) = controller(api);

        ctrl.submit("zebra").await;
        assert_eq!(
            session.read(|s| s.search_results().cloned()),
            Some(SearchResultSet::Empty)
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_pending_marker_while_in_flight() {
        let api = FakeIndex::with_replies(vec![]);
        let (ctrl, session) = controller(api);
        ctrl.set_query("cat");

        let monitor = async {
            tokio::time::sleep(Duration::from_millis(50)).await;
            session.read(|s| (s.is_searching(), s.search_results().is_none()))
        };
        let (_, (searching, pending)) = tokio::join!(ctrl.search(), monitor);
        assert!(searching);
        assert!(pending);
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_search_is_deduplicated() {
        let api = FakeIndex::with_replies(vec![]);
        let (ctrl, _session) = controller(Arc::clone(&api));
        ctrl.set_query("cat");

        let (first, second) = tokio::join!(ctrl.search(), ctrl.search());
        assert!(matches!(first, SearchOutcome::Completed { matches: 0 }));
        assert!(matches!(second, SearchOutcome::Skipped));
        assert_eq!(api.queries().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failure_reverts_results_and_sets_error() {
        let api = FakeIndex::with_replies(vec![
            Ok(SearchResponse {
                results: vec![dog_at(3.0)],
            }),
            Err(InfraError::api("/search", "down", Some(503))),
        ]);
        let (ctrl, session) = controller(api);

        ctrl.submit("dog").await;
        let outcome = ctrl.submit("cat").await;

        assert!(matches!(outcome, SearchOutcome::Failed { .. }));
        let snapshot = session.snapshot();
        assert_eq!(
            snapshot.search_results(),
            Some(&SearchResultSet::NonEmpty(vec![dog_at(3.0)]))
        );
        assert_eq!(snapshot.status().unwrap().kind, StatusKind::Error);
        assert!(!snapshot.is_searching());
    }
}
