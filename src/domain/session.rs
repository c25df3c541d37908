//! セッション状態
//!
//! 画面1つ分の状態（選択ファイル、アップロード、検索、再生準備、ステータス）を
//! 1つの集約にまとめ、型付きの遷移メソッドでのみ更新する。
//! 不変条件:
//! - アップロードと検索はそれぞれ同時に1件まで
//! - 動画IDが変わると再生準備フラグは必ず false に戻る
//! - ステータスメッセージは常に最新の1件のみ

use crate::domain::formatter::format_clock;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

/// ユーザーが選択した動画ファイル
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedFile {
    path: PathBuf,
    name: String,
    mime_type: String,
    size_bytes: u64,
}

impl SelectedFile {
    pub fn new(
        path: impl Into<PathBuf>,
        name: impl Into<String>,
        mime_type: impl Into<String>,
        size_bytes: u64,
    ) -> Self {
        Self {
            path: path.into(),
            name: name.into(),
            mime_type: mime_type.into(),
            size_bytes,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    pub fn size_bytes(&self) -> u64 {
        self.size_bytes
    }
}

/// アップロードのライフサイクル
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UploadState {
    #[default]
    Idle,
    Uploading,
    Succeeded,
    Failed,
}

/// サーバー上の動画ファイル名（ストリームURLの構築に使う）
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VideoId(String);

impl VideoId {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for VideoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// 解析サーバーが返す結果（内容はサーバー依存）
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct AnalysisResult(serde_json::Value);

/// ラベルごとの検出数
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LabelSummary {
    pub object: String,
    pub count: usize,
    pub first_seen: f64,
    /// `first_seen` の MM:SS 表記
    pub first_seen_clock: String,
}

impl AnalysisResult {
    pub fn new(value: serde_json::Value) -> Self {
        Self(value)
    }

    pub fn raw(&self) -> &serde_json::Value {
        &self.0
    }

    /// 検出リスト（`[{object, time}]`）をラベル単位に集計する
    ///
    /// 出現順を保ち、形式が異なる要素や再生位置として不正な時刻は無視します。
    pub fn summary(&self) -> Vec<LabelSummary> {
        let mut summaries: Vec<LabelSummary> = Vec::new();
        let Some(items) = self.0.as_array() else {
            return summaries;
        };

        for item in items {
            let (Some(object), Some(time)) = (
                item.get("object").and_then(|v| v.as_str()),
                item.get("time").and_then(|v| v.as_f64()),
            ) else {
                continue;
            };
            let Ok(clock) = format_clock(time) else {
                continue;
            };

            match summaries.iter_mut().find(|s| s.object == object) {
                Some(summary) => {
                    summary.count += 1;
                    if time < summary.first_seen {
                        summary.first_seen = time;
                        summary.first_seen_clock = clock;
                    }
                }
                None => summaries.push(LabelSummary {
                    object: object.to_string(),
                    count: 1,
                    first_seen: time,
                    first_seen_clock: clock,
                }),
            }
        }

        summaries
    }
}

/// 検索の1件（ラベルと秒数）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub object: String,
    pub time: f64,
}

/// 検索結果の3状態
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(tag = "state", content = "results", rename_all = "snake_case")]
pub enum SearchResultSet {
    /// まだ検索していない
    #[default]
    NotSearched,
    /// 検索したが0件
    Empty,
    /// 1件以上（サーバーの返した順）
    NonEmpty(Vec<SearchResult>),
}

impl SearchResultSet {
    pub fn from_results(results: Vec<SearchResult>) -> Self {
        if results.is_empty() {
            Self::Empty
        } else {
            Self::NonEmpty(results)
        }
    }

    pub fn results(&self) -> &[SearchResult] {
        match self {
            Self::NonEmpty(results) => results,
            Self::NotSearched | Self::Empty => &[],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusKind {
    Loading,
    Success,
    Error,
}

/// 画面に1件だけ表示されるステータス
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusMessage {
    pub kind: StatusKind,
    pub text: String,
}

impl StatusMessage {
    pub fn new(kind: StatusKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            text: text.into(),
        }
    }
}

/// 検索のライフサイクル
///
/// 送信中は直前の結果を退避し、失敗時に復元する。
#[derive(Debug, Clone, PartialEq)]
enum SearchPhase {
    Settled(SearchResultSet),
    InFlight { previous: SearchResultSet },
}

impl Default for SearchPhase {
    fn default() -> Self {
        Self::Settled(SearchResultSet::NotSearched)
    }
}

/// セッション状態の集約
#[derive(Debug, Clone, Default)]
pub struct Session {
    selected_file: Option<SelectedFile>,
    upload_state: UploadState,
    analysis: Option<AnalysisResult>,
    video_id: Option<VideoId>,
    playback_ready: bool,
    query: String,
    search: SearchPhase,
    status: Option<StatusMessage>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    // ------------------------------------------------------------------
    // 参照
    // ------------------------------------------------------------------

    pub fn selected_file(&self) -> Option<&SelectedFile> {
        self.selected_file.as_ref()
    }

    pub fn upload_state(&self) -> UploadState {
        self.upload_state
    }

    pub fn is_uploading(&self) -> bool {
        self.upload_state == UploadState::Uploading
    }

    pub fn analysis(&self) -> Option<&AnalysisResult> {
        self.analysis.as_ref()
    }

    pub fn video_id(&self) -> Option<&VideoId> {
        self.video_id.as_ref()
    }

    pub fn is_playback_ready(&self) -> bool {
        self.playback_ready && self.video_id.is_some()
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn is_searching(&self) -> bool {
        matches!(self.search, SearchPhase::InFlight { .. })
    }

    /// 確定した検索結果。送信中は `None`
    pub fn search_results(&self) -> Option<&SearchResultSet> {
        match &self.search {
            SearchPhase::Settled(set) => Some(set),
            SearchPhase::InFlight { .. } => None,
        }
    }

    pub fn status(&self) -> Option<&StatusMessage> {
        self.status.as_ref()
    }

    /// アップロード操作が有効か（ファイル選択済みかつ送信中でない）
    pub fn can_upload(&self) -> bool {
        self.selected_file.is_some() && !self.is_uploading()
    }

    /// 検索操作が有効か（空白以外の入力があり送信中でない）
    pub fn can_search(&self) -> bool {
        !self.query.trim().is_empty() && !self.is_searching()
    }

    // ------------------------------------------------------------------
    // ファイル選択
    // ------------------------------------------------------------------

    /// 検証済みのファイルを選択する
    ///
    /// 解析結果とステータスを消去し、アップロード状態を Idle に戻す。
    /// アップロード中は差し替えできない。
    pub fn select_file(&mut self, file: SelectedFile) -> bool {
        if self.is_uploading() {
            return false;
        }
        self.selected_file = Some(file);
        self.analysis = None;
        self.status = None;
        self.upload_state = UploadState::Idle;
        true
    }

    pub fn clear_file(&mut self) {
        self.selected_file = None;
    }

    // ------------------------------------------------------------------
    // アップロード
    // ------------------------------------------------------------------

    /// アップロードを開始する。開始できない場合は `None`
    pub fn begin_upload(&mut self, loading_text: &str) -> Option<SelectedFile> {
        if !self.can_upload() {
            return None;
        }
        let file = self.selected_file.clone()?;
        self.upload_state = UploadState::Uploading;
        self.analysis = None;
        self.status = Some(StatusMessage::new(StatusKind::Loading, loading_text));
        Some(file)
    }

    pub fn finish_upload_success(
        &mut self,
        analysis: AnalysisResult,
        video_id: VideoId,
        success_text: &str,
    ) {
        self.analysis = Some(analysis);
        self.set_video(video_id);
        self.status = Some(StatusMessage::new(StatusKind::Success, success_text));
        self.upload_state = UploadState::Succeeded;
    }

    pub fn finish_upload_failure(&mut self, error_text: &str) {
        self.status = Some(StatusMessage::new(StatusKind::Error, error_text));
        self.upload_state = UploadState::Failed;
    }

    // ------------------------------------------------------------------
    // 検索
    // ------------------------------------------------------------------

    pub fn set_query(&mut self, text: impl Into<String>) {
        self.query = text.into();
    }

    /// 検索を開始し、送信する整形済みクエリを返す。開始できない場合は `None`
    pub fn begin_search(&mut self) -> Option<String> {
        if !self.can_search() {
            return None;
        }
        let query = self.query.trim().to_string();
        let previous = match std::mem::take(&mut self.search) {
            SearchPhase::Settled(set) => set,
            SearchPhase::InFlight { previous } => previous,
        };
        self.search = SearchPhase::InFlight { previous };
        Some(query)
    }

    pub fn finish_search_success(&mut self, results: Vec<SearchResult>) {
        self.search = SearchPhase::Settled(SearchResultSet::from_results(results));
    }

    pub fn finish_search_failure(&mut self, error_text: &str) {
        let restored = match std::mem::take(&mut self.search) {
            SearchPhase::InFlight { previous } => previous,
            SearchPhase::Settled(current) => current,
        };
        self.search = SearchPhase::Settled(restored);
        self.status = Some(StatusMessage::new(StatusKind::Error, error_text));
    }

    // ------------------------------------------------------------------
    // 再生
    // ------------------------------------------------------------------

    /// 再生対象の動画を切り替える。再生準備は必ずリセットされる
    pub fn set_video(&mut self, video_id: VideoId) {
        self.playback_ready = false;
        self.video_id = Some(video_id);
    }

    /// 現在の動画のメタデータ読み込み完了を記録する
    ///
    /// 古い動画のイベントは無視し `false` を返す。
    pub fn mark_playback_ready(&mut self, video_id: &VideoId) -> bool {
        if self.video_id.as_ref() != Some(video_id) {
            return false;
        }
        self.playback_ready = true;
        true
    }

    /// 現在の動画の読み込み失敗を記録する
    pub fn mark_playback_failed(&mut self, video_id: &VideoId, error_text: &str) -> bool {
        if self.video_id.as_ref() != Some(video_id) {
            return false;
        }
        self.playback_ready = false;
        self.status = Some(StatusMessage::new(StatusKind::Error, error_text));
        true
    }
}

/// 非同期タスク間で共有するセッション
///
/// ロックは同期区間でのみ取得し、`.await` をまたいで保持しない。
#[derive(Debug, Clone, Default)]
pub struct SessionHandle(Arc<Mutex<Session>>);

impl SessionHandle {
    pub fn new() -> Self {
        Self(Arc::new(Mutex::new(Session::new())))
    }

    fn lock(&self) -> MutexGuard<'_, Session> {
        // 状態遷移はパニックしないため、毒化しても中身はそのまま使える
        self.0.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// 状態を更新する
    pub fn update<R>(&self, f: impl FnOnce(&mut Session) -> R) -> R {
        f(&mut self.lock())
    }

    /// 状態を参照する
    pub fn read<R>(&self, f: impl FnOnce(&Session) -> R) -> R {
        f(&self.lock())
    }

    /// 現在の状態の複製
    pub fn snapshot(&self) -> Session {
        self.lock().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn video_file(name: &str) -> SelectedFile {
        SelectedFile::new(format!("/tmp/{name}"), name, "video/mp4", 1024)
    }

    #[test]
    fn test_initial_state() {
        let session = Session::new();
        assert_eq!(session.upload_state(), UploadState::Idle);
        assert_eq!(session.search_results(), Some(&SearchResultSet::NotSearched));
        assert!(!session.is_playback_ready());
        assert!(session.status().is_none());
        assert!(!session.can_upload());
    }

    #[test]
    fn test_select_file_resets_related_state() {
        let mut session = Session::new();
        session.select_file(video_file("a.mp4"));
        session.begin_upload("loading").unwrap();
        session.finish_upload_failure("boom");
        assert_eq!(session.upload_state(), UploadState::Failed);

        assert!(session.select_file(video_file("b.mp4")));
        assert_eq!(session.selected_file().unwrap().name(), "b.mp4");
        assert_eq!(session.upload_state(), UploadState::Idle);
        assert!(session.status().is_none());
        assert!(session.analysis().is_none());
    }

    #[test]
    fn test_select_file_refused_while_uploading() {
        let mut session = Session::new();
        session.select_file(video_file("a.mp4"));
        session.begin_upload("loading").unwrap();

        assert!(!session.select_file(video_file("b.mp4")));
        assert_eq!(session.selected_file().unwrap().name(), "a.mp4");
        assert!(session.is_uploading());
    }

    #[test]
    fn test_clear_file_has_no_side_effects() {
        let mut session = Session::new();
        session.select_file(video_file("a.mp4"));
        session.begin_upload("loading").unwrap();
        session.finish_upload_success(AnalysisResult::new(json!([])), VideoId::new("a.mp4"), "ok");

        session.clear_file();
        assert!(session.selected_file().is_none());
        assert_eq!(session.upload_state(), UploadState::Succeeded);
        assert!(session.analysis().is_some());
        assert_eq!(session.status().unwrap().kind, StatusKind::Success);
    }

    #[test]
    fn test_begin_upload_requires_file_and_no_inflight() {
        let mut session = Session::new();
        assert!(session.begin_upload("loading").is_none());

        session.select_file(video_file("a.mp4"));
        assert!(session.begin_upload("loading").is_some());
        assert_eq!(session.status().unwrap().kind, StatusKind::Loading);
        assert!(session.begin_upload("loading").is_none());
    }

    #[test]
    fn test_upload_success_resets_playback_readiness() {
        let mut session = Session::new();
        session.set_video(VideoId::new("old.mp4"));
        assert!(session.mark_playback_ready(&VideoId::new("old.mp4")));
        assert!(session.is_playback_ready());

        session.select_file(video_file("cat.mp4"));
        session.begin_upload("loading").unwrap();
        session.finish_upload_success(
            AnalysisResult::new(json!([])),
            VideoId::new("cat.mp4"),
            "done",
        );

        assert_eq!(session.video_id(), Some(&VideoId::new("cat.mp4")));
        assert!(!session.is_playback_ready());
    }

    #[test]
    fn test_stale_readiness_event_is_ignored() {
        let mut session = Session::new();
        session.set_video(VideoId::new("a.mp4"));
        session.set_video(VideoId::new("b.mp4"));

        assert!(!session.mark_playback_ready(&VideoId::new("a.mp4")));
        assert!(!session.is_playback_ready());
        assert!(session.mark_playback_ready(&VideoId::new("b.mp4")));
        assert!(session.is_playback_ready());
    }

    #[test]
    fn test_playback_failure_sets_error_status() {
        let mut session = Session::new();
        let id = VideoId::new("a.mp4");
        session.set_video(id.clone());
        session.mark_playback_ready(&id);

        assert!(session.mark_playback_failed(&id, "cannot load"));
        assert!(!session.is_playback_ready());
        assert_eq!(session.status().unwrap().kind, StatusKind::Error);
    }

    #[test]
    fn test_begin_search_trims_and_rejects_blank() {
        let mut session = Session::new();
        session.set_query("   ");
        assert!(session.begin_search().is_none());
        assert_eq!(session.search_results(), Some(&SearchResultSet::NotSearched));

        session.set_query("  dog ");
        assert_eq!(session.begin_search().as_deref(), Some("dog"));
        assert!(session.is_searching());
        assert!(session.search_results().is_none());
        assert!(session.begin_search().is_none());
    }

    #[test]
    fn test_empty_results_are_distinct_from_not_searched() {
        let mut session = Session::new();
        session.set_query("zebra");
        session.begin_search().unwrap();
        session.finish_search_success(vec![]);

        assert_eq!(session.search_results(), Some(&SearchResultSet::Empty));
        assert_ne!(SearchResultSet::Empty, SearchResultSet::NotSearched);
    }

    #[test]
    fn test_search_failure_restores_previous_results() {
        let mut session = Session::new();
        session.set_query("dog");
        session.begin_search().unwrap();
        let found = vec![SearchResult {
            object: "dog".into(),
            time: 12.4,
        }];
        session.finish_search_success(found.clone());

        session.set_query("cat");
        session.begin_search().unwrap();
        session.finish_search_failure("search failed");

        assert_eq!(
            session.search_results(),
            Some(&SearchResultSet::NonEmpty(found))
        );
        assert_eq!(session.status().unwrap().kind, StatusKind::Error);
    }

    #[test]
    fn test_first_search_failure_reverts_to_not_searched() {
        let mut session = Session::new();
        session.set_query("dog");
        session.begin_search().unwrap();
        session.finish_search_failure("search failed");
        assert_eq!(session.search_results(), Some(&SearchResultSet::NotSearched));
    }

    #[test]
    fn test_analysis_summary_groups_by_label() {
        let analysis = AnalysisResult::new(json!([
            { "object": "dog", "time": 4.0 },
            { "object": "person", "time": 0.0 },
            { "object": "dog", "time": 2.0 },
            { "unexpected": true },
        ]));

        let summary = analysis.summary();
        assert_eq!(summary.len(), 2);
        assert_eq!(summary[0].object, "dog");
        assert_eq!(summary[0].count, 2);
        assert_eq!(summary[0].first_seen, 2.0);
        assert_eq!(summary[0].first_seen_clock, "00:02");
        assert_eq!(summary[1].object, "person");
    }

    #[test]
    fn test_analysis_summary_skips_invalid_times() {
        let analysis = AnalysisResult::new(json!([
            { "object": "cat", "time": -1.0 },
            { "object": "cat", "time": 75.5 },
            { "object": "bird", "time": -3.0 },
        ]));

        let summary = analysis.summary();
        assert_eq!(summary.len(), 1);
        assert_eq!(summary[0].object, "cat");
        assert_eq!(summary[0].count, 1);
        assert_eq!(summary[0].first_seen_clock, "01:15");
    }

    #[test]
    fn test_analysis_summary_of_opaque_payload_is_empty() {
        let analysis = AnalysisResult::new(json!({ "frames": 120 }));
        assert!(analysis.summary().is_empty());
    }

    #[test]
    fn test_handle_shares_state() {
        let handle = SessionHandle::new();
        let other = handle.clone();
        other.update(|s| s.set_query("car"));
        assert_eq!(handle.read(|s| s.query().to_string()), "car");
    }
}
