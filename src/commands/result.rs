/// コマンド実行結果を表す型
///
/// 各コマンドはこの型を返し、プレゼンテーション層で
/// 人間向けと機械向けの出力フォーマットを決定する。
use crate::domain::error::DomainError;
use crate::domain::formatter::format_clock;
use crate::domain::labels::resolve_icon;
use crate::domain::session::{LabelSummary, SearchResult};
use serde::Serialize;

/// コマンド実行結果の統一型
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum CommandResult {
    Upload(UploadResult),
    Search(SearchCommandResult),
    Session(SessionResult),
    Help,
}

/// アップロードコマンドの結果
#[derive(Debug, Clone, Serialize)]
pub struct UploadResult {
    /// ファイルパス
    pub file_path: String,
    /// ファイルサイズ（bytes）
    pub file_size: u64,
    /// 拡張子から判定したMIMEタイプ
    pub mime_type: String,
    /// サーバーが保存したファイル名（再生・検索の識別子）
    pub video_id: String,
    /// ストリームURL
    pub stream_url: String,
    /// ラベルごとの検出数
    pub labels: Vec<LabelSummary>,
    /// 解析結果（サーバーの応答そのまま）
    pub analysis: serde_json::Value,
}

/// 検索結果の1件（表示用）
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchEntry {
    pub icon: &'static str,
    pub object: String,
    pub time: f64,
    /// MM:SS
    pub clock: String,
}

impl MatchEntry {
    /// 検索結果から表示用の行を作る
    ///
    /// # エラー
    /// 時刻が再生位置として不正な場合は `DomainError::InvalidTimestamp` を返します。
    pub fn from_result(result: &SearchResult) -> Result<Self, DomainError> {
        Ok(Self {
            icon: resolve_icon(Some(&result.object)),
            object: result.object.clone(),
            time: result.time,
            clock: format_clock(result.time)?,
        })
    }
}

/// 検索コマンドの結果
#[derive(Debug, Clone, Serialize)]
pub struct SearchCommandResult {
    pub query: String,
    pub matches: Vec<MatchEntry>,
}

/// 対話セッションの結果
#[derive(Debug, Clone, Default, Serialize)]
pub struct SessionResult {
    /// 成功したアップロード数
    pub uploads: usize,
    /// 完了した検索数
    pub searches: usize,
}

impl CommandResult {
    /// 成功メッセージを取得（人間向け出力用）
    pub fn success_message(&self) -> String {
        match self {
            CommandResult::Upload(_) => "Analysis complete!".to_string(),
            CommandResult::Search(r) => match r.matches.len() {
                0 => format!("No results found for '{}'.", r.query),
                1 => format!("1 result for '{}'.", r.query),
                n => format!("{} results for '{}'.", n, r.query),
            },
            CommandResult::Session(r) => format!(
                "Session ended ({} upload(s), {} search(es)).",
                r.uploads, r.searches
            ),
            CommandResult::Help => "".to_string(),
        }
    }
}
