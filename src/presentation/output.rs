/// プレゼンテーション層: コマンド結果の出力
///
/// コマンド実行結果をユーザー向け（人間可読）または
/// 機械向け（JSON）形式で出力する責務を担います。
/// CLI使用方法と対話セッションの画面表示もこのモジュールが担当します。
use crate::commands::result::{CommandResult, MatchEntry};
use crate::domain::labels::resolve_icon;
use crate::domain::playback::SeekAction;
use crate::domain::session::{LabelSummary, SearchResultSet, Session, StatusKind, UploadState};
use anyhow::Result;

/// ヘルプテキスト（単一の情報源）
const HELP_TEXT: &str = "vidsearch
Upload a video for object detection, then search it by label and jump to the moment

Usage:
  vidsearch [--machine] <command> [args...]

Global Flags:
  --machine        - Output machine-readable JSON to stdout (for scripting)
                     Works for both success and error cases

Available commands:
  upload <file> [--progress]
                   - Upload a video and run object detection on it
                     --progress: Show estimated progress while the server analyzes
  search <label>   - Search analyzed videos for a label (e.g. 'cat')
  session          - Start an interactive session (type 'help' inside for commands)
  help             - Display this help message

Error Output:
  Normal mode:   Human-readable error messages to stderr
  --machine:     JSON error object with exit_code and hint fields

Progress Output:
  upload --progress              - Show a progress bar on stderr
  --machine upload --progress    - Output machine-readable JSON progress to stdout";

/// 対話セッション内のヘルプ
const SESSION_HELP_TEXT: &str = "Session commands:
  open <file>      - Select a video file
  clear            - Clear the selected file
  upload           - Upload the selected file for analysis
  query <text>     - Edit the search text without searching
  search [text]    - Search (with text: set it and search, like pressing Enter)
  results          - Show the last search results
  seek <n>         - Jump to result number n and play (once the video is ready)
  play <filename>  - Load a previously uploaded video
  status           - Show the current state
  help             - Show this help
  quit             - Leave the session";

/// コマンド使用方法を表示する
///
/// CLI引数が不正な場合や、ヘルプが必要な場合に呼び出されます。
pub fn print_usage() {
    eprintln!("{}", HELP_TEXT);
}

pub fn print_session_help() {
    eprintln!("{}", SESSION_HELP_TEXT);
}

/// コマンド結果を適切な形式で出力する
///
/// # Output
/// * `machine_output = false`: 人間向けの詳細メッセージ（stderr）
/// * `machine_output = true`: 機械可読JSON（stdout）
pub fn output_result(result: &CommandResult, machine_output: bool) -> Result<()> {
    if machine_output {
        output_machine_readable(result)?;
    } else {
        output_human_readable(result)?;
    }

    Ok(())
}

/// 人間向けの詳細メッセージを出力（stderr）
///
/// すべての出力はstderrに送られ、stdoutはパイプライン用に予約されます。
fn output_human_readable(result: &CommandResult) -> Result<()> {
    match result {
        CommandResult::Upload(r) => {
            eprintln!("\n{}", result.success_message());
            eprintln!("---");
            eprintln!("File: {} ({})", r.file_path, format_size(r.file_size));
            eprintln!("Video: {}", r.video_id);
            eprintln!("\nStream URL:");
            eprintln!("{}", r.stream_url);
            eprintln!("---");
            print_label_summary(&r.labels);
        }
        CommandResult::Search(r) => {
            eprintln!("{}", result.success_message());
            for (index, entry) in r.matches.iter().enumerate() {
                eprintln!("{}", format_match_line(index + 1, entry, None));
            }
        }
        CommandResult::Session(_) => {
            eprintln!("{}", result.success_message());
        }
        CommandResult::Help => {
            eprintln!("{}", HELP_TEXT);
        }
    }

    Ok(())
}

/// 機械可読JSONを出力（stdout）
fn output_machine_readable(result: &CommandResult) -> Result<()> {
    let mut json = serde_json::to_value(result)?;
    if let Some(object) = json.as_object_mut() {
        object.insert("success".to_string(), serde_json::Value::Bool(true));
    }

    println!("{}", serde_json::to_string(&json)?);
    Ok(())
}

/// エラーを出力する
///
/// 機械向けはstdoutにJSONオブジェクトを1つ、人間向けはstderrにエラーチェーンとヒントを表示します。
pub fn output_error(
    error: &anyhow::Error,
    exit_code: i32,
    hint: Option<&str>,
    machine_output: bool,
) {
    if machine_output {
        let causes: Vec<String> = error.chain().skip(1).map(|c| c.to_string()).collect();
        let json = serde_json::json!({
            "success": false,
            "error": error.to_string(),
            "causes": causes,
            "exit_code": exit_code,
            "hint": hint
        });
        println!("{}", json);
        return;
    }

    eprintln!("Error: {}", error);

    // エラーチェーンを辿って詳細を表示
    let chain: Vec<_> = error.chain().skip(1).collect();
    if !chain.is_empty() {
        eprintln!("\nCaused by:");
        for (i, cause) in chain.iter().enumerate() {
            eprintln!("  {}: {}", i + 1, cause);
        }
    }

    if let Some(hint) = hint {
        eprintln!("\nHint: {}", hint);
    }
}

/// 対話セッションのプロンプト
pub fn print_prompt() {
    use std::io::Write;
    eprint!("vidsearch> ");
    let _ = std::io::stderr().flush();
}

/// 現在の状態を表示する
pub fn print_status(session: &Session) {
    match session.selected_file() {
        Some(file) => eprintln!(
            "File:     {} ({}, {})",
            file.name(),
            file.mime_type(),
            format_size(file.size_bytes())
        ),
        None => eprintln!("File:     (none selected)"),
    }

    let upload = match session.upload_state() {
        UploadState::Idle => "idle",
        UploadState::Uploading => "uploading...",
        UploadState::Succeeded => "done",
        UploadState::Failed => "failed",
    };
    eprintln!("Upload:   {}", upload);

    match session.video_id() {
        Some(video_id) => eprintln!(
            "Video:    {} ({})",
            video_id,
            if session.is_playback_ready() {
                "ready"
            } else {
                "loading"
            }
        ),
        None => eprintln!("Video:    (none)"),
    }

    eprintln!(
        "Query:    {}{}",
        session.query(),
        if session.is_searching() { "  (searching...)" } else { "" }
    );

    if let Some(status) = session.status() {
        print_status_message(status.kind.clone(), &status.text);
    }
}

/// ステータスメッセージを1行表示する
pub fn print_status_message(kind: StatusKind, text: &str) {
    let marker = match kind {
        StatusKind::Loading => "…",
        StatusKind::Success => "✓",
        StatusKind::Error => "✗",
    };
    eprintln!("{} {}", marker, text);
}

/// 検索結果を表示する
///
/// 各行にはシーク操作の可否を添える。
pub fn print_search_results(set: Option<&SearchResultSet>, rows: &[(MatchEntry, SeekAction)]) {
    match set {
        None => eprintln!("Searching..."),
        Some(SearchResultSet::NotSearched) => {}
        Some(SearchResultSet::Empty) => eprintln!("No results found."),
        Some(SearchResultSet::NonEmpty(_)) => {
            for (index, (entry, action)) in rows.iter().enumerate() {
                eprintln!("{}", format_match_line(index + 1, entry, Some(*action)));
            }
        }
    }
}

/// 解析結果のラベル集計を表示する
pub fn print_label_summary(labels: &[LabelSummary]) {
    if labels.is_empty() {
        return;
    }

    eprintln!("\nDetected objects:");
    for label in labels {
        eprintln!(
            "  {} {:<16} x{:<4} first at {}",
            resolve_icon(Some(&label.object)),
            label.object,
            label.count,
            label.first_seen_clock
        );
    }
}

fn format_match_line(number: usize, entry: &MatchEntry, action: Option<SeekAction>) -> String {
    let action = match action {
        Some(SeekAction::Enabled { .. }) => "  [seek]",
        Some(SeekAction::Disabled) => "  [loading]",
        None => "",
    };
    format!(
        "{:>3}. {} {:<16} {}{}",
        number, entry.icon, entry.object, entry.clock, action
    )
}

fn format_size(bytes: u64) -> String {
    format!("{:.2} MB", bytes as f64 / 1_048_576.0)
}
