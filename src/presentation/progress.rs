/// プレゼンテーション層: アップロード進捗の表示
///
/// ドメイン層の疑似進捗（`watch::Receiver<f64>`）を購読し、
/// 人間向けにはstderrのプログレスバー、機械向けにはstdoutのJSON行として出力します。
/// 表示はアップロード1回ごとに開始し、完了時に [`ProgressRenderer::finish`] で止めます。
use std::io::Write;
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// プログレスバーの幅（文字数）
const BAR_WIDTH: usize = 30;

/// 進捗の出力形式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressFormat {
    /// stderrに `\r` で上書きするバー
    Human,
    /// stdoutに1行1JSON
    Machine,
}

/// 進捗表示タスク
pub struct ProgressRenderer {
    handle: JoinHandle<()>,
    format: ProgressFormat,
    latest: watch::Receiver<f64>,
}

impl ProgressRenderer {
    /// 購読を開始する（現在値も1回表示する）
    pub fn spawn(mut progress: watch::Receiver<f64>, format: ProgressFormat) -> Self {
        let latest = progress.clone();
        let handle = tokio::spawn(async move {
            loop {
                let percent = *progress.borrow_and_update();
                emit(percent, format);
                if progress.changed().await.is_err() {
                    break;
                }
            }
        });
        Self {
            handle,
            format,
            latest,
        }
    }

    /// 最終値を表示して停止する
    pub fn finish(self) {
        self.handle.abort();
        emit(*self.latest.borrow(), self.format);
        if self.format == ProgressFormat::Human {
            eprintln!();
        }
    }
}

fn emit(percent: f64, format: ProgressFormat) {
    match format {
        ProgressFormat::Human => {
            eprint!("\r{}", render_bar(percent, BAR_WIDTH));
            let _ = std::io::stderr().flush();
        }
        ProgressFormat::Machine => {
            println!("{}", progress_json(percent));
        }
    }
}

/// `[#####-----]  50%` 形式のバー
pub fn render_bar(percent: f64, width: usize) -> String {
    let clamped = if percent.is_finite() {
        percent.clamp(0.0, 100.0)
    } else {
        0.0
    };
    let filled = ((clamped / 100.0) * width as f64).floor() as usize;
    format!(
        "[{}{}] {:>3}%",
        "#".repeat(filled),
        "-".repeat(width - filled),
        clamped.round() as u32
    )
}

/// 機械向けの進捗1行
pub fn progress_json(percent: f64) -> serde_json::Value {
    serde_json::json!({
        "phase": "uploading",
        "progress": percent.round() as u32
    })
}
