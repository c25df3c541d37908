use crate::commands::{self, CommandResult};
use crate::presentation::output;
use crate::presentation::progress::ProgressFormat;
use anyhow::{Context, Result, bail};

/// 解析済みのCLI引数
#[derive(Debug, Clone, PartialEq)]
pub struct Invocation {
    /// `--machine`: 結果とエラーをJSONでstdoutに出力
    pub machine_output: bool,
    pub command: Command,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Upload { file_path: String, progress: bool },
    Search { label: String },
    Session,
    Help,
}

/// CLI引数を解析する
///
/// `--machine` はコマンドの前後どちらにも置ける。
/// 引数が無い場合は `None`（使用方法を表示する）。
pub fn parse_args(args: &[String]) -> Result<Option<Invocation>> {
    let machine_output = args.iter().skip(1).any(|a| a == "--machine");
    let rest: Vec<&str> = args
        .iter()
        .skip(1)
        .map(String::as_str)
        .filter(|a| *a != "--machine")
        .collect();

    let Some((command, params)) = rest.split_first() else {
        return Ok(None);
    };

    let command = match *command {
        "upload" => {
            let progress = params.contains(&"--progress");
            let file_path = params
                .iter()
                .find(|p| **p != "--progress")
                .context("Please specify a file path for upload command")?;
            Command::Upload {
                file_path: file_path.to_string(),
                progress,
            }
        }
        "search" => {
            if params.is_empty() {
                bail!("Please specify a label for search command");
            }
            Command::Search {
                label: params.join(" "),
            }
        }
        "session" => Command::Session,
        "help" | "--help" | "-h" => Command::Help,
        other => bail!(
            "Unknown command: '{}'. Use 'help' to see available commands.",
            other
        ),
    };

    Ok(Some(Invocation {
        machine_output,
        command,
    }))
}

/// コマンドを実行する
pub async fn dispatch(invocation: &Invocation) -> Result<CommandResult> {
    match &invocation.command {
        Command::Upload {
            file_path,
            progress,
        } => {
            let format = progress.then_some(if invocation.machine_output {
                ProgressFormat::Machine
            } else {
                ProgressFormat::Human
            });
            commands::upload::execute(file_path, format)
                .await
                .context("Upload command failed")
        }
        Command::Search { label } => commands::search::execute(label)
            .await
            .context("Search command failed"),
        Command::Session => commands::session::execute()
            .await
            .context("Session command failed"),
        Command::Help => commands::help::execute().await,
    }
}

/// 引数を解析して実行し、結果を出力する
///
/// 戻り値の `bool` は機械向け出力かどうか（エラー出力の形式に使う）。
pub async fn run(args: &[String]) -> (bool, Result<()>) {
    let machine_output = args.iter().any(|a| a == "--machine");

    let invocation = match parse_args(args) {
        Ok(Some(invocation)) => invocation,
        Ok(None) => {
            output::print_usage();
            return (machine_output, Ok(()));
        }
        Err(e) => return (machine_output, Err(e)),
    };

    let result = match dispatch(&invocation).await {
        Ok(result) => output::output_result(&result, invocation.machine_output),
        Err(e) => Err(e),
    };
    (invocation.machine_output, result)
}
