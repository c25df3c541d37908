/// プレゼンテーション層: 対話セッションの入力解析
///
/// stdinから読んだ1行を [`SessionCommand`] に変換します。
/// 検索語やパスは空白を含み得るため、コマンド名以降をそのまま引数として扱います。
use anyhow::{Context, Result, bail};

/// 対話セッションのコマンド
#[derive(Debug, Clone, PartialEq)]
pub enum SessionCommand {
    /// ファイルを選択する
    Open(String),
    /// 選択を解除する
    Clear,
    /// 選択中のファイルをアップロードする
    Upload,
    /// 入力欄の文字列を更新する（検索はしない）
    Query(String),
    /// 検索する。引数ありはEnterでの確定、なしは現在の入力での検索
    Search(Option<String>),
    /// アップロード済みの動画を再生対象にする
    Play(String),
    /// 検索結果の n 件目（1始まり）へ移動する
    Seek(usize),
    Results,
    Status,
    Help,
    Quit,
}

/// 1行を解析する。空行は `None`
pub fn parse_line(line: &str) -> Result<Option<SessionCommand>> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }

    let (name, rest) = match line.split_once(char::is_whitespace) {
        Some((name, rest)) => (name, rest.trim()),
        None => (line, ""),
    };

    let command = match name.to_lowercase().as_str() {
        "open" => SessionCommand::Open(required(rest, "open <file>")?),
        "clear" => SessionCommand::Clear,
        "upload" => SessionCommand::Upload,
        "query" => SessionCommand::Query(rest.to_string()),
        "search" | "s" => {
            if rest.is_empty() {
                SessionCommand::Search(None)
            } else {
                SessionCommand::Search(Some(rest.to_string()))
            }
        }
        "play" => SessionCommand::Play(required(rest, "play <filename>")?),
        "seek" => {
            let index = required(rest, "seek <n>")?;
            let index: usize = index
                .parse()
                .with_context(|| format!("Invalid result number: '{}'", index))?;
            if index == 0 {
                bail!("Result numbers start at 1.");
            }
            SessionCommand::Seek(index)
        }
        "results" => SessionCommand::Results,
        "status" => SessionCommand::Status,
        "help" | "?" => SessionCommand::Help,
        "quit" | "exit" | "q" => SessionCommand::Quit,
        other => bail!(
            "Unknown command: '{}'. Type 'help' to see available commands.",
            other
        ),
    };

    Ok(Some(command))
}

fn required(rest: &str, usage: &str) -> Result<String> {
    if rest.is_empty() {
        bail!("Missing argument. Usage: {}", usage);
    }
    Ok(rest.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_line_is_ignored() {
        assert_eq!(parse_line("   ").unwrap(), None);
    }

    #[test]
    fn test_open_keeps_spaces_in_path() {
        assert_eq!(
            parse_line("open  /videos/my cat.mp4 ").unwrap(),
            Some(SessionCommand::Open("/videos/my cat.mp4".to_string()))
        );
    }

    #[test]
    fn test_search_with_and_without_text() {
        assert_eq!(
            parse_line("search cat").unwrap(),
            Some(SessionCommand::Search(Some("cat".to_string())))
        );
        assert_eq!(parse_line("search").unwrap(), Some(SessionCommand::Search(None)));
    }

    #[test]
    fn test_query_may_be_empty() {
        assert_eq!(
            parse_line("query").unwrap(),
            Some(SessionCommand::Query(String::new()))
        );
    }

    #[test]
    fn test_seek_index() {
        assert_eq!(parse_line("seek 3").unwrap(), Some(SessionCommand::Seek(3)));
        assert!(parse_line("seek 0").is_err());
        assert!(parse_line("seek x").is_err());
        assert!(parse_line("seek").is_err());
    }

    #[test]
    fn test_commands_are_case_insensitive() {
        assert_eq!(parse_line("QUIT").unwrap(), Some(SessionCommand::Quit));
        assert_eq!(parse_line("Upload").unwrap(), Some(SessionCommand::Upload));
    }

    #[test]
    fn test_unknown_command() {
        let err = parse_line("dance").unwrap_err();
        assert!(err.to_string().contains("Unknown command"));
    }
}
