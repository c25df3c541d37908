//! ドメインサービス: ファイル選択の検証
//!
//! ファイルピッカー経由でもドラッグ&ドロップ相当の経路でも、
//! 選択されたファイルは同じ規則で検証する。
//!
//! 設定値（最大ファイルサイズ、拡張子とMIMEタイプの対応）はAPP_CONFIGから取得します。

use crate::config::APP_CONFIG;
use crate::domain::error::DomainError;
use crate::domain::session::SelectedFile;
use std::path::Path;

/// 対応表に無い拡張子のMIMEタイプ
const UNKNOWN_MIME_TYPE: &str = "application/octet-stream";

/// パスから選択候補のファイルを作成する
///
/// # エラー
/// - ファイルが存在しない
/// - ディレクトリが指定された
/// - ファイルが空
/// - ファイルサイズが制限を超過
///
/// MIMEタイプは拡張子から決定します。動画かどうかの判定は
/// [`ensure_video_mime`] が行います。
pub fn inspect_file(file_path: &str) -> Result<SelectedFile, DomainError> {
    let path = Path::new(file_path);

    let metadata =
        std::fs::metadata(path).map_err(|_| DomainError::file_not_found(file_path))?;

    if metadata.is_dir() {
        return Err(DomainError::not_a_file(file_path));
    }

    let size = metadata.len();
    if size == 0 {
        return Err(DomainError::empty_file(file_path));
    }

    let max_file_size = APP_CONFIG.upload.max_file_size;
    if size > max_file_size {
        return Err(DomainError::FileTooLarge {
            size,
            max: max_file_size,
        });
    }

    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or(file_path)
        .to_string();

    Ok(SelectedFile::new(path, name, mime_type_for(path), size))
}

/// 拡張子からMIMEタイプを決定する
pub fn mime_type_for(path: &Path) -> String {
    path.extension()
        .and_then(|ext| ext.to_str())
        .and_then(|ext| APP_CONFIG.upload.mime_for_extension(ext))
        .unwrap_or(UNKNOWN_MIME_TYPE)
        .to_string()
}

/// 選択候補が動画であることを確認する
pub fn ensure_video_mime(file: &SelectedFile) -> Result<(), DomainError> {
    if file.mime_type().starts_with("video/") {
        Ok(())
    } else {
        Err(DomainError::unsupported_media_type(
            file.name(),
            file.mime_type(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    fn write_file(dir: &TempDir, name: &str, bytes: &[u8]) -> String {
        let path = dir.path().join(name);
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(bytes).unwrap();
        path.to_string_lossy().into_owned()
    }

    #[test]
    fn test_inspect_video_file() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "cat.MP4", b"not really a video");

        let file = inspect_file(&path).unwrap();
        assert_eq!(file.name(), "cat.MP4");
        assert_eq!(file.mime_type(), "video/mp4");
        assert_eq!(file.size_bytes(), 18);
        assert!(ensure_video_mime(&file).is_ok());
    }

    #[test]
    fn test_inspect_missing_file() {
        let result = inspect_file("/definitely/not/here.mp4");
        assert!(matches!(result, Err(DomainError::FileNotFound { .. })));
    }

    #[test]
    fn test_inspect_directory() {
        let dir = TempDir::new().unwrap();
        let result = inspect_file(&dir.path().to_string_lossy());
        assert!(matches!(result, Err(DomainError::NotAFile { .. })));
    }

    #[test]
    fn test_inspect_empty_file() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "empty.mp4", b"");
        assert!(matches!(
            inspect_file(&path),
            Err(DomainError::EmptyFile { .. })
        ));
    }

    #[test]
    fn test_non_video_is_rejected() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "notes.txt", b"hello");

        let file = inspect_file(&path).unwrap();
        assert_eq!(file.mime_type(), UNKNOWN_MIME_TYPE);
        assert!(matches!(
            ensure_video_mime(&file),
            Err(DomainError::UnsupportedMediaType { .. })
        ));
    }
}
