//! 検査対象メディアの読み込み・フォルダスキャン

use crate::error::{InspectError, Result};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// 拡張子 → MIMEタイプ（画像・動画のみ受け付ける）
const MEDIA_TYPES: &[(&str, &str)] = &[
    ("jpg", "image/jpeg"),
    ("jpeg", "image/jpeg"),
    ("png", "image/png"),
    ("bmp", "image/bmp"),
    ("gif", "image/gif"),
    ("webp", "image/webp"),
    ("tif", "image/tiff"),
    ("tiff", "image/tiff"),
    ("mp4", "video/mp4"),
    ("mov", "video/quicktime"),
    ("webm", "video/webm"),
    ("avi", "video/x-msvideo"),
];

/// 拡張子からMIMEタイプを判定（大文字小文字は無視）
pub fn media_type_for(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_string_lossy().to_lowercase();
    MEDIA_TYPES
        .iter()
        .find(|(e, _)| *e == ext)
        .map(|(_, mime)| *mime)
}

fn is_image(path: &Path) -> bool {
    media_type_for(path).is_some_and(|m| m.starts_with("image/"))
}

/// 送信用に読み込んだメディアファイル
#[derive(Debug, Clone)]
pub struct MediaFile {
    pub file_name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl MediaFile {
    /// 選択されたパスを検証して読み込む
    pub async fn open(path: Option<&Path>) -> Result<Self> {
        let path = path.ok_or(InspectError::NoFileSelected)?;

        if !path.is_file() {
            return Err(InspectError::FileNotFound(path.display().to_string()));
        }

        let mime_type = media_type_for(path)
            .ok_or_else(|| InspectError::UnsupportedMedia(path.display().to_string()))?;

        let bytes = tokio::fs::read(path).await?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();

        Ok(Self {
            file_name,
            mime_type: mime_type.to_string(),
            bytes,
        })
    }

    /// メモリ上のデータから作る（テスト画像のダウンロード結果など）
    pub fn from_bytes(file_name: impl Into<String>, mime_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            mime_type: mime_type.into(),
            bytes,
        }
    }

    pub fn is_video(&self) -> bool {
        self.mime_type.starts_with("video/")
    }
}

/// フォルダ内の画像ファイルを列挙（ファイル名順）
pub fn scan_folder(folder: &Path, recursive: bool) -> Result<Vec<PathBuf>> {
    if !folder.is_dir() {
        return Err(InspectError::FolderNotFound(folder.display().to_string()));
    }

    let max_depth = if recursive { usize::MAX } else { 1 };
    let mut images: Vec<PathBuf> = WalkDir::new(folder)
        .max_depth(max_depth)
        .into_iter()
        .filter_map(|e| e.ok())
        .map(|e| e.into_path())
        .filter(|p| p.is_file() && is_image(p))
        .collect();

    images.sort_by(|a, b| a.file_name().cmp(&b.file_name()).then_with(|| a.cmp(b)));

    Ok(images)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_media_type_for() {
        assert_eq!(media_type_for(Path::new("a.JPG")), Some("image/jpeg"));
        assert_eq!(media_type_for(Path::new("clip.mp4")), Some("video/mp4"));
        assert_eq!(media_type_for(Path::new("notes.txt")), None);
        assert_eq!(media_type_for(Path::new("noext")), None);
    }

    #[tokio::test]
    async fn test_open_no_selection() {
        let err = MediaFile::open(None).await.unwrap_err();
        assert!(matches!(err, InspectError::NoFileSelected));
    }

    #[tokio::test]
    async fn test_open_missing_file() {
        let err = MediaFile::open(Some(Path::new("/nonexistent/x.jpg"))).await.unwrap_err();
        assert!(matches!(err, InspectError::FileNotFound(_)));
    }

    #[tokio::test]
    async fn test_open_rejects_non_media() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("report.pdf");
        fs::write(&path, b"%PDF").unwrap();

        let err = MediaFile::open(Some(path.as_path())).await.unwrap_err();
        assert!(matches!(err, InspectError::UnsupportedMedia(_)));
    }

    #[tokio::test]
    async fn test_open_reads_bytes() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("steel.png");
        fs::write(&path, b"png-bytes").unwrap();

        let file = MediaFile::open(Some(path.as_path())).await.unwrap();
        assert_eq!(file.file_name, "steel.png");
        assert_eq!(file.mime_type, "image/png");
        assert_eq!(file.bytes, b"png-bytes");
        assert!(!file.is_video());
    }

    #[test]
    fn test_scan_folder_not_found() {
        assert!(matches!(
            scan_folder(Path::new("/nonexistent/folder"), false),
            Err(InspectError::FolderNotFound(_))
        ));
    }

    #[test]
    fn test_scan_folder_images_only_sorted() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("c.jpg"), b"x").unwrap();
        fs::write(dir.path().join("a.png"), b"x").unwrap();
        fs::write(dir.path().join("b.JPEG"), b"x").unwrap();
        fs::write(dir.path().join("clip.mp4"), b"x").unwrap();
        fs::write(dir.path().join("readme.txt"), b"x").unwrap();

        let names: Vec<String> = scan_folder(dir.path(), false)
            .unwrap()
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["a.png", "b.JPEG", "c.jpg"]);
    }

    #[test]
    fn test_scan_folder_recursive() {
        let dir = tempdir().unwrap();
        let sub = dir.path().join("line2");
        fs::create_dir_all(&sub).unwrap();
        fs::write(dir.path().join("top.jpg"), b"x").unwrap();
        fs::write(sub.join("nested.jpg"), b"x").unwrap();

        assert_eq!(scan_folder(dir.path(), false).unwrap().len(), 1);
        assert_eq!(scan_folder(dir.path(), true).unwrap().len(), 2);
    }
}
