//! # File Management Module
//!
//! Questo modulo gestisce le operazioni sui file locali e la discovery di media.
//!
//! ## Responsabilità:
//! - Discovery ricorsiva di file media in directory
//! - Determinazione del tipo di media (foto vs video) dall'estensione
//! - Lettura della dimensione dei file
//! - Formattazione human-readable delle dimensioni
//!
//! ## Formati riconosciuti:
//! - **Foto**: JPG, JPEG, PNG, WebP, GIF, HEIC, BMP, TIFF
//!   (HEIC viene selezionato ma l'export lo riporta come formato non supportato)
//! - **Video**: MP4, MOV, AVI, MKV, WebM, M4V, 3GP
//!
//! ## Esempio:
//! ```rust,ignore
//! let files = FileManager::find_media_files("/path/to/media")?;
//! for file in files {
//!     if FileManager::media_kind(&file) == Some(MediaKind::Photo) {
//!         // photo
//!     }
//! }
//! ```

use crate::picker::MediaKind;
use anyhow::Result;
use std::path::{Path, PathBuf};
use tokio::fs;
use walkdir::WalkDir;

const PHOTO_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "webp", "gif", "heic", "bmp", "tif", "tiff"];
const VIDEO_EXTENSIONS: &[&str] = &["mp4", "mov", "avi", "mkv", "webm", "m4v", "3gp"];

/// Manages file operations and discovery
pub struct FileManager;

impl FileManager {
    /// Get the size of a file in bytes
    pub async fn get_file_size(path: &Path) -> Result<u64> {
        let metadata = fs::metadata(path).await?;
        Ok(metadata.len())
    }

    /// Find all supported media files in a directory, sorted by path
    pub fn find_media_files(media_dir: &Path) -> Result<Vec<PathBuf>> {
        let mut files = Vec::new();

        for entry in WalkDir::new(media_dir)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
        {
            let path = entry.path();
            if Self::is_supported_format(path) {
                files.push(path.to_path_buf());
            }
        }

        Ok(files)
    }

    fn extension(path: &Path) -> Option<String> {
        path.extension().map(|ext| ext.to_string_lossy().to_lowercase())
    }

    /// Media kind from the file extension, `None` if unsupported
    pub fn media_kind(path: &Path) -> Option<MediaKind> {
        let ext = Self::extension(path)?;
        if PHOTO_EXTENSIONS.contains(&ext.as_str()) {
            Some(MediaKind::Photo)
        } else if VIDEO_EXTENSIONS.contains(&ext.as_str()) {
            Some(MediaKind::Video)
        } else {
            None
        }
    }

    /// Check if a file format is supported
    pub fn is_supported_format(path: &Path) -> bool {
        Self::media_kind(path).is_some()
    }

    /// Get human-readable file size
    pub fn format_size(size: u64) -> String {
        const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];
        let mut size = size as f64;
        let mut unit_index = 0;

        while size >= 1024.0 && unit_index < UNITS.len() - 1 {
            size /= 1024.0;
            unit_index += 1;
        }

        if unit_index == 0 {
            format!("{} {}", size as u64, UNITS[unit_index])
        } else {
            format!("{:.2} {}", size, UNITS[unit_index])
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_media_kind_detection() {
        assert_eq!(FileManager::media_kind(Path::new("a/IMG_0001.JPG")), Some(MediaKind::Photo));
        assert_eq!(FileManager::media_kind(Path::new("clip.mov")), Some(MediaKind::Video));
        assert_eq!(FileManager::media_kind(Path::new("notes.txt")), None);
        assert_eq!(FileManager::media_kind(Path::new("no_extension")), None);
        assert_eq!(FileManager::media_kind(Path::new("x.heic")), Some(MediaKind::Photo));
        assert_eq!(FileManager::media_kind(Path::new("x.TIF")), Some(MediaKind::Photo));
        assert_eq!(FileManager::media_kind(Path::new("x.webm")), Some(MediaKind::Video));
    }

    #[test]
    fn test_format_size() {
        assert_eq!(FileManager::format_size(512), "512 B");
        assert_eq!(FileManager::format_size(1536), "1.50 KB");
        assert_eq!(FileManager::format_size(5 * 1024 * 1024), "5.00 MB");
    }

    #[tokio::test]
    async fn test_find_media_files_sorted() {
        let temp_dir = TempDir::new().unwrap();
        let nested = temp_dir.path().join("album");
        std::fs::create_dir_all(&nested).unwrap();
        std::fs::write(temp_dir.path().join("b.jpg"), b"x").unwrap();
        std::fs::write(temp_dir.path().join("a.mp4"), b"xyz").unwrap();
        std::fs::write(temp_dir.path().join("readme.md"), b"skip").unwrap();
        std::fs::write(nested.join("c.png"), b"x").unwrap();

        let files = FileManager::find_media_files(temp_dir.path()).unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["a.mp4", "c.png", "b.jpg"]);

        assert_eq!(FileManager::get_file_size(&files[0]).await.unwrap(), 3);
    }
}
