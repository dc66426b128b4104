//! Uploaded-document storage
//!
//! Documents are stored as `<upload_dir>/<session_id>/<file_id><ext>`.
//! The pipeline only needs to resolve a file id back to a path before
//! handing it to the CV-parsing tool; unknown ids resolve to `None`.

use std::path::{Path, PathBuf};

/// File extensions accepted for uploaded CVs
pub const ALLOWED_EXTENSIONS: &[&str] = &[".pdf", ".docx", ".txt"];

/// Resolves uploaded files for a session
#[derive(Clone)]
pub struct FileStorage {
    base_dir: PathBuf,
}

impl FileStorage {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    /// Check whether a filename carries an accepted extension.
    pub fn is_allowed(filename: &str) -> bool {
        let lower = filename.to_lowercase();
        ALLOWED_EXTENSIONS.iter().any(|ext| lower.ends_with(ext))
    }

    /// Resolve a file id to its stored path, probing the allowed
    /// extensions. Returns `None` when no stored file exists.
    pub async fn resolve(&self, session_id: &str, file_id: &str) -> Option<PathBuf> {
        for ext in ALLOWED_EXTENSIONS {
            let path = self
                .base_dir
                .join(session_id)
                .join(format!("{}{}", file_id, ext));
            if tokio::fs::try_exists(&path).await.unwrap_or(false) {
                return Some(path);
            }
        }
        None
    }

    /// Directory holding a session's uploads.
    pub fn session_dir(&self, session_id: &str) -> PathBuf {
        self.base_dir.join(session_id)
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extension_allowlist() {
        assert!(FileStorage::is_allowed("cv.pdf"));
        assert!(FileStorage::is_allowed("Resume.DOCX"));
        assert!(!FileStorage::is_allowed("malware.exe"));
    }

    #[tokio::test]
    async fn missing_files_resolve_to_none() {
        let storage = FileStorage::new(std::env::temp_dir().join("scholarmatch-none"));
        assert!(storage.resolve("s1", "f1").await.is_none());
    }

    #[tokio::test]
    async fn stored_files_resolve_by_id() {
        let base = std::env::temp_dir().join("scholarmatch-resolve");
        let session_dir = base.join("s1");
        tokio::fs::create_dir_all(&session_dir).await.unwrap();
        tokio::fs::write(session_dir.join("f1.txt"), b"cv text").await.unwrap();

        let storage = FileStorage::new(&base);
        let path = storage.resolve("s1", "f1").await.unwrap();
        assert!(path.ends_with("s1/f1.txt"));

        tokio::fs::remove_dir_all(&base).await.unwrap();
    }
}
