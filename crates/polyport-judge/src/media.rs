//! Filesystem-backed media store

use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::error::JudgeResult;
use crate::traits::MediaStore;

/// Media store rooted at a local directory, served under a URL prefix
#[derive(Debug, Clone)]
pub struct FsMediaStore {
    root: PathBuf,
    base_url: String,
}

impl FsMediaStore {
    /// `base_url` gains a trailing slash when missing
    pub fn new(root: impl Into<PathBuf>, base_url: impl Into<String>) -> Self {
        let mut base_url = base_url.into();
        if !base_url.ends_with('/') {
            base_url.push('/');
        }
        Self {
            root: root.into(),
            base_url,
        }
    }

    fn absolute(&self, path: &str) -> PathBuf {
        // Relative media paths only; a leading slash would escape the root
        self.root.join(path.trim_start_matches('/'))
    }

    /// Filesystem location of a stored path
    pub fn fs_path(&self, path: &str) -> PathBuf {
        self.absolute(path)
    }
}

#[async_trait]
impl MediaStore for FsMediaStore {
    async fn save(&self, path: &str, bytes: &[u8]) -> JudgeResult<()> {
        let target = self.absolute(path);
        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&target, bytes).await?;
        Ok(())
    }

    async fn exists(&self, path: &str) -> bool {
        tokio::fs::try_exists(self.absolute(path)).await.unwrap_or(false)
    }

    async fn list_dir(&self, path: &str) -> JudgeResult<Vec<String>> {
        let mut names = Vec::new();
        let mut entries = tokio::fs::read_dir(self.absolute(path)).await?;
        while let Some(entry) = entries.next_entry().await? {
            names.push(entry.file_name().to_string_lossy().into_owned());
        }
        names.sort();
        Ok(names)
    }

    async fn remove_tree(&self, path: &str) -> JudgeResult<()> {
        let target = self.absolute(path);
        match tokio::fs::remove_dir_all(&target).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path.trim_start_matches('/'))
    }
}

impl AsRef<Path> for FsMediaStore {
    fn as_ref(&self) -> &Path {
        &self.root
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn save_list_remove_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsMediaStore::new(dir.path(), "/media");

        store.save("problems/abc/u1/img.png", b"png").await.unwrap();
        assert!(store.exists("problems/abc/u1/img.png").await);
        assert_eq!(store.list_dir("problems/abc").await.unwrap(), vec!["u1"]);
        assert_eq!(store.url("problems/abc/u1/img.png"), "/media/problems/abc/u1/img.png");

        store.remove_tree("problems/abc/u1").await.unwrap();
        assert!(!store.exists("problems/abc/u1/img.png").await);
        // Deleting again is fine
        store.remove_tree("problems/abc/u1").await.unwrap();
    }
}
