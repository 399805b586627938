//! File-backing store for uploaded certificate images.
//!
//! Rows reference their image through a root-relative public path
//! (`/storage/certificates/<file>`); this module owns the mapping between
//! those paths and files on disk. Deletes are idempotent so a missing file
//! never blocks removing or replacing the row that pointed at it.

use std::io;
use std::path::{Component, Path, PathBuf};

use chrono::Utc;
use tokio::fs;

/// URL prefix under which stored files are publicly served.
pub const PUBLIC_PREFIX: &str = "/storage";

const CERTIFICATES_DIR: &str = "certificates";

#[derive(Debug, Clone)]
pub struct Storage {
    root: PathBuf,
}

impl Storage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Storage { root: root.into() }
    }

    pub async fn ensure_layout(&self) -> io::Result<()> {
        fs::create_dir_all(self.root.join(CERTIFICATES_DIR)).await
    }

    /// Write an uploaded certificate image to disk and return its public
    /// path. The stored name is the upload's original name prefixed with the
    /// current unix timestamp, so re-uploads of the same name do not clobber
    /// unrelated files.
    pub async fn save_certificate_image(
        &self,
        original_name: &str,
        data: &[u8],
    ) -> io::Result<String> {
        let filename = format!("{}_{}", Utc::now().timestamp(), sanitize_filename(original_name));
        let dir = self.root.join(CERTIFICATES_DIR);
        fs::create_dir_all(&dir).await?;
        fs::write(dir.join(&filename), data).await?;
        Ok(format!("{PUBLIC_PREFIX}/{CERTIFICATES_DIR}/{filename}"))
    }

    /// Delete the file a stored public path points at. A path that does not
    /// resolve under the storage root (malformed or tampered row data) is
    /// logged and skipped; a file that is already gone is a no-op.
    pub async fn delete_public_path(&self, public_path: &str) -> io::Result<()> {
        let Some(rel) = public_path
            .strip_prefix(PUBLIC_PREFIX)
            .map(|rest| rest.trim_start_matches('/'))
        else {
            tracing::warn!(path = public_path, "stored image path is outside the public prefix, skipping delete");
            return Ok(());
        };

        let Some(path) = self.resolve(rel) else {
            tracing::warn!(path = public_path, "stored image path does not resolve, skipping delete");
            return Ok(());
        };

        match fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err),
        }
    }

    /// Resolve a relative request path to a file under the storage root.
    /// Rejects absolute paths and any `..` component.
    pub fn resolve(&self, rel: &str) -> Option<PathBuf> {
        let rel = Path::new(rel);
        if rel
            .components()
            .any(|c| !matches!(c, Component::Normal(_)))
        {
            return None;
        }
        if rel.as_os_str().is_empty() {
            return None;
        }
        Some(self.root.join(rel))
    }
}

/// Keep only the final path component of a client-supplied filename and
/// replace anything that could not survive a URL or a filesystem round trip.
fn sanitize_filename(name: &str) -> String {
    let base = name
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(name)
        .trim();

    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();

    if cleaned.trim_matches(['.', '_']).is_empty() {
        "upload".to_string()
    } else {
        cleaned
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn storage() -> (Storage, TempDir) {
        let dir = TempDir::new().unwrap();
        (Storage::new(dir.path()), dir)
    }

    #[tokio::test]
    async fn save_writes_file_and_returns_public_path() {
        let (storage, dir) = storage();
        let path = storage
            .save_certificate_image("valid.jpg", b"jpegdata")
            .await
            .unwrap();

        assert!(path.starts_with("/storage/certificates/"));
        assert!(path.ends_with("_valid.jpg"));

        let rel = path.strip_prefix("/storage/").unwrap();
        assert_eq!(std::fs::read(dir.path().join(rel)).unwrap(), b"jpegdata");
    }

    #[tokio::test]
    async fn delete_removes_file_and_is_idempotent() {
        let (storage, dir) = storage();
        let path = storage
            .save_certificate_image("cert.png", b"png")
            .await
            .unwrap();
        let rel = path.strip_prefix("/storage/").unwrap().to_string();

        storage.delete_public_path(&path).await.unwrap();
        assert!(!dir.path().join(&rel).exists());

        // Second delete of the same path is a no-op, not an error.
        storage.delete_public_path(&path).await.unwrap();
    }

    #[tokio::test]
    async fn delete_skips_malformed_paths() {
        let (storage, _dir) = storage();
        storage.delete_public_path("not-a-storage-path").await.unwrap();
        storage
            .delete_public_path("/storage/../../etc/passwd")
            .await
            .unwrap();
    }

    #[test]
    fn resolve_rejects_traversal() {
        let (storage, _dir) = storage();
        assert!(storage.resolve("certificates/a.jpg").is_some());
        assert!(storage.resolve("../secret").is_none());
        assert!(storage.resolve("certificates/../../x").is_none());
        assert!(storage.resolve("/etc/passwd").is_none());
        assert!(storage.resolve("").is_none());
    }

    #[test]
    fn sanitize_strips_directories_and_odd_characters() {
        assert_eq!(sanitize_filename("valid.jpg"), "valid.jpg");
        assert_eq!(sanitize_filename("../../evil.png"), "evil.png");
        assert_eq!(sanitize_filename("C:\\Users\\me\\cert.gif"), "cert.gif");
        assert_eq!(sanitize_filename("my cert (1).jpg"), "my_cert__1_.jpg");
        assert_eq!(sanitize_filename("..."), "upload");
        assert_eq!(sanitize_filename(""), "upload");
    }
}
