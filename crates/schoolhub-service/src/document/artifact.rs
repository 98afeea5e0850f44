//! Storage for rendered document artifacts.

use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::fs;
use tokio::sync::RwLock;
use tracing::debug;

use schoolhub_core::config::storage::StorageConfig;
use schoolhub_core::config::supabase::SupabaseConfig;
use schoolhub_core::error::{AppError, ErrorKind};
use schoolhub_core::result::AppResult;

/// Where an artifact landed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredArtifact {
    /// Path relative to the store root.
    pub path: String,
    /// URL clients fetch it from.
    pub url: String,
}

/// A place rendered documents are written to.
#[async_trait]
pub trait ArtifactStore: Send + Sync + 'static {
    /// Backend name.
    fn provider_type(&self) -> &'static str;

    /// Write `data` at `path`, replacing any existing artifact.
    async fn put(&self, path: &str, data: Vec<u8>) -> AppResult<StoredArtifact>;

    /// Read the artifact at `path`.
    async fn get(&self, path: &str) -> AppResult<Vec<u8>>;
}

/// Reject absolute paths and parent traversal.
fn clean_path(path: &str) -> AppResult<&str> {
    let clean = path.trim_start_matches('/');
    let safe = !clean.is_empty()
        && Path::new(clean)
            .components()
            .all(|c| matches!(c, Component::Normal(_)));
    if safe {
        Ok(clean)
    } else {
        Err(AppError::validation(format!("Invalid artifact path: {path}")))
    }
}

fn join_url(prefix: &str, path: &str) -> String {
    format!("{}/{}", prefix.trim_end_matches('/'), path)
}

/// Local filesystem artifact store.
#[derive(Debug, Clone)]
pub struct LocalArtifactStore {
    /// Root directory for all artifacts.
    root: PathBuf,
    /// Prefix of public URLs.
    public_prefix: String,
}

impl LocalArtifactStore {
    /// Create a store rooted at `root_path`, creating the directory.
    pub async fn new(root_path: &str, public_prefix: impl Into<String>) -> AppResult<Self> {
        let root = PathBuf::from(root_path);
        fs::create_dir_all(&root).await.map_err(|e| {
            AppError::with_source(
                ErrorKind::Storage,
                format!("Failed to create storage root: {}", root.display()),
                e,
            )
        })?;
        Ok(Self {
            root,
            public_prefix: public_prefix.into(),
        })
    }

    /// Build from configuration. Public URLs point at the Supabase
    /// storage bucket when a project URL is configured, otherwise at the
    /// server's own file route.
    pub async fn from_config(storage: &StorageConfig, supabase: &SupabaseConfig) -> AppResult<Self> {
        let prefix = supabase
            .public_object_url("")
            .map(|u| u.trim_end_matches('/').to_string())
            .unwrap_or_else(|| storage.public_path_prefix.clone());
        Self::new(&storage.root_path, prefix).await
    }

    /// Root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }
}

#[async_trait]
impl ArtifactStore for LocalArtifactStore {
    fn provider_type(&self) -> &'static str {
        "local"
    }

    async fn put(&self, path: &str, data: Vec<u8>) -> AppResult<StoredArtifact> {
        let clean = clean_path(path)?;
        let full_path = self.root.join(clean);
        if let Some(parent) = full_path.parent() {
            fs::create_dir_all(parent).await.map_err(|e| {
                AppError::with_source(
                    ErrorKind::Storage,
                    format!("Failed to create parent directory: {}", parent.display()),
                    e,
                )
            })?;
        }
        let bytes = data.len();
        fs::write(&full_path, data).await.map_err(|e| {
            AppError::with_source(
                ErrorKind::Storage,
                format!("Failed to write artifact: {clean}"),
                e,
            )
        })?;
        debug!(path = clean, bytes, "Wrote artifact");

        Ok(StoredArtifact {
            path: clean.to_string(),
            url: join_url(&self.public_prefix, clean),
        })
    }

    async fn get(&self, path: &str) -> AppResult<Vec<u8>> {
        let clean = clean_path(path)?;
        fs::read(self.root.join(clean)).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                AppError::not_found(format!("Artifact not found: {clean}"))
            } else {
                AppError::with_source(
                    ErrorKind::Storage,
                    format!("Failed to read artifact: {clean}"),
                    e,
                )
            }
        })
    }
}

/// Artifact store kept in process memory.
#[derive(Debug, Default)]
pub struct MemoryArtifactStore {
    objects: RwLock<HashMap<String, Vec<u8>>>,
}

impl MemoryArtifactStore {
    /// An empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored artifacts.
    pub async fn len(&self) -> usize {
        self.objects.read().await.len()
    }

    /// Whether nothing has been stored.
    pub async fn is_empty(&self) -> bool {
        self.objects.read().await.is_empty()
    }
}

#[async_trait]
impl ArtifactStore for MemoryArtifactStore {
    fn provider_type(&self) -> &'static str {
        "memory"
    }

    async fn put(&self, path: &str, data: Vec<u8>) -> AppResult<StoredArtifact> {
        let clean = clean_path(path)?.to_string();
        self.objects.write().await.insert(clean.clone(), data);
        Ok(StoredArtifact {
            url: join_url("/files", &clean),
            path: clean,
        })
    }

    async fn get(&self, path: &str) -> AppResult<Vec<u8>> {
        let clean = clean_path(path)?;
        self.objects
            .read()
            .await
            .get(clean)
            .cloned()
            .ok_or_else(|| AppError::not_found(format!("Artifact not found: {clean}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_local_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalArtifactStore::new(dir.path().to_str().unwrap(), "/files")
            .await
            .unwrap();

        let stored = store
            .put("2026/10/doc.html", b"<p>ok</p>".to_vec())
            .await
            .unwrap();
        assert_eq!(stored.url, "/files/2026/10/doc.html");
        assert_eq!(store.get("2026/10/doc.html").await.unwrap(), b"<p>ok</p>");
        assert!(store.root().join("2026/10/doc.html").exists());
    }

    #[tokio::test]
    async fn test_traversal_is_rejected() {
        let store = MemoryArtifactStore::new();
        let err = store.put("../etc/passwd", vec![]).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Validation);
    }

    #[tokio::test]
    async fn test_supabase_prefix() {
        let dir = tempfile::tempdir().unwrap();
        let storage = StorageConfig {
            root_path: dir.path().to_str().unwrap().to_string(),
            ..StorageConfig::default()
        };
        let supabase = SupabaseConfig {
            url: Some("https://abc.supabase.co".into()),
            storage_bucket: "documents".into(),
            ..SupabaseConfig::default()
        };
        let store = LocalArtifactStore::from_config(&storage, &supabase)
            .await
            .unwrap();
        let stored = store.put("a.html", vec![1]).await.unwrap();
        assert_eq!(
            stored.url,
            "https://abc.supabase.co/storage/v1/object/public/documents/a.html"
        );
    }
}
