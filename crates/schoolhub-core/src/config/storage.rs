//! Artifact storage configuration.

use serde::{Deserialize, Serialize};

/// Where rendered documents are written.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Root directory for the local filesystem artifact store.
    #[serde(default = "default_root")]
    pub root_path: String,
    /// URL prefix used for artifacts when no Supabase project is configured.
    #[serde(default = "default_public_prefix")]
    pub public_path_prefix: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            root_path: default_root(),
            public_path_prefix: default_public_prefix(),
        }
    }
}

fn default_root() -> String {
    "./data/documents".to_string()
}

fn default_public_prefix() -> String {
    "/files".to_string()
}
