//! Managed Postgres provider (Supabase) settings.

use serde::{Deserialize, Serialize};

/// Supabase project settings. All optional; the project URL is only used
/// to derive public artifact URLs.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SupabaseConfig {
    /// Project URL (`SUPABASE_URL`, falling back to `VITE_SUPABASE_URL`).
    #[serde(default)]
    pub url: Option<String>,
    /// Public anon key.
    #[serde(default)]
    pub anon_key: Option<String>,
    /// Service-role key.
    #[serde(default)]
    pub service_key: Option<String>,
    /// Storage bucket that holds generated documents.
    #[serde(default = "default_bucket")]
    pub storage_bucket: String,
}

impl SupabaseConfig {
    /// Public URL of an object in the documents bucket, if a project URL is set.
    pub fn public_object_url(&self, object_path: &str) -> Option<String> {
        self.url.as_deref().filter(|u| !u.is_empty()).map(|base| {
            format!(
                "{}/storage/v1/object/public/{}/{}",
                base.trim_end_matches('/'),
                self.storage_bucket,
                object_path.trim_start_matches('/')
            )
        })
    }
}

fn default_bucket() -> String {
    "documents".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_public_object_url() {
        let cfg = SupabaseConfig {
            url: Some("https://abc.supabase.co/".into()),
            storage_bucket: "documents".into(),
            ..Default::default()
        };
        assert_eq!(
            cfg.public_object_url("/2026/x.html").as_deref(),
            Some("https://abc.supabase.co/storage/v1/object/public/documents/2026/x.html")
        );
    }

    #[test]
    fn test_public_object_url_without_project() {
        assert!(SupabaseConfig::default().public_object_url("x").is_none());
    }
}
