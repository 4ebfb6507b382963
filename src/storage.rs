//! Object storage used to share generated documents.

use async_trait::async_trait;
use std::path::{Component, Path, PathBuf};

use crate::config::{StorageConfig, SupabaseConfig};

#[async_trait]
pub trait ObjectStorage {
    /// Store `file_data` under `filename`, replacing any existing object.
    async fn upload_file(&self, filename: &str, file_data: &[u8]) -> Result<(), String>;

    async fn delete_file(&self, filename: &str) -> Result<(), String>;

    /// Public URL of a stored object.
    fn get_asset_url(&self, filename: &str) -> String;
}

/// Build the storage backend selected in configuration.
pub fn from_config(
    config: &StorageConfig,
    http_client: reqwest::Client,
) -> Box<dyn ObjectStorage + Send + Sync> {
    match config {
        StorageConfig::Local {
            dir,
            public_base_url,
        } => Box::new(LocalStorage::new(dir.clone(), public_base_url.clone())),
        StorageConfig::Supabase(supabase) => {
            Box::new(SupabaseStorage::new(supabase.clone(), http_client))
        }
    }
}

pub struct SupabaseStorage {
    config: SupabaseConfig,
    client: reqwest::Client,
}

impl SupabaseStorage {
    pub fn new(config: SupabaseConfig, client: reqwest::Client) -> Self {
        Self { config, client }
    }

    fn object_url(&self, filename: &str) -> String {
        format!(
            "{}/storage/v1/object/{}/{}",
            self.config.url,
            self.config.bucket,
            filename.trim_start_matches('/')
        )
    }
}

#[async_trait]
impl ObjectStorage for SupabaseStorage {
    async fn upload_file(&self, filename: &str, file_data: &[u8]) -> Result<(), String> {
        let content_type = mime_guess::from_path(filename)
            .first_or_octet_stream()
            .to_string();

        let response = self
            .client
            .post(self.object_url(filename))
            .bearer_auth(&self.config.service_key)
            .header("apikey", &self.config.service_key)
            .header("Content-Type", content_type)
            .header("x-upsert", "true")
            .body(file_data.to_vec())
            .send()
            .await
            .map_err(|e| format!("Failed to upload {}: {}", filename, e))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(format!(
                "Upload of {} failed with status {}: {}",
                filename, status, body
            ));
        }

        log::info!("Uploaded {} ({} bytes) to bucket {}", filename, file_data.len(), self.config.bucket);
        Ok(())
    }

    async fn delete_file(&self, filename: &str) -> Result<(), String> {
        let response = self
            .client
            .delete(self.object_url(filename))
            .bearer_auth(&self.config.service_key)
            .header("apikey", &self.config.service_key)
            .send()
            .await
            .map_err(|e| format!("Failed to delete {}: {}", filename, e))?;

        if !response.status().is_success() {
            return Err(format!(
                "Delete of {} failed with status {}",
                filename,
                response.status()
            ));
        }
        Ok(())
    }

    fn get_asset_url(&self, filename: &str) -> String {
        format!(
            "{}/storage/v1/object/public/{}/{}",
            self.config.url,
            self.config.bucket,
            filename.trim_start_matches('/')
        )
    }
}

/// Stores files in a local directory served by the HTTP server.
pub struct LocalStorage {
    root: PathBuf,
    public_base_url: String,
}

impl LocalStorage {
    pub fn new(root: impl Into<PathBuf>, public_base_url: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            public_base_url: public_base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve `filename` inside the root, rejecting absolute paths and `..`.
    fn path_for(&self, filename: &str) -> Result<PathBuf, String> {
        let relative = Path::new(filename);
        let safe = relative
            .components()
            .all(|c| matches!(c, Component::Normal(_)));
        if filename.is_empty() || !safe {
            return Err(format!("Invalid storage path: {}", filename));
        }
        Ok(self.root.join(relative))
    }
}

#[async_trait]
impl ObjectStorage for LocalStorage {
    async fn upload_file(&self, filename: &str, file_data: &[u8]) -> Result<(), String> {
        let path = self.path_for(filename)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| format!("Failed to create {}: {}", parent.display(), e))?;
        }

        // Readers never see a half-written file.
        let partial = path.with_extension("part");
        tokio::fs::write(&partial, file_data)
            .await
            .map_err(|e| format!("Failed to write {}: {}", partial.display(), e))?;
        if let Err(e) = tokio::fs::rename(&partial, &path).await {
            let _ = tokio::fs::remove_file(&partial).await;
            return Err(format!("Failed to store {}: {}", path.display(), e));
        }

        log::info!("Stored {} ({} bytes)", path.display(), file_data.len());
        Ok(())
    }

    async fn delete_file(&self, filename: &str) -> Result<(), String> {
        let path = self.path_for(filename)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(format!("Failed to delete {}: {}", path.display(), e)),
        }
    }

    fn get_asset_url(&self, filename: &str) -> String {
        format!("{}/{}", self.public_base_url, filename.trim_start_matches('/'))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_supabase_urls() {
        let storage = SupabaseStorage::new(
            SupabaseConfig {
                url: "https://abc.supabase.co".to_string(),
                service_key: "key".to_string(),
                bucket: "docs".to_string(),
            },
            reqwest::Client::new(),
        );
        assert_eq!(
            storage.get_asset_url("documents/a.pdf"),
            "https://abc.supabase.co/storage/v1/object/public/docs/documents/a.pdf"
        );
        assert_eq!(
            storage.object_url("/documents/a.pdf"),
            "https://abc.supabase.co/storage/v1/object/docs/documents/a.pdf"
        );
    }

    #[tokio::test]
    async fn test_local_upload_and_delete() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalStorage::new(dir.path(), "http://localhost:8080/files/");

        storage.upload_file("documents/a.pdf", b"%PDF").await.unwrap();
        let stored = dir.path().join("documents/a.pdf");
        assert_eq!(std::fs::read(&stored).unwrap(), b"%PDF");
        assert!(!dir.path().join("documents/a.part").exists());
        assert_eq!(
            storage.get_asset_url("documents/a.pdf"),
            "http://localhost:8080/files/documents/a.pdf"
        );

        storage.delete_file("documents/a.pdf").await.unwrap();
        assert!(!stored.exists());
        // Deleting twice is fine.
        storage.delete_file("documents/a.pdf").await.unwrap();
    }

    #[tokio::test]
    async fn test_local_rejects_escaping_paths() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalStorage::new(dir.path(), "http://localhost/files");
        assert!(storage.upload_file("../evil.pdf", b"x").await.is_err());
        assert!(storage.upload_file("/etc/evil.pdf", b"x").await.is_err());
        assert!(storage.delete_file("").await.is_err());
    }
}
