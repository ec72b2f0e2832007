use crate::domain::ports::BlobStorage;
use crate::utils::error::{PracticeError, Result};
use async_trait::async_trait;
use reqwest::Client;
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct LocalStorage {
    base_path: String,
}

impl LocalStorage {
    pub fn new(base_path: String) -> Self {
        Self { base_path }
    }
}

#[async_trait]
impl BlobStorage for LocalStorage {
    async fn read_file(&self, path: &str) -> Result<Vec<u8>> {
        let full_path = Path::new(&self.base_path).join(path);
        let data = tokio::fs::read(full_path).await?;
        Ok(data)
    }

    async fn write_file(&self, path: &str, data: &[u8]) -> Result<()> {
        let full_path = Path::new(&self.base_path).join(path);

        if let Some(parent) = full_path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        tokio::fs::write(full_path, data).await?;
        Ok(())
    }
}

/// Read-only blob storage served over HTTP (`{endpoint}/{path}`).
#[derive(Debug, Clone)]
pub struct HttpBlobStorage {
    endpoint: String,
    client: Client,
}

impl HttpBlobStorage {
    pub fn new(endpoint: &str, timeout_seconds: u64) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_seconds))
            .build()?;
        Ok(Self {
            endpoint: endpoint.trim_end_matches('/').to_string(),
            client,
        })
    }
}

#[async_trait]
impl BlobStorage for HttpBlobStorage {
    async fn read_file(&self, path: &str) -> Result<Vec<u8>> {
        let url = format!("{}/{}", self.endpoint, path.trim_start_matches('/'));
        tracing::debug!("Fetching blob {}", url);

        let response = self.client.get(&url).send().await?;
        if !response.status().is_success() {
            return Err(PracticeError::StoreResponse {
                status: response.status().as_u16(),
                endpoint: url,
            });
        }
        Ok(response.bytes().await?.to_vec())
    }

    async fn write_file(&self, path: &str, _data: &[u8]) -> Result<()> {
        Err(PracticeError::ConfigValidationError {
            field: "blobs.type".to_string(),
            message: format!("HTTP blob storage is read-only, cannot write {}", path),
        })
    }
}
