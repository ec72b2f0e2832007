//! Wiring from configuration to a ready catalog.

use crate::adapters::{load_dump, HttpBlobStorage, HttpDocumentStore, LocalStorage};
use crate::config::toml_config::{AppConfig, DEFAULT_TIMEOUT_SECONDS};
use crate::core::catalog::ContentCatalog;
use crate::domain::ports::{BlobStorage, DocumentStore};
use crate::utils::error::{PracticeError, Result};
use crate::utils::validation::validate_required_field;
use std::sync::Arc;

pub type DynCatalog = ContentCatalog<Box<dyn DocumentStore>>;

pub async fn build_store(config: &AppConfig) -> Result<Box<dyn DocumentStore>> {
    match config.store.r#type.as_str() {
        "dump" => {
            let path = validate_required_field("store.path", &config.store.path)?;
            Ok(Box::new(load_dump(path).await?))
        }
        "http" => {
            let endpoint = validate_required_field("store.endpoint", &config.store.endpoint)?;
            tracing::info!("🌐 Using document store at {}", endpoint);
            Ok(Box::new(HttpDocumentStore::new(
                endpoint,
                config.store.token.clone(),
                config.store_timeout(),
            )?))
        }
        other => Err(PracticeError::InvalidConfigValueError {
            field: "store.type".to_string(),
            value: other.to_string(),
            reason: "Supported store types: dump, http".to_string(),
        }),
    }
}

pub fn build_blob_storage(config: &AppConfig) -> Result<Option<Arc<dyn BlobStorage>>> {
    let Some(blobs) = &config.blobs else {
        return Ok(None);
    };

    let storage: Arc<dyn BlobStorage> = match blobs.r#type.as_str() {
        "local" => {
            let path = validate_required_field("blobs.path", &blobs.path)?;
            Arc::new(LocalStorage::new(path.clone()))
        }
        "http" => {
            let endpoint = validate_required_field("blobs.endpoint", &blobs.endpoint)?;
            Arc::new(HttpBlobStorage::new(
                endpoint,
                blobs.timeout_seconds.unwrap_or(DEFAULT_TIMEOUT_SECONDS),
            )?)
        }
        other => {
            return Err(PracticeError::InvalidConfigValueError {
                field: "blobs.type".to_string(),
                value: other.to_string(),
                reason: "Supported blob storage types: local, http".to_string(),
            })
        }
    };
    Ok(Some(storage))
}

/// Where `check --report` writes: the local blob root when one is configured,
/// otherwise the working directory. HTTP blob storage is read-only.
pub fn report_storage(config: &AppConfig) -> LocalStorage {
    let root = config
        .blobs
        .as_ref()
        .filter(|blobs| blobs.r#type == "local")
        .and_then(|blobs| blobs.path.clone())
        .unwrap_or_else(|| ".".to_string());
    LocalStorage::new(root)
}

pub async fn build_catalog(config: &AppConfig) -> Result<DynCatalog> {
    let store = build_store(config).await?;
    let mut catalog = ContentCatalog::new(store).with_settings(config.catalog_settings());
    if let Some(blobs) = build_blob_storage(config)? {
        catalog = catalog.with_blob_storage(blobs);
    }
    Ok(catalog)
}
