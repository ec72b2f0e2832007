use crate::domain::model::{ContentFile, DocumentQuery};
use crate::utils::error::Result;
use async_trait::async_trait;
use std::sync::Arc;

/// Query side of the content document store.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn query(&self, query: &DocumentQuery) -> Result<Vec<ContentFile>>;
}

/// Byte storage for documents whose JSON is kept outside the record, and for reports.
#[async_trait]
pub trait BlobStorage: Send + Sync {
    async fn read_file(&self, path: &str) -> Result<Vec<u8>>;
    async fn write_file(&self, path: &str, data: &[u8]) -> Result<()>;
}

#[async_trait]
impl<T: DocumentStore + ?Sized> DocumentStore for Box<T> {
    async fn query(&self, query: &DocumentQuery) -> Result<Vec<ContentFile>> {
        (**self).query(query).await
    }
}

#[async_trait]
impl<T: DocumentStore + ?Sized> DocumentStore for Arc<T> {
    async fn query(&self, query: &DocumentQuery) -> Result<Vec<ContentFile>> {
        (**self).query(query).await
    }
}
