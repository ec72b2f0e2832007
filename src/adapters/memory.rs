use crate::domain::model::{ContentFile, DocumentQuery};
use crate::domain::ports::DocumentStore;
use crate::utils::error::Result;
use async_trait::async_trait;

/// Document store over records held in memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    docs: Vec<ContentFile>,
}

impl MemoryStore {
    pub fn new(docs: Vec<ContentFile>) -> Self {
        Self { docs }
    }

    pub fn insert(&mut self, doc: ContentFile) {
        self.docs.push(doc);
    }

    pub fn len(&self) -> usize {
        self.docs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.docs.is_empty()
    }

    pub fn documents(&self) -> &[ContentFile] {
        &self.docs
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn query(&self, query: &DocumentQuery) -> Result<Vec<ContentFile>> {
        let limit = query.limit.unwrap_or(usize::MAX);
        let docs: Vec<ContentFile> = self
            .docs
            .iter()
            .filter(|doc| query.matches(doc))
            .take(limit)
            .cloned()
            .collect();

        tracing::debug!("Memory store matched {} documents for {:?}", docs.len(), query);
        Ok(docs)
    }
}
