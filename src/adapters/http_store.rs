use crate::domain::model::{ContentFile, DocumentQuery};
use crate::domain::ports::DocumentStore;
use crate::utils::error::{PracticeError, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use url::Url;

const COLLECTION: &str = "contentFiles";

/// Document store reached over a REST endpoint exposing the `contentFiles` collection.
///
/// `GET {endpoint}/contentFiles?module=..&level=..&relpath=..&limit=..` must answer
/// with a JSON array of records or `{"documents": [...]}`.
#[derive(Debug, Clone)]
pub struct HttpDocumentStore {
    collection_url: Url,
    token: Option<String>,
    client: Client,
}

impl HttpDocumentStore {
    pub fn new(endpoint: &str, token: Option<String>, timeout_seconds: u64) -> Result<Self> {
        let collection_url = collection_url(endpoint)?;
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_seconds))
            .build()?;

        Ok(Self {
            collection_url,
            token,
            client,
        })
    }

    fn request_url(&self, query: &DocumentQuery) -> Url {
        let mut url = self.collection_url.clone();
        {
            let mut pairs = url.query_pairs_mut();
            if let Some(relpath) = &query.relpath {
                pairs.append_pair("relpath", relpath);
            }
            if let Some(module) = &query.module {
                pairs.append_pair("module", module);
            }
            if let Some(level) = &query.level {
                pairs.append_pair("level", level);
            }
            if let Some(limit) = query.limit {
                pairs.append_pair("limit", &limit.to_string());
            }
        }
        url
    }
}

fn collection_url(endpoint: &str) -> Result<Url> {
    let joined = format!("{}/{}", endpoint.trim_end_matches('/'), COLLECTION);
    Url::parse(&joined).map_err(|e| PracticeError::InvalidConfigValueError {
        field: "store.endpoint".to_string(),
        value: endpoint.to_string(),
        reason: format!("Invalid URL format: {}", e),
    })
}

/// Records that do not fit `ContentFile` are skipped, not fatal.
fn parse_documents(body: Value) -> Vec<ContentFile> {
    let items = match body {
        Value::Array(items) => items,
        Value::Object(mut obj) => match obj.remove("documents") {
            Some(Value::Array(items)) => items,
            _ => Vec::new(),
        },
        _ => Vec::new(),
    };

    items
        .into_iter()
        .filter_map(|item| match serde_json::from_value::<ContentFile>(item) {
            Ok(doc) => Some(doc),
            Err(e) => {
                tracing::warn!("⚠️ Skipping malformed content record: {}", e);
                None
            }
        })
        .collect()
}

#[async_trait]
impl DocumentStore for HttpDocumentStore {
    async fn query(&self, query: &DocumentQuery) -> Result<Vec<ContentFile>> {
        let url = self.request_url(query);
        tracing::debug!("Making document store request to: {}", url);

        let mut request = self.client.get(url.clone());
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }
        let response = request.send().await?;

        tracing::debug!("Document store response status: {}", response.status());
        if !response.status().is_success() {
            return Err(PracticeError::StoreResponse {
                status: response.status().as_u16(),
                endpoint: url.to_string(),
            });
        }

        let body: Value = response.json().await?;
        let mut docs: Vec<ContentFile> = parse_documents(body)
            .into_iter()
            .filter(|doc| query.matches(doc))
            .collect();
        if let Some(limit) = query.limit {
            docs.truncate(limit);
        }
        Ok(docs)
    }
}
