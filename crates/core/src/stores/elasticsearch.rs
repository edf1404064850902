use crate::traits::DocumentStore;
use crate::{ChunkDocument, StoreError};
use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, StatusCode};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{debug, info};
use url::Url;

const BACKEND: &str = "elasticsearch";

#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub url: String,
    pub username: Option<String>,
    pub password: Option<String>,
    pub index_name: String,
}

pub struct ElasticsearchStore {
    client: Arc<Client>,
    endpoint: Url,
    index_name: String,
    username: Option<String>,
    password: Option<String>,
}

impl ElasticsearchStore {
    pub fn new(config: StoreConfig) -> Result<Self, StoreError> {
        let mut endpoint = Url::parse(&config.url)?;
        if !endpoint.path().ends_with('/') {
            let path = format!("{}/", endpoint.path());
            endpoint.set_path(&path);
        }

        if config.index_name.is_empty() {
            return Err(StoreError::Request("index name is empty".to_string()));
        }

        Ok(Self {
            client: Arc::new(Client::builder().build()?),
            endpoint,
            index_name: config.index_name,
            username: config.username.filter(|user| !user.is_empty()),
            password: config.password,
        })
    }

    pub fn index_name(&self) -> &str {
        &self.index_name
    }

    fn index_url(&self) -> Result<Url, StoreError> {
        Ok(self.endpoint.join(&self.index_name)?)
    }

    fn document_url(&self, id: &str) -> Result<Url, StoreError> {
        Ok(self
            .endpoint
            .join(&format!("{}/_doc/{}", self.index_name, id))?)
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        let request = self.client.request(method, url);
        match &self.username {
            Some(username) => request.basic_auth(username, self.password.as_ref()),
            None => request,
        }
    }
}

#[async_trait]
impl DocumentStore for ElasticsearchStore {
    async fn ensure_index(&self) -> Result<(), StoreError> {
        let response = self
            .request(Method::PUT, self.index_url()?)
            .json(&json!({
                "mappings": {
                    "properties": {
                        "content": {"type": "text"},
                        "num": {"type": "integer"},
                        "path": {"type": "keyword"},
                        "name": {"type": "keyword"},
                        "type": {"type": "keyword"}
                    }
                }
            }))
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        let created = index_creation_outcome(status, &body)?;
        if created {
            info!(index = %self.index_name, "index created");
        } else {
            debug!(index = %self.index_name, "index already exists");
        }
        Ok(())
    }

    async fn exists(&self, id: &str) -> Result<bool, StoreError> {
        let response = self
            .request(Method::GET, self.document_url(id)?)
            .send()
            .await?;

        if !response.status().is_success() {
            return Ok(false);
        }

        let body: Value = response.json().await?;
        Ok(is_found(&body))
    }

    async fn upsert(&self, id: &str, document: &ChunkDocument) -> Result<(), StoreError> {
        let payload = serde_json::to_vec(document)?;
        let mut url = self.document_url(id)?;
        url.query_pairs_mut().append_pair("wait_for_active_shards", "1");

        let response = self
            .request(Method::PUT, url)
            .header("Content-Type", "application/json")
            .body(payload)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        Err(write_failure(status, &body, id))
    }
}

/// `Ok(true)` when the index was created, `Ok(false)` when it already existed.
fn index_creation_outcome(status: StatusCode, body: &str) -> Result<bool, StoreError> {
    if status.is_success() {
        return Ok(true);
    }
    if status == StatusCode::BAD_REQUEST && body.contains("resource_already_exists_exception") {
        return Ok(false);
    }
    Err(StoreError::BackendResponse {
        backend: BACKEND.to_string(),
        status: status.as_u16(),
        details: body.to_string(),
    })
}

fn write_failure(status: StatusCode, body: &str, id: &str) -> StoreError {
    if status == StatusCode::TOO_MANY_REQUESTS {
        StoreError::Overloaded {
            backend: BACKEND.to_string(),
            details: format!("{status} while indexing document ID={id}"),
        }
    } else {
        StoreError::BackendResponse {
            backend: BACKEND.to_string(),
            status: status.as_u16(),
            details: format!("error indexing document ID={id}: {body}"),
        }
    }
}

fn is_found(body: &Value) -> bool {
    body.get("found").and_then(Value::as_bool).unwrap_or(false)
}
