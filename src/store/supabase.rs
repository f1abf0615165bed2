use async_trait::async_trait;
use reqwest::{header, Client, RequestBuilder, Response};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

use super::{DataStore, Filter, Row, StoreError};
use crate::config::SupabaseConfig;

/// `DataStore` backed by a Supabase project (PostgREST tables + Storage).
///
/// Cheap to clone; the inner [`reqwest::Client`] is `Arc`-based and safe to
/// share across in-flight requests.
#[derive(Clone)]
pub struct SupabaseStore {
    client: Client,
    base_url: Url,
    service_key: String,
}

impl SupabaseStore {
    pub fn new(config: &SupabaseConfig, timeout: Duration) -> Result<Self, StoreError> {
        let base_url = Url::parse(&format!("{}/", config.url.trim_end_matches('/')))
            .map_err(|e| StoreError::UnexpectedResponse(format!("invalid Supabase URL: {}", e)))?;

        let client = Client::builder()
            .connect_timeout(timeout)
            .timeout(timeout)
            .build()
            .map_err(|e| StoreError::Connection(format!("failed to build HTTP client: {}", e)))?;

        info!("Supabase store configured for {}", base_url);

        Ok(Self {
            client,
            base_url,
            service_key: config.key.clone(),
        })
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, StoreError> {
        let mut url = self.base_url.clone();
        {
            let mut path = url
                .path_segments_mut()
                .map_err(|_| StoreError::UnexpectedResponse("Supabase URL cannot be a base".to_string()))?;
            path.pop_if_empty();
            for segment in segments {
                // Blob paths carry their own slashes
                for part in segment.split('/').filter(|p| !p.is_empty()) {
                    path.push(part);
                }
            }
        }
        Ok(url)
    }

    fn table_url(&self, table: &str) -> Result<Url, StoreError> {
        self.endpoint(&["rest", "v1", table])
    }

    fn id_filter_url(&self, table: &str, id: &str) -> Result<Url, StoreError> {
        let mut url = self.table_url(table)?;
        url.query_pairs_mut().append_pair("id", &format!("eq.{}", id));
        Ok(url)
    }

    fn public_url(&self, bucket: &str, path: &str) -> Result<String, StoreError> {
        Ok(self
            .endpoint(&["storage", "v1", "object", "public", bucket, path])?
            .to_string())
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header("apikey", &self.service_key)
            .bearer_auth(&self.service_key)
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response, StoreError> {
        let response = self.authorized(request).send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<Value>(&body)
            .ok()
            .and_then(|v| {
                v.get("message")
                    .or_else(|| v.get("error"))
                    .and_then(Value::as_str)
                    .map(str::to_string)
            })
            .unwrap_or(body);

        warn!("Supabase request failed with {}: {}", status, message);
        Err(StoreError::Rejected { status: status.as_u16(), message })
    }

    async fn rows(response: Response) -> Result<Vec<Row>, StoreError> {
        let value: Value = response.json().await?;
        match value {
            Value::Array(items) => items
                .into_iter()
                .map(|item| match item {
                    Value::Object(row) => Ok(row),
                    other => Err(StoreError::UnexpectedResponse(format!("expected row object, got {}", other))),
                })
                .collect(),
            other => Err(StoreError::UnexpectedResponse(format!("expected row array, got {}", other))),
        }
    }
}

#[async_trait]
impl DataStore for SupabaseStore {
    async fn select(&self, table: &str, filter: &Filter) -> Result<Vec<Row>, StoreError> {
        let mut url = self.table_url(table)?;
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("select", "*");
            for (column, value) in filter.conditions() {
                query.append_pair(column, &format!("eq.{}", value));
            }
        }

        debug!("select {} where {:?}", table, filter.conditions());
        let response = self.send(self.client.get(url)).await?;
        Self::rows(response).await
    }

    async fn insert(&self, table: &str, row: Row) -> Result<Row, StoreError> {
        let url = self.table_url(table)?;
        let request = self
            .client
            .post(url)
            .header("Prefer", "return=representation")
            .json(&row);

        let response = self.send(request).await?;
        Self::rows(response)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| StoreError::UnexpectedResponse(format!("insert into {} returned no rows", table)))
    }

    async fn update(&self, table: &str, id: &str, patch: Row) -> Result<Option<Row>, StoreError> {
        let url = self.id_filter_url(table, id)?;
        let request = self
            .client
            .patch(url)
            .header("Prefer", "return=representation")
            .json(&patch);

        let response = self.send(request).await?;
        Ok(Self::rows(response).await?.into_iter().next())
    }

    async fn delete(&self, table: &str, id: &str) -> Result<(), StoreError> {
        let url = self.id_filter_url(table, id)?;
        self.send(self.client.delete(url)).await?;
        Ok(())
    }

    async fn upload_blob(
        &self,
        bucket: &str,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<String, StoreError> {
        let url = self.endpoint(&["storage", "v1", "object", bucket, path])?;
        let request = self
            .client
            .post(url)
            .header(header::CONTENT_TYPE, content_type)
            .body(bytes);

        self.send(request).await?;
        self.public_url(bucket, path)
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        let url = self.endpoint(&["rest", "v1"])?;
        self.send(self.client.get(url)).await?;
        Ok(())
    }
}
