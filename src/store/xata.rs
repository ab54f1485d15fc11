//! Xata record API client

use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode, Url};
use serde::Deserialize;
use serde_json::json;

use super::{client_id, is_addressable_id, StoreError, StoreResult, UserStore};
use crate::config::XataConfig;
use crate::models::Record;

/// Body of a `POST /tables/{table}/query` response
#[derive(Debug, Deserialize)]
struct QueryResponse {
    records: Vec<Record>,
}

/// Record store backed by a Xata database branch
pub struct XataStore {
    client: Client,
    table_url: Url,
    api_key: String,
}

impl XataStore {
    pub fn new(config: &XataConfig) -> StoreResult<Self> {
        let table_url = Url::parse(&config.table_url())
            .map_err(|e| StoreError::InvalidUrl(format!("{}: {}", config.table_url(), e)))?;

        if table_url.cannot_be_a_base() {
            return Err(StoreError::InvalidUrl(config.table_url()));
        }

        let client = Client::builder().timeout(config.timeout).build()?;

        Ok(Self {
            client,
            table_url,
            api_key: config.api_key.clone(),
        })
    }

    /// `{table_url}/{segments...}` with each segment percent-encoded.
    ///
    /// The url crate drops `.` and `..` segments, so callers must reject those
    /// first (see [`XataStore::record_url`]).
    fn endpoint(&self, segments: &[&str]) -> StoreResult<Url> {
        let mut url = self.table_url.clone();
        url.path_segments_mut()
            .map_err(|_| StoreError::InvalidUrl(self.table_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// `{table_url}/data/{id}`; an id that cannot name a record is reported as missing
    fn record_url(&self, id: &str) -> StoreResult<Url> {
        if !is_addressable_id(id) {
            return Err(StoreError::NotFound(id.to_string()));
        }
        self.endpoint(&["data", id])
    }

    /// Ask the API to echo back every column of the written record
    fn with_all_columns(mut url: Url) -> Url {
        url.query_pairs_mut().append_pair("columns", "*");
        url
    }

    async fn decode<T: serde::de::DeserializeOwned>(response: Response) -> StoreResult<T> {
        let bytes = response.bytes().await?;
        serde_json::from_slice(&bytes).map_err(|e| StoreError::Decode(e.to_string()))
    }

    async fn rejected(response: Response) -> StoreError {
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        StoreError::Status { status, body }
    }
}

#[async_trait]
impl UserStore for XataStore {
    async fn list(&self) -> StoreResult<Vec<Record>> {
        let response = self
            .client
            .post(self.endpoint(&["query"])?)
            .bearer_auth(&self.api_key)
            .json(&json!({}))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::rejected(response).await);
        }

        let page: QueryResponse = Self::decode(response).await?;
        Ok(page.records)
    }

    async fn read(&self, id: &str) -> StoreResult<Option<Record>> {
        let url = match self.record_url(id) {
            Ok(url) => url,
            Err(StoreError::NotFound(_)) => return Ok(None),
            Err(e) => return Err(e),
        };

        let response = self
            .client
            .get(url)
            .bearer_auth(&self.api_key)
            .send()
            .await?;

        match response.status() {
            StatusCode::NOT_FOUND => Ok(None),
            status if status.is_success() => Ok(Some(Self::decode(response).await?)),
            _ => Err(Self::rejected(response).await),
        }
    }

    /// A client-chosen `id` goes in the path (`PUT /data/{id}?createOnly=true`),
    /// otherwise the API assigns one (`POST /data`).
    async fn create(&self, mut fields: Record) -> StoreResult<Record> {
        let request = match client_id(&mut fields) {
            Some(id) if !is_addressable_id(&id) => return Err(StoreError::InvalidId(id)),
            Some(id) => {
                let mut url = Self::with_all_columns(self.endpoint(&["data", id.as_str()])?);
                url.query_pairs_mut().append_pair("createOnly", "true");
                self.client.put(url)
            }
            None => self
                .client
                .post(Self::with_all_columns(self.endpoint(&["data"])?)),
        };

        let response = request
            .bearer_auth(&self.api_key)
            .json(&fields)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::rejected(response).await);
        }

        Self::decode(response).await
    }

    async fn update(&self, id: &str, fields: Record) -> StoreResult<Record> {
        let response = self
            .client
            .patch(Self::with_all_columns(self.record_url(id)?))
            .bearer_auth(&self.api_key)
            .json(&fields)
            .send()
            .await?;

        match response.status() {
            StatusCode::NOT_FOUND => Err(StoreError::NotFound(id.to_string())),
            status if status.is_success() => Self::decode(response).await,
            _ => Err(Self::rejected(response).await),
        }
    }

    async fn delete(&self, id: &str) -> StoreResult<()> {
        let response = self
            .client
            .delete(self.record_url(id)?)
            .bearer_auth(&self.api_key)
            .send()
            .await?;

        match response.status() {
            StatusCode::NOT_FOUND => Err(StoreError::NotFound(id.to_string())),
            status if status.is_success() => Ok(()),
            _ => Err(Self::rejected(response).await),
        }
    }
}
