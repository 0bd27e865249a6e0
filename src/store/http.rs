use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use tracing::{debug, error, instrument};
use url::Url;

use super::ProductStore;
use crate::config::CatalogConfig;
use crate::domain::{Product, ProductCreate, ProductId, ProductPatch};
use crate::error::StoreError;

/// JSON-over-HTTP product store.
///
/// Talks to a collection resource laid out as
/// `GET|POST {base}/{resource}` and `PATCH|DELETE {base}/{resource}/{id}`.
#[derive(Debug, Clone)]
pub struct HttpProductStore {
    client: Client,
    collection: Url,
}

impl HttpProductStore {
    pub fn new(client: Client, base_url: &Url, resource: &str) -> Result<Self, StoreError> {
        let mut collection = base_url.clone();
        collection
            .path_segments_mut()
            .map_err(|_| StoreError::InvalidRequest(format!("{} cannot be a base URL", base_url)))?
            .pop_if_empty()
            .push(resource);
        Ok(Self { client, collection })
    }

    pub fn from_config(config: &CatalogConfig) -> Result<Self, StoreError> {
        let base_url = config
            .base_url()
            .map_err(|e| StoreError::InvalidRequest(e.to_string()))?;

        let mut builder = Client::builder();
        if let Some(timeout) = config.request_timeout() {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| StoreError::Transport(e.to_string()))?;

        Self::new(client, &base_url, &config.resource)
    }

    pub fn collection_url(&self) -> &Url {
        &self.collection
    }

    fn item_url(&self, id: &ProductId) -> Url {
        let mut url = self.collection.clone();
        // the collection URL was built through path_segments_mut, so it can be a base
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.push(id.as_str());
        }
        url
    }
}

async fn send(request: reqwest::RequestBuilder) -> Result<Response, StoreError> {
    let response = request
        .send()
        .await
        .map_err(|e| StoreError::Transport(e.to_string()))?;

    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    error!(status = status.as_u16(), "Store rejected request");
    Err(StoreError::Status {
        status: status.as_u16(),
        body,
    })
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, StoreError> {
    let body = response
        .text()
        .await
        .map_err(|e| StoreError::Transport(e.to_string()))?;
    serde_json::from_str(&body).map_err(|e| {
        error!(error = %e, "Store answered with an unexpected body");
        StoreError::Decode(e.to_string())
    })
}

#[async_trait]
impl ProductStore for HttpProductStore {
    #[instrument(skip(self), fields(url = %self.collection))]
    async fn list(&self) -> Result<Vec<Product>, StoreError> {
        debug!("Sending request");
        let response = send(self.client.get(self.collection.clone())).await?;
        decode(response).await
    }

    #[instrument(skip(self, product), fields(product_name = %product.name))]
    async fn create(&self, product: ProductCreate) -> Result<Product, StoreError> {
        debug!("Sending request");
        let response = send(self.client.post(self.collection.clone()).json(&product)).await?;
        decode(response).await
    }

    #[instrument(skip(self, patch), fields(product_id = %id))]
    async fn update(&self, id: ProductId, patch: ProductPatch) -> Result<Product, StoreError> {
        debug!(?patch, "Sending request");
        let response = send(self.client.patch(self.item_url(&id)).json(&patch)).await?;
        decode(response).await
    }

    #[instrument(skip(self), fields(product_id = %id))]
    async fn delete(&self, id: ProductId) -> Result<(), StoreError> {
        debug!("Sending request");
        send(self.client.delete(self.item_url(&id))).await?;
        Ok(())
    }
}
