use std::fmt::Debug;

use tokio::sync::{mpsc, oneshot, watch};
use tracing::{debug, instrument, warn};

use crate::domain::{CatalogState, Price, Product, ProductDraft, ProductId, ProductPatch};
use crate::error::{CatalogError, ValidationError};
use crate::messages::{CatalogRequest, ServiceResponse};

/// Handle for the catalog actor, cheap to clone.
///
/// Input is validated here, before anything reaches the actor, so a
/// [`ValidationError`] never comes with a state change or a store request.
#[derive(Clone)]
pub struct CatalogClient {
    sender: mpsc::Sender<CatalogRequest>,
    state: watch::Receiver<CatalogState>,
}

impl CatalogClient {
    pub(crate) fn new(sender: mpsc::Sender<CatalogRequest>, state: watch::Receiver<CatalogState>) -> Self {
        Self { sender, state }
    }

    /// Current snapshot of the collection.
    pub fn state(&self) -> CatalogState {
        self.state.borrow().clone()
    }

    /// A receiver that is notified after every change the actor publishes.
    pub fn subscribe(&self) -> watch::Receiver<CatalogState> {
        self.state.clone()
    }

    async fn request<T>(
        &self,
        build: impl FnOnce(ServiceResponse<T>) -> CatalogRequest,
    ) -> Result<T, CatalogError> {
        let (respond_to, response) = oneshot::channel();
        self.sender
            .send(build(respond_to))
            .await
            .map_err(|_| CatalogError::ActorCommunicationError("Actor closed".to_string()))?;
        response
            .await
            .map_err(|_| CatalogError::ActorCommunicationError("Actor dropped".to_string()))?
    }

    /// Validates `draft`, inserts it optimistically and creates it in the
    /// store. Returns the canonical record.
    #[instrument(fields(product_name = %draft.name), skip(self, draft))]
    pub async fn add(&self, draft: &ProductDraft) -> Result<Product, CatalogError> {
        let product = draft.validate().inspect_err(|e| warn!(error = %e, "Draft rejected"))?;
        debug!("Sending request");
        self.request(|respond_to| CatalogRequest::Add { product, respond_to })
            .await
    }

    /// Accepts a number or the text a user typed. `Ok(None)` when the id is unknown.
    #[instrument(skip(self))]
    pub async fn update_price<P>(&self, id: ProductId, price: P) -> Result<Option<Product>, CatalogError>
    where
        P: TryInto<Price, Error = ValidationError> + Debug,
    {
        let price = price
            .try_into()
            .inspect_err(|e| warn!(error = %e, "Price rejected"))?;
        debug!("Sending request");
        self.request(|respond_to| CatalogRequest::UpdatePrice { id, price, respond_to })
            .await
    }

    #[instrument(skip(self))]
    pub async fn patch(&self, id: ProductId, patch: ProductPatch) -> Result<Option<Product>, CatalogError> {
        patch
            .validate()
            .inspect_err(|e| warn!(error = %e, "Patch rejected"))?;
        debug!("Sending request");
        self.request(|respond_to| CatalogRequest::Patch { id, patch, respond_to })
            .await
    }
}

client_method!(
    /// Replaces the collection with the store's. Returns the number of products fetched.
    CatalogClient => fn load() -> usize as CatalogRequest::Load
);
client_method!(
    /// Removes a product locally, then from the store. `Ok(None)` when the id is unknown.
    CatalogClient => fn remove(id: ProductId) -> Option<Product> as CatalogRequest::Remove
);
client_method!(
    /// Flips `in_stock` locally, then sends the new value to the store. `Ok(None)` when the id is unknown.
    CatalogClient => fn toggle_stock(id: ProductId) -> Option<Product> as CatalogRequest::ToggleStock
);
