use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::sync::Arc;

use tokio::sync::{mpsc, watch};
use tracing::{debug, error, info, instrument, warn, Instrument};

use crate::clients::CatalogClient;
use crate::config::LoadFailurePolicy;
use crate::domain::{CatalogState, Product, ProductCreate, ProductId, ProductPatch};
use crate::error::{CatalogError, StoreError, SyncError, SyncOp};
use crate::messages::{CatalogRequest, Completion, ServiceResponse, ServiceResult};
use crate::store::ProductStore;

// =============================================================================
// CATALOG ACTOR
// =============================================================================

/// Where a locally created product stands with the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Placeholder {
    /// Create request in flight.
    Pending,
    /// Removed locally while the create was in flight. The canonical record
    /// is deleted as soon as the store returns it.
    Cancelled,
    /// Create request failed; the product only exists locally.
    Failed,
}

/// Owns the authoritative product collection.
///
/// Every write to the collection happens on this task. Store requests run as
/// spawned tasks that report back through the completion channel, so the
/// actor keeps serving intents while requests are in flight and later intents
/// observe the intermediate state.
pub struct CatalogActor {
    receiver: mpsc::Receiver<CatalogRequest>,
    completions: mpsc::UnboundedReceiver<Completion>,
    completion_tx: mpsc::UnboundedSender<Completion>,
    store: Arc<dyn ProductStore>,
    state: CatalogState,
    state_tx: watch::Sender<CatalogState>,
    load_failure: LoadFailurePolicy,
    placeholders: HashMap<ProductId, Placeholder>,
    next_placeholder: u64,
    in_flight: usize,
}

impl CatalogActor {
    pub fn new(
        buffer_size: usize,
        store: Arc<dyn ProductStore>,
        load_failure: LoadFailurePolicy,
    ) -> (Self, CatalogClient) {
        let (sender, receiver) = mpsc::channel(buffer_size);
        let (completion_tx, completions) = mpsc::unbounded_channel();
        let (state_tx, state_rx) = watch::channel(CatalogState::default());
        let actor = Self {
            receiver,
            completions,
            completion_tx,
            store,
            state: CatalogState::default(),
            state_tx,
            load_failure,
            placeholders: HashMap::new(),
            next_placeholder: 0,
            in_flight: 0,
        };
        (actor, CatalogClient::new(sender, state_rx))
    }

    /// Serves intents until every client is dropped, then drains the store
    /// requests still in flight.
    #[instrument(name = "catalog_actor", skip(self))]
    pub async fn run(mut self) {
        info!("CatalogActor starting");
        let mut accepting = true;
        while accepting || self.in_flight > 0 {
            tokio::select! {
                biased;
                Some(done) = self.completions.recv() => self.handle_completion(done),
                msg = self.receiver.recv(), if accepting => match msg {
                    Some(msg) => self.handle_request(msg),
                    None => {
                        debug!(in_flight = self.in_flight, "Mailbox closed, draining");
                        accepting = false;
                    }
                },
                else => break,
            }
        }
        info!("CatalogActor stopped");
    }

    fn handle_request(&mut self, msg: CatalogRequest) {
        match msg {
            CatalogRequest::Load { respond_to } => self.handle_load(respond_to),
            CatalogRequest::Add { product, respond_to } => self.handle_add(product, respond_to),
            CatalogRequest::Remove { id, respond_to } => self.handle_remove(id, respond_to),
            CatalogRequest::UpdatePrice { id, price, respond_to } => {
                self.handle_update(id, SyncOp::UpdatePrice, ProductPatch::price(price), respond_to)
            }
            CatalogRequest::ToggleStock { id, respond_to } => self.handle_toggle_stock(id, respond_to),
            CatalogRequest::Patch { id, patch, respond_to } => {
                self.handle_update(id, SyncOp::Patch, patch, respond_to)
            }
        }
    }

    fn handle_completion(&mut self, done: Completion) {
        self.in_flight = self.in_flight.saturating_sub(1);
        match done {
            Completion::Loaded { result, respond_to } => self.on_loaded(result, respond_to),
            Completion::Created { placeholder, result, respond_to } => {
                self.on_created(placeholder, result, respond_to)
            }
            Completion::Deleted { removed, result, respond_to } => {
                self.on_deleted(removed, result, respond_to)
            }
            Completion::Updated { id, op, patch, result, respond_to } => {
                self.on_updated(id, op, patch, result, respond_to)
            }
        }
    }

    /// Runs `call` off the actor task; its output comes back as a completion.
    fn spawn_store_call<F>(&mut self, call: F)
    where
        F: Future<Output = Completion> + Send + 'static,
    {
        self.in_flight += 1;
        let completion_tx = self.completion_tx.clone();
        tokio::spawn(
            async move {
                let _ = completion_tx.send(call.await);
            }
            .in_current_span(),
        );
    }

    fn publish(&mut self) {
        self.state.revision += 1;
        self.state_tx.send_replace(self.state.clone());
    }

    fn next_placeholder_id(&mut self) -> ProductId {
        loop {
            self.next_placeholder += 1;
            let id = ProductId::placeholder(self.next_placeholder);
            if self.state.position(&id).is_none() && !self.placeholders.contains_key(&id) {
                return id;
            }
        }
    }

    /// Index of a product that can be sent to the store as-is; `None` when
    /// the id is unknown.
    fn editable_index(&self, id: &ProductId) -> Result<Option<usize>, CatalogError> {
        let Some(index) = self.state.position(id) else {
            warn!("Product not found; nothing to update");
            return Ok(None);
        };
        if self.placeholders.contains_key(id) {
            warn!("Product has no store id yet");
            return Err(CatalogError::Pending(id.clone()));
        }
        Ok(Some(index))
    }

    // -------------------------------------------------------------------------
    // load
    // -------------------------------------------------------------------------

    #[instrument(skip(self, respond_to))]
    fn handle_load(&mut self, respond_to: ServiceResponse<usize>) {
        debug!("Processing load request");
        let store = Arc::clone(&self.store);
        self.spawn_store_call(async move {
            Completion::Loaded {
                result: store.list().await,
                respond_to,
            }
        });
    }

    #[instrument(skip_all)]
    fn on_loaded(&mut self, result: Result<Vec<Product>, StoreError>, respond_to: ServiceResponse<usize>) {
        match result {
            Ok(fetched) => {
                self.drop_failed_placeholders();
                let mut seen = HashSet::new();
                let mut products = Vec::with_capacity(fetched.len());
                for product in fetched {
                    if seen.insert(product.id.clone()) {
                        products.push(product);
                    } else {
                        warn!(product_id = %product.id, "Store listed a duplicate id; keeping the first");
                    }
                }
                let count = products.len();

                // creates still in flight stay visible until their completion re-keys them
                let placeholders = &self.placeholders;
                products.extend(self.state.products.drain(..).filter(|product| {
                    placeholders.get(&product.id) == Some(&Placeholder::Pending)
                        && !seen.contains(&product.id)
                }));

                self.state.products = products;
                self.state.divergent.clear();
                self.publish();
                info!(count, "Catalog loaded");
                let _ = respond_to.send(Ok(count));
            }
            Err(e) => {
                error!(error = %e, policy = ?self.load_failure, "Load failed");
                if self.load_failure == LoadFailurePolicy::Clear {
                    self.state.products.clear();
                    self.drop_failed_placeholders();
                }
                self.publish();
                let _ = respond_to.send(Err(SyncError::new(SyncOp::Load, None, e).into()));
            }
        }
    }

    /// Failed creates exist nowhere but locally, so they do not outlive the
    /// local entry.
    fn drop_failed_placeholders(&mut self) {
        let failed: Vec<ProductId> = self
            .placeholders
            .iter()
            .filter(|(_, state)| **state == Placeholder::Failed)
            .map(|(id, _)| id.clone())
            .collect();
        for id in failed {
            self.placeholders.remove(&id);
            self.state.divergent.remove(&id);
        }
    }

    // -------------------------------------------------------------------------
    // add
    // -------------------------------------------------------------------------

    #[instrument(fields(product_name = %product.name), skip(self, product, respond_to))]
    fn handle_add(&mut self, product: ProductCreate, respond_to: ServiceResponse<Product>) {
        debug!("Processing add request");
        let placeholder = self.next_placeholder_id();
        self.state
            .products
            .push(product.clone().into_product(placeholder.clone()));
        self.placeholders.insert(placeholder.clone(), Placeholder::Pending);
        self.publish();
        info!(product_id = %placeholder, "Product added locally");

        let store = Arc::clone(&self.store);
        self.spawn_store_call(async move {
            Completion::Created {
                result: store.create(product).await,
                placeholder,
                respond_to,
            }
        });
    }

    #[instrument(fields(product_id = %placeholder), skip(self, result, respond_to))]
    fn on_created(
        &mut self,
        placeholder: ProductId,
        result: Result<Product, StoreError>,
        respond_to: ServiceResponse<Product>,
    ) {
        let cancelled = self.placeholders.remove(&placeholder) == Some(Placeholder::Cancelled);

        match result {
            Ok(record) if cancelled => {
                info!(canonical_id = %record.id, "Product was removed while being created; deleting it");
                let store = Arc::clone(&self.store);
                let removed = record.clone();
                self.spawn_store_call(async move {
                    Completion::Deleted {
                        result: store.delete(removed.id.clone()).await,
                        removed,
                        respond_to: None,
                    }
                });
                let _ = respond_to.send(Ok(record));
            }
            Ok(record) => {
                self.reconcile_created(&placeholder, record.clone());
                self.publish();
                info!(canonical_id = %record.id, "Product created in store");
                let _ = respond_to.send(Ok(record));
            }
            Err(e) => {
                if !cancelled && self.state.position(&placeholder).is_some() {
                    // the optimistic insert stays; it now only exists locally
                    warn!(error = %e, "Create failed; local catalog diverges from store");
                    self.placeholders.insert(placeholder.clone(), Placeholder::Failed);
                    self.state.divergent.insert(placeholder.clone());
                    self.publish();
                } else {
                    debug!(error = %e, "Create failed for a product no longer held locally");
                }
                let _ = respond_to.send(Err(SyncError::new(SyncOp::Add, Some(placeholder), e).into()));
            }
        }
    }

    /// Re-keys the optimistic entry to the canonical record, in place and
    /// without duplicating an id a load may already have brought in.
    fn reconcile_created(&mut self, placeholder: &ProductId, record: Product) {
        let local = self.state.position(placeholder);
        let canonical = self.state.position(&record.id);
        match (local, canonical) {
            (Some(index), None) => self.state.products[index] = record,
            (Some(index), Some(existing)) if index == existing => self.state.products[index] = record,
            (Some(index), Some(_)) => {
                self.state.products.remove(index);
            }
            (None, None) => self.state.products.push(record),
            (None, Some(_)) => {}
        }
        self.state.divergent.remove(placeholder);
    }

    // -------------------------------------------------------------------------
    // remove
    // -------------------------------------------------------------------------

    #[instrument(fields(product_id = %id), skip(self, respond_to))]
    fn handle_remove(&mut self, id: ProductId, respond_to: ServiceResponse<Option<Product>>) {
        debug!("Processing remove request");
        let Some(index) = self.state.position(&id) else {
            warn!("Product not found; nothing to remove");
            let _ = respond_to.send(Ok(None));
            return;
        };

        let removed = self.state.products.remove(index);
        info!(product_name = %removed.name, "Product removed locally");

        match self.placeholders.get(&id).copied() {
            Some(Placeholder::Pending) => {
                self.placeholders.insert(id, Placeholder::Cancelled);
                self.publish();
                let _ = respond_to.send(Ok(Some(removed)));
            }
            Some(Placeholder::Failed) => {
                self.placeholders.remove(&id);
                self.state.divergent.remove(&id);
                self.publish();
                let _ = respond_to.send(Ok(Some(removed)));
            }
            Some(Placeholder::Cancelled) | None => {
                self.publish();
                let store = Arc::clone(&self.store);
                self.spawn_store_call(async move {
                    Completion::Deleted {
                        result: store.delete(removed.id.clone()).await,
                        removed,
                        respond_to: Some(respond_to),
                    }
                });
            }
        }
    }

    #[instrument(fields(product_id = %removed.id), skip(self, removed, result, respond_to))]
    fn on_deleted(
        &mut self,
        removed: Product,
        result: Result<(), StoreError>,
        respond_to: Option<ServiceResponse<Option<Product>>>,
    ) {
        let outcome: ServiceResult<Option<Product>> = match result {
            Ok(()) => {
                info!("Product deleted from store");
                self.state.divergent.remove(&removed.id);
                Ok(Some(removed))
            }
            Err(e) if is_missing(&e) => {
                debug!("Store no longer held the product");
                self.state.divergent.remove(&removed.id);
                Ok(Some(removed))
            }
            Err(e) => {
                // the local removal stays; the store may still hold the product
                warn!(error = %e, "Delete failed; local catalog diverges from store");
                self.state.divergent.insert(removed.id.clone());
                Err(SyncError::new(SyncOp::Remove, Some(removed.id), e).into())
            }
        };
        self.publish();
        if let Some(respond_to) = respond_to {
            let _ = respond_to.send(outcome);
        }
    }

    // -------------------------------------------------------------------------
    // update price / patch / toggle stock
    // -------------------------------------------------------------------------

    /// Non-optimistic: the collection only changes once the store acknowledges.
    #[instrument(fields(product_id = %id, op = %op), skip(self, patch, respond_to))]
    fn handle_update(
        &mut self,
        id: ProductId,
        op: SyncOp,
        patch: ProductPatch,
        respond_to: ServiceResponse<Option<Product>>,
    ) {
        debug!(?patch, "Processing update request");
        match self.editable_index(&id) {
            Ok(Some(_)) => {}
            Ok(None) => {
                let _ = respond_to.send(Ok(None));
                return;
            }
            Err(e) => {
                let _ = respond_to.send(Err(e));
                return;
            }
        }

        let store = Arc::clone(&self.store);
        self.spawn_store_call(async move {
            let result = store.update(id.clone(), patch.clone()).await;
            Completion::Updated {
                id,
                op,
                patch,
                result,
                respond_to,
            }
        });
    }

    #[instrument(fields(product_id = %id), skip(self, respond_to))]
    fn handle_toggle_stock(&mut self, id: ProductId, respond_to: ServiceResponse<Option<Product>>) {
        debug!("Processing toggle_stock request");
        let index = match self.editable_index(&id) {
            Ok(Some(index)) => index,
            Ok(None) => {
                let _ = respond_to.send(Ok(None));
                return;
            }
            Err(e) => {
                let _ = respond_to.send(Err(e));
                return;
            }
        };

        let product = &mut self.state.products[index];
        product.in_stock = !product.in_stock;
        let in_stock = product.in_stock;
        self.publish();
        info!(in_stock, "Stock toggled locally");

        let patch = ProductPatch::in_stock(in_stock);
        let store = Arc::clone(&self.store);
        self.spawn_store_call(async move {
            let result = store.update(id.clone(), patch.clone()).await;
            Completion::Updated {
                id,
                op: SyncOp::ToggleStock,
                patch,
                result,
                respond_to,
            }
        });
    }

    #[instrument(fields(product_id = %id, op = %op), skip(self, patch, result, respond_to))]
    fn on_updated(
        &mut self,
        id: ProductId,
        op: SyncOp,
        patch: ProductPatch,
        result: Result<Product, StoreError>,
        respond_to: ServiceResponse<Option<Product>>,
    ) {
        let optimistic = op == SyncOp::ToggleStock;
        let outcome: ServiceResult<Option<Product>> = match result {
            Ok(acknowledged) => {
                // stock is the only field ever written ahead of the store
                if patch.in_stock.is_some() {
                    self.state.divergent.remove(&id);
                }
                match self.state.get_mut(&id) {
                    Some(product) => {
                        if !optimistic {
                            patch.copy_patched_fields(&acknowledged, product);
                        }
                        info!("Update acknowledged by store");
                        Ok(Some(product.clone()))
                    }
                    None => {
                        warn!("Product was removed before the update was acknowledged");
                        Ok(Some(acknowledged))
                    }
                }
            }
            Err(e) if optimistic && self.state.position(&id).is_some() => {
                // the local flip stays in place
                warn!(error = %e, "Stock toggle failed; local catalog diverges from store");
                self.state.divergent.insert(id.clone());
                Err(SyncError::new(op, Some(id), e).into())
            }
            Err(e) => {
                error!(error = %e, "Update failed; local product unchanged");
                Err(SyncError::new(op, Some(id), e).into())
            }
        };
        self.publish();
        let _ = respond_to.send(outcome);
    }
}

/// A delete that finds nothing left to delete still leaves both sides agreeing.
fn is_missing(error: &StoreError) -> bool {
    matches!(
        error,
        StoreError::NotFound(_) | StoreError::Status { status: 404, .. }
    )
}
