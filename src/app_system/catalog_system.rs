use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::{error, info};

use crate::actors::CatalogActor;
use crate::clients::CatalogClient;
use crate::config::CatalogConfig;
use crate::error::StoreError;
use crate::store::{HttpProductStore, MemoryProductStore, ProductStore};

/// Starts the catalog actor against a store and handles its shutdown.
pub struct CatalogSystem {
    pub client: CatalogClient,
    handle: JoinHandle<()>,
}

impl CatalogSystem {
    pub fn new(config: &CatalogConfig, store: Arc<dyn ProductStore>) -> Self {
        let (actor, client) = CatalogActor::new(config.mailbox_capacity, store, config.load_failure);
        let handle = tokio::spawn(actor.run());
        info!(load_failure = ?config.load_failure, "Catalog system started");
        Self { client, handle }
    }

    /// Backed by the remote store named in `config`.
    pub fn http(config: &CatalogConfig) -> Result<Self, StoreError> {
        let store = HttpProductStore::from_config(config)?;
        info!(url = %store.collection_url(), "Using remote product store");
        Ok(Self::new(config, Arc::new(store)))
    }

    /// Backed by an in-process store holding the sample catalog.
    pub fn local(config: &CatalogConfig) -> Self {
        info!("Using local sample store");
        Self::new(config, Arc::new(MemoryProductStore::seeded()))
    }

    /// Drops this system's client and waits for the actor to finish the
    /// requests still in flight. Clones of the client handed out elsewhere
    /// must be dropped first, or this waits for them.
    pub async fn shutdown(self) -> Result<(), String> {
        info!("Shutting down catalog system...");
        drop(self.client);

        if let Err(e) = self.handle.await {
            error!("Catalog actor failed: {:?}", e);
            return Err(format!("Catalog actor failed: {:?}", e));
        }

        info!("Catalog system shutdown complete.");
        Ok(())
    }
}
