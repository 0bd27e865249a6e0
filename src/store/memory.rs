use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, instrument};

use super::ProductStore;
use crate::actor_framework::{FrameworkError, ResourceActor, ResourceClient};
use crate::domain::{Product, ProductCreate, ProductId, ProductPatch};
use crate::error::StoreError;
use crate::product_actor::sample_products;

impl From<FrameworkError> for StoreError {
    fn from(error: FrameworkError) -> Self {
        match error {
            FrameworkError::NotFound(id) => StoreError::NotFound(id),
            FrameworkError::Rejected(message) => StoreError::InvalidRequest(message),
            FrameworkError::ActorClosed | FrameworkError::ActorDropped => {
                StoreError::ActorCommunicationError(error.to_string())
            }
        }
    }
}

/// Product store living in this process, backed by a [`ResourceActor`].
///
/// Ids are sequential numbers rendered as strings, continuing after the
/// highest numeric id it was started with.
#[derive(Clone)]
pub struct MemoryProductStore {
    inner: ResourceClient<Product>,
}

impl MemoryProductStore {
    /// Spawns an empty store. Must be called inside a tokio runtime.
    pub fn spawn() -> Self {
        Self::with_products(Vec::new())
    }

    /// Spawns a store holding the sample catalog.
    pub fn seeded() -> Self {
        Self::with_products(sample_products())
    }

    pub fn with_products(products: Vec<Product>) -> Self {
        let first_free = products
            .iter()
            .filter_map(|product| product.id.as_str().parse::<u64>().ok())
            .max()
            .unwrap_or(0)
            + 1;
        let id_counter = Arc::new(AtomicU64::new(first_free));
        let next_product_id = move || {
            let id = id_counter.fetch_add(1, Ordering::SeqCst);
            ProductId::new(id.to_string())
        };

        let (actor, inner) = ResourceActor::with_items(32, products, next_product_id);
        tokio::spawn(actor.run());
        Self { inner }
    }
}

#[async_trait]
impl ProductStore for MemoryProductStore {
    #[instrument(skip(self))]
    async fn list(&self) -> Result<Vec<Product>, StoreError> {
        debug!("Sending request");
        Ok(self.inner.list().await?)
    }

    #[instrument(skip(self, product), fields(product_name = %product.name))]
    async fn create(&self, product: ProductCreate) -> Result<Product, StoreError> {
        debug!("Sending request");
        Ok(self.inner.create(product).await?)
    }

    #[instrument(skip(self))]
    async fn update(&self, id: ProductId, patch: ProductPatch) -> Result<Product, StoreError> {
        debug!("Sending request");
        Ok(self.inner.update(id, patch).await?)
    }

    #[instrument(skip(self))]
    async fn delete(&self, id: ProductId) -> Result<(), StoreError> {
        debug!("Sending request");
        self.inner.delete(id).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Price, ProductDraft};

    #[tokio::test]
    async fn seeded_store_lists_sample_catalog_in_order() {
        let store = MemoryProductStore::seeded();
        let products = store.list().await.unwrap();

        let names: Vec<&str> = products.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(
            names,
            vec!["beauty blender", "eye lashes", "make-up brushes", "Mascara", "Matte-lipstick", "setting powder"]
        );
        assert!(!products[1].in_stock);
        assert_eq!(products[5].price.to_string(), "30.00");
    }

    #[tokio::test]
    async fn create_continues_after_highest_seeded_id() {
        let store = MemoryProductStore::seeded();
        let created = store
            .create(ProductDraft::new("Blush", "u", "9.99").validate().unwrap())
            .await
            .unwrap();
        assert_eq!(created.id, ProductId::new("7"));
        assert_eq!(store.list().await.unwrap().last(), Some(&created));
    }

    #[tokio::test]
    async fn update_and_delete_of_missing_product_fail() {
        let store = MemoryProductStore::spawn();
        let patch = ProductPatch::price(Price::new(1.0).unwrap());

        assert_eq!(
            store.update(ProductId::new("42"), patch).await,
            Err(StoreError::NotFound("42".to_string()))
        );
        assert_eq!(
            store.delete(ProductId::new("42")).await,
            Err(StoreError::NotFound("42".to_string()))
        );
    }

    #[tokio::test]
    async fn update_applies_only_patched_fields() {
        let store = MemoryProductStore::seeded();
        let updated = store
            .update(ProductId::new("4"), ProductPatch::in_stock(false))
            .await
            .unwrap();
        assert_eq!(updated.name, "Mascara");
        assert_eq!(updated.price.value(), 10.37);
        assert!(!updated.in_stock);
    }
}
