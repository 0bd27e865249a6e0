//! The remote product store contract and its implementations.

use async_trait::async_trait;

use crate::domain::{Product, ProductCreate, ProductId, ProductPatch};
use crate::error::StoreError;

pub mod http;
pub mod memory;

pub use http::HttpProductStore;
pub use memory::MemoryProductStore;

/// A resource collection of products keyed by an opaque id.
///
/// The synchronizer never assumes exclusive access: other clients may mutate
/// the same store at any time.
#[async_trait]
pub trait ProductStore: Send + Sync + 'static {
    /// Fetch every product, in store order.
    async fn list(&self) -> Result<Vec<Product>, StoreError>;

    /// Create a product; the returned record carries the store-assigned id.
    async fn create(&self, product: ProductCreate) -> Result<Product, StoreError>;

    /// Apply a partial update and return the updated record.
    async fn update(&self, id: ProductId, patch: ProductPatch) -> Result<Product, StoreError>;

    async fn delete(&self, id: ProductId) -> Result<(), StoreError>;
}
