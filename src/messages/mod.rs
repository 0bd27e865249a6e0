use tokio::sync::oneshot;

use crate::domain::{Price, Product, ProductCreate, ProductId, ProductPatch};
use crate::error::{CatalogError, StoreError, SyncOp};

/// Generic type aliases for service communication
pub type ServiceResult<T> = std::result::Result<T, CatalogError>;
pub type ServiceResponse<T> = oneshot::Sender<ServiceResult<T>>;

/// Intents sent to the catalog actor. Each variant carries its parameters
/// and a oneshot channel that is answered once the store call completes.
#[derive(Debug)]
pub enum CatalogRequest {
    Load {
        respond_to: ServiceResponse<usize>,
    },
    Add {
        product: ProductCreate,
        respond_to: ServiceResponse<Product>,
    },
    Remove {
        id: ProductId,
        respond_to: ServiceResponse<Option<Product>>,
    },
    UpdatePrice {
        id: ProductId,
        price: Price,
        respond_to: ServiceResponse<Option<Product>>,
    },
    ToggleStock {
        id: ProductId,
        respond_to: ServiceResponse<Option<Product>>,
    },
    Patch {
        id: ProductId,
        patch: ProductPatch,
        respond_to: ServiceResponse<Option<Product>>,
    },
}

/// Store outcomes routed back into the actor so that every write to the
/// collection happens on the actor task.
#[derive(Debug)]
pub enum Completion {
    Loaded {
        result: Result<Vec<Product>, StoreError>,
        respond_to: ServiceResponse<usize>,
    },
    Created {
        placeholder: ProductId,
        result: Result<Product, StoreError>,
        respond_to: ServiceResponse<Product>,
    },
    Deleted {
        removed: Product,
        result: Result<(), StoreError>,
        /// `None` when the delete was issued on the actor's own behalf.
        respond_to: Option<ServiceResponse<Option<Product>>>,
    },
    Updated {
        id: ProductId,
        op: SyncOp,
        patch: ProductPatch,
        result: Result<Product, StoreError>,
        respond_to: ServiceResponse<Option<Product>>,
    },
}
