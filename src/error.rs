use std::fmt;

use thiserror::Error;

use crate::domain::ProductId;

/// Input rejected before any state change or store request.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ValidationError {
    #[error("Missing required field: {0}")]
    MissingField(&'static str),
    #[error("Invalid price: {0:?}")]
    InvalidPrice(String),
    #[error("Patch does not change any field")]
    EmptyPatch,
    #[error("Unknown stock filter: {0:?}")]
    UnknownFilter(String),
}

/// Failures talking to the remote product store.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum StoreError {
    #[error("Store unreachable: {0}")]
    Transport(String),
    #[error("Store returned status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("Store response could not be decoded: {0}")]
    Decode(String),
    #[error("Product not found in store: {0}")]
    NotFound(String),
    #[error("Invalid store request: {0}")]
    InvalidRequest(String),
    #[error("Actor communication error: {0}")]
    ActorCommunicationError(String),
}

/// The synchronizer operation a [`SyncError`] belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOp {
    Load,
    Add,
    Remove,
    UpdatePrice,
    ToggleStock,
    Patch,
}

impl fmt::Display for SyncOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SyncOp::Load => "load",
            SyncOp::Add => "add",
            SyncOp::Remove => "remove",
            SyncOp::UpdatePrice => "update price",
            SyncOp::ToggleStock => "toggle stock",
            SyncOp::Patch => "patch",
        };
        f.write_str(name)
    }
}

/// A store request failed after the synchronizer applied (or attempted) its
/// local part. Whether the local state diverged is recorded in
/// [`CatalogState::divergent`](crate::domain::CatalogState::divergent).
#[derive(Debug, Clone, Error, PartialEq)]
#[error("Sync failed during {op}{}: {source}", describe_target(.id))]
pub struct SyncError {
    pub op: SyncOp,
    pub id: Option<ProductId>,
    pub source: StoreError,
}

fn describe_target(id: &Option<ProductId>) -> String {
    match id {
        Some(id) => format!(" of product {}", id),
        None => String::new(),
    }
}

impl SyncError {
    pub fn new(op: SyncOp, id: Option<ProductId>, source: StoreError) -> Self {
        Self { op, id, source }
    }
}

/// Everything a catalog operation can report to its caller.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum CatalogError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Sync(#[from] SyncError),
    #[error("Product has not been created in the store yet: {0}")]
    Pending(ProductId),
    #[error("Actor communication error: {0}")]
    ActorCommunicationError(String),
}

#[derive(Debug, Clone, Error, PartialEq)]
pub enum ConfigError {
    #[error("Could not read config file {path}: {message}")]
    Io { path: String, message: String },
    #[error("Invalid config file: {0}")]
    Parse(String),
    #[error("Invalid value for {key}: {message}")]
    InvalidValue { key: &'static str, message: String },
}
