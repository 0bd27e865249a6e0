//! # Mock Framework
//!
//! Utilities for testing the catalog actor without a real store.
//!
//! Use [`create_mock_store`] to get a store and a receiver.
//! Then use helpers like [`expect_create`] or [`expect_update`] to assert
//! which store calls the actor makes and to answer them.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{mpsc, oneshot};

use crate::domain::{Product, ProductCreate, ProductId, ProductPatch};
use crate::error::StoreError;
use crate::store::ProductStore;

pub type Responder<T> = oneshot::Sender<Result<T, StoreError>>;

/// One call the actor made against the store, with the channel to answer it.
#[derive(Debug)]
pub enum StoreCall {
    List {
        respond_to: Responder<Vec<Product>>,
    },
    Create {
        product: ProductCreate,
        respond_to: Responder<Product>,
    },
    Update {
        id: ProductId,
        patch: ProductPatch,
        respond_to: Responder<Product>,
    },
    Delete {
        id: ProductId,
        respond_to: Responder<()>,
    },
}

/// A store whose every call is forwarded to the test.
///
/// # Testing Strategy
/// The test holds the receiving end and decides when, and with what, each
/// call completes. That makes in-flight states, failures and completion order
/// deterministic.
pub struct MockStore {
    sender: mpsc::UnboundedSender<StoreCall>,
}

pub fn create_mock_store() -> (Arc<MockStore>, mpsc::UnboundedReceiver<StoreCall>) {
    let (sender, receiver) = mpsc::unbounded_channel();
    (Arc::new(MockStore { sender }), receiver)
}

impl MockStore {
    async fn call<T>(&self, build: impl FnOnce(Responder<T>) -> StoreCall) -> Result<T, StoreError> {
        let (respond_to, response) = oneshot::channel();
        self.sender
            .send(build(respond_to))
            .map_err(|_| StoreError::Transport("mock receiver dropped".to_string()))?;
        response
            .await
            .map_err(|_| StoreError::Transport("mock responder dropped".to_string()))?
    }
}

#[async_trait]
impl ProductStore for MockStore {
    async fn list(&self) -> Result<Vec<Product>, StoreError> {
        self.call(|respond_to| StoreCall::List { respond_to }).await
    }

    async fn create(&self, product: ProductCreate) -> Result<Product, StoreError> {
        self.call(|respond_to| StoreCall::Create { product, respond_to })
            .await
    }

    async fn update(&self, id: ProductId, patch: ProductPatch) -> Result<Product, StoreError> {
        self.call(|respond_to| StoreCall::Update { id, patch, respond_to })
            .await
    }

    async fn delete(&self, id: ProductId) -> Result<(), StoreError> {
        self.call(|respond_to| StoreCall::Delete { id, respond_to })
            .await
    }
}

/// Helper to verify that the next call is a List
pub async fn expect_list(receiver: &mut mpsc::UnboundedReceiver<StoreCall>) -> Option<Responder<Vec<Product>>> {
    match receiver.recv().await {
        Some(StoreCall::List { respond_to }) => Some(respond_to),
        _ => None,
    }
}

/// Helper to verify that the next call is a Create
pub async fn expect_create(
    receiver: &mut mpsc::UnboundedReceiver<StoreCall>,
) -> Option<(ProductCreate, Responder<Product>)> {
    match receiver.recv().await {
        Some(StoreCall::Create { product, respond_to }) => Some((product, respond_to)),
        _ => None,
    }
}

/// Helper to verify that the next call is an Update
pub async fn expect_update(
    receiver: &mut mpsc::UnboundedReceiver<StoreCall>,
) -> Option<(ProductId, ProductPatch, Responder<Product>)> {
    match receiver.recv().await {
        Some(StoreCall::Update { id, patch, respond_to }) => Some((id, patch, respond_to)),
        _ => None,
    }
}

/// Helper to verify that the next call is a Delete
pub async fn expect_delete(
    receiver: &mut mpsc::UnboundedReceiver<StoreCall>,
) -> Option<(ProductId, Responder<()>)> {
    match receiver.recv().await {
        Some(StoreCall::Delete { id, respond_to }) => Some((id, respond_to)),
        _ => None,
    }
}

/// Asserts that no store call has been made since the last one taken.
pub fn assert_no_call(receiver: &mut mpsc::UnboundedReceiver<StoreCall>) {
    if let Ok(call) = receiver.try_recv() {
        panic!("Unexpected store call: {:?}", call);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Price;

    #[tokio::test]
    async fn test_mock_store() {
        let (store, mut calls) = create_mock_store();

        let create_task = tokio::spawn(async move {
            let product = ProductCreate {
                name: "Blush".to_string(),
                image: "u".to_string(),
                price: Price::new(9.99).unwrap(),
                in_stock: true,
            };
            store.create(product).await
        });

        let (product, responder) = expect_create(&mut calls).await.expect("Expected Create call");
        assert_eq!(product.name, "Blush");
        let record = product.into_product(ProductId::new("1"));
        responder.send(Ok(record.clone())).unwrap();

        assert_eq!(create_task.await.unwrap(), Ok(record));
    }
}
