//! Client-side state synchronizer for a cosmetics product catalog.
//!
//! A single [`actors::CatalogActor`] owns the product collection and mirrors
//! every change to a remote [`store::ProductStore`]. Callers talk to it
//! through a cloneable [`clients::CatalogClient`] and read snapshots or
//! subscribe to changes through a `watch` channel.

pub mod actor_framework;
pub mod actors;
pub mod app_system;
pub mod clients;
pub mod config;
pub mod domain;
pub mod error;
pub mod messages;
pub mod product_actor;
pub mod query;
pub mod store;

#[cfg(test)]
mod mock_framework;
