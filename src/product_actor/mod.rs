//! Product wiring for the generic resource actor, plus the sample catalog
//! used by the local store.

pub mod entity;
mod seed;

pub use seed::*;
