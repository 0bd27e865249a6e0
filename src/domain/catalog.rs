use std::collections::BTreeSet;

use super::product::{Product, ProductId};

/// Snapshot of the synchronizer's collection handed to subscribers.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CatalogState {
    /// Products in insertion order; ids are unique.
    pub products: Vec<Product>,
    /// Ids whose local state is known to disagree with the store after a
    /// failed mutation that was not rolled back.
    pub divergent: BTreeSet<ProductId>,
    /// Bumped on every published change.
    pub revision: u64,
}

impl CatalogState {
    pub fn get(&self, id: &ProductId) -> Option<&Product> {
        self.products.iter().find(|product| &product.id == id)
    }

    pub fn is_divergent(&self, id: &ProductId) -> bool {
        self.divergent.contains(id)
    }

    pub fn len(&self) -> usize {
        self.products.len()
    }

    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }

    pub(crate) fn position(&self, id: &ProductId) -> Option<usize> {
        self.products.iter().position(|product| &product.id == id)
    }

    pub(crate) fn get_mut(&mut self, id: &ProductId) -> Option<&mut Product> {
        self.products.iter_mut().find(|product| &product.id == id)
    }
}
