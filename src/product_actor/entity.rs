use crate::actor_framework::Entity;
use crate::domain::{Product, ProductCreate, ProductId, ProductPatch};

impl Entity for Product {
    type Id = ProductId;
    type CreatePayload = ProductCreate;
    type Patch = ProductPatch;

    fn id(&self) -> &ProductId {
        &self.id
    }

    /// Builds the stored record from the id assigned by the store.
    fn from_create(id: ProductId, payload: ProductCreate) -> Result<Self, String> {
        if payload.name.trim().is_empty() {
            return Err("name must not be empty".to_string());
        }
        Ok(payload.into_product(id))
    }

    /// Applies a partial update.
    ///
    /// # Errors
    /// Rejects empty patches and blank names or images, leaving the record unchanged.
    fn on_update(&mut self, patch: ProductPatch) -> Result<(), String> {
        patch.validate().map_err(|e| e.to_string())?;
        patch.apply_to(self);
        Ok(())
    }
}
