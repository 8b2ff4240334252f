use std::sync::Arc;
use uuid::Uuid;

use crate::storage::{CatalogStore, WishlistStore};
use crate::{EcommerceError, Result};

pub struct WishlistService {
    store: Arc<dyn WishlistStore>,
    catalog: Arc<dyn CatalogStore>,
}

impl WishlistService {
    pub fn new(store: Arc<dyn WishlistStore>, catalog: Arc<dyn CatalogStore>) -> Self { Self { store, catalog } }

    /// Newest first.
    pub async fn product_ids(&self, user_id: Uuid) -> Result<Vec<Uuid>> {
        Ok(self.store.list_wishlist(user_id).await?.into_iter().map(|w| w.product_id).collect())
    }

    /// Returns whether the product is wishlisted afterwards.
    pub async fn toggle(&self, user_id: Uuid, product_id: Uuid) -> Result<bool> {
        self.catalog.find_product(product_id).await?.ok_or(EcommerceError::NotFound("product"))?;
        self.store.toggle_wishlist(user_id, product_id).await
    }
}
