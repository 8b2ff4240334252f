//! Product and category administration plus storefront browsing.

use std::sync::Arc;
use uuid::Uuid;

use crate::domain::aggregates::{Category, Product, ProductDraft};
use crate::storage::{CatalogStore, Page, ProductQuery};
use crate::{EcommerceError, Result};

pub struct CatalogService {
    store: Arc<dyn CatalogStore>,
}

impl CatalogService {
    pub fn new(store: Arc<dyn CatalogStore>) -> Self { Self { store } }

    pub async fn list_products(&self, query: &ProductQuery) -> Result<Page<Product>> {
        self.store.list_products(query).await
    }

    /// Inactive products are only visible to admins.
    pub async fn get_product(&self, id: Uuid, include_inactive: bool) -> Result<Product> {
        self.store.find_product(id).await?
            .filter(|p| p.active || include_inactive)
            .ok_or(EcommerceError::NotFound("product"))
    }

    pub async fn create_product(&self, draft: ProductDraft) -> Result<Product> {
        self.ensure_category(draft.category_id).await?;
        let product = Product::create(draft)?;
        self.store.insert_product(&product).await?;
        tracing::info!(product_id = %product.id, sku = %product.sku, "product created");
        Ok(product)
    }

    pub async fn update_product(&self, id: Uuid, draft: ProductDraft) -> Result<Product> {
        let mut product = self.store.find_product(id).await?.ok_or(EcommerceError::NotFound("product"))?;
        if draft.category_id != product.category_id {
            self.ensure_category(draft.category_id).await?;
        }
        product.apply(draft)?;
        self.store.update_product(&product).await?;
        Ok(product)
    }

    pub async fn delete_product(&self, id: Uuid) -> Result<()> {
        if !self.store.delete_product(id).await? {
            return Err(EcommerceError::NotFound("product"));
        }
        tracing::info!(product_id = %id, "product deleted");
        Ok(())
    }

    pub async fn list_categories(&self) -> Result<Vec<Category>> { self.store.list_categories().await }

    pub async fn create_category(&self, name: &str) -> Result<Category> {
        let category = Category::create(name)?;
        self.store.insert_category(&category).await?;
        Ok(category)
    }

    pub async fn delete_category(&self, id: Uuid) -> Result<()> {
        if !self.store.delete_category(id).await? {
            return Err(EcommerceError::NotFound("category"));
        }
        Ok(())
    }

    async fn ensure_category(&self, id: Uuid) -> Result<()> {
        self.store.find_category(id).await?.map(|_| ()).ok_or(EcommerceError::NotFound("category"))
    }
}
