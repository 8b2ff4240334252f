use std::sync::Arc;
use uuid::Uuid;

use crate::domain::aggregates::Review;
use crate::storage::{CatalogStore, ReviewStore};
use crate::{EcommerceError, Result};

pub struct ReviewService {
    reviews: Arc<dyn ReviewStore>,
    catalog: Arc<dyn CatalogStore>,
}

impl ReviewService {
    pub fn new(reviews: Arc<dyn ReviewStore>, catalog: Arc<dyn CatalogStore>) -> Self { Self { reviews, catalog } }

    /// Only buyers holding a delivered, paid order for the product may review it, once.
    pub async fn submit(&self, user_id: Uuid, product_id: Uuid, rating: i64, comment: Option<String>) -> Result<Review> {
        self.catalog.find_product(product_id).await?.ok_or(EcommerceError::NotFound("product"))?;
        let context = self.reviews.review_context(user_id, product_id).await?;
        let review = Review::submit(user_id, product_id, rating, comment, context)?;
        self.reviews.insert_review(&review).await?;
        Ok(review)
    }

    pub async fn list(&self, product_id: Uuid) -> Result<Vec<Review>> { self.reviews.list_reviews(product_id).await }
}
