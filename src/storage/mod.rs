//! Persistence seams. Every trait is implemented by [`PgStore`] and by [`MemoryStore`].

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use serde::Serialize;
use uuid::Uuid;

use crate::domain::aggregates::{
    CartItem, CartLine, Category, Order, OrderStatus, Payment, Product, Promotion, Review, ReviewContext, User,
    WishlistItem,
};
use crate::Result;

pub use memory::MemoryStore;
pub use postgres::PgStore;

pub const MAX_PER_PAGE: u32 = 100;

#[derive(Debug, Clone, Default)]
pub struct ProductQuery {
    pub category_slug: Option<String>,
    pub search: Option<String>,
    pub include_inactive: bool,
    pub page: u32,
    pub per_page: u32,
}

impl ProductQuery {
    pub fn limit(&self) -> i64 { i64::from(self.per_page.clamp(1, MAX_PER_PAGE)) }
    pub fn offset(&self) -> i64 { i64::from(self.page.max(1) - 1) * self.limit() }
}

#[derive(Debug, Serialize)]
pub struct Page<T> {
    pub data: Vec<T>,
    pub total: i64,
    pub page: u32,
}

#[derive(Debug, Clone, Default)]
pub struct OrderFilter {
    pub user_id: Option<Uuid>,
    pub status: Option<OrderStatus>,
}

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn insert_user(&self, user: &User) -> Result<()>;
    async fn find_user(&self, id: Uuid) -> Result<Option<User>>;
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>>;
}

#[async_trait]
pub trait CatalogStore: Send + Sync {
    async fn list_products(&self, query: &ProductQuery) -> Result<Page<Product>>;
    async fn find_product(&self, id: Uuid) -> Result<Option<Product>>;
    async fn insert_product(&self, product: &Product) -> Result<()>;
    async fn update_product(&self, product: &Product) -> Result<()>;
    /// Fails with a conflict while orders reference the product.
    async fn delete_product(&self, id: Uuid) -> Result<bool>;
    async fn list_categories(&self) -> Result<Vec<Category>>;
    async fn find_category(&self, id: Uuid) -> Result<Option<Category>>;
    async fn insert_category(&self, category: &Category) -> Result<()>;
    /// Fails with a conflict while products reference the category.
    async fn delete_category(&self, id: Uuid) -> Result<bool>;
}

#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Writes the order, its items and every stock decrement in one transaction.
    async fn create_order(&self, order: &Order) -> Result<()>;
    async fn find_order(&self, id: Uuid) -> Result<Option<Order>>;
    async fn find_order_by_number(&self, order_number: &str) -> Result<Option<Order>>;
    async fn list_orders(&self, filter: &OrderFilter) -> Result<Vec<Order>>;
    async fn update_order(&self, order: &Order) -> Result<()>;
    /// Writes `order.payment_status`, moves the order to `status` when given, and upserts the payment
    /// on `(order_id, transaction_id)`, atomically. Returns the order status as stored afterwards.
    async fn reconcile_payment(&self, order: &Order, status: Option<OrderStatus>, payment: &Payment) -> Result<OrderStatus>;
}

#[async_trait]
pub trait PromotionStore: Send + Sync {
    async fn list_promotions(&self) -> Result<Vec<Promotion>>;
    async fn find_promotion_by_code(&self, code: &str) -> Result<Option<Promotion>>;
    async fn insert_promotion(&self, promotion: &Promotion) -> Result<()>;
}

#[async_trait]
pub trait ReviewStore: Send + Sync {
    async fn review_context(&self, user_id: Uuid, product_id: Uuid) -> Result<ReviewContext>;
    async fn insert_review(&self, review: &Review) -> Result<()>;
    async fn list_reviews(&self, product_id: Uuid) -> Result<Vec<Review>>;
}

#[async_trait]
pub trait CartStore: Send + Sync {
    async fn list_cart(&self, user_id: Uuid) -> Result<Vec<CartItem>>;
    /// Adds to the quantity already stored for the same (product, size).
    async fn add_to_cart(&self, user_id: Uuid, line: &CartLine) -> Result<CartItem>;
    async fn set_cart_quantity(&self, user_id: Uuid, line: &CartLine) -> Result<Option<CartItem>>;
    async fn remove_from_cart(&self, user_id: Uuid, product_id: Uuid, size: Option<&str>) -> Result<bool>;
    async fn clear_cart(&self, user_id: Uuid) -> Result<()>;
    async fn replace_cart(&self, user_id: Uuid, lines: &[CartLine]) -> Result<Vec<CartItem>>;
}

#[async_trait]
pub trait WishlistStore: Send + Sync {
    async fn list_wishlist(&self, user_id: Uuid) -> Result<Vec<WishlistItem>>;
    /// Returns whether the product is on the wishlist afterwards.
    async fn toggle_wishlist(&self, user_id: Uuid, product_id: Uuid) -> Result<bool>;
}

/// Everything the services need from one backend.
pub trait Storage:
    UserStore + CatalogStore + OrderStore + PromotionStore + ReviewStore + CartStore + WishlistStore + 'static
{
}

impl<T> Storage for T where
    T: UserStore + CatalogStore + OrderStore + PromotionStore + ReviewStore + CartStore + WishlistStore + 'static
{
}
