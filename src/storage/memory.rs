//! In-process store for local runs without `DATABASE_URL`, and for tests.
//!
//! Mirrors the relational constraints of the Postgres schema: unique keys, guarded stock
//! decrements, referenced rows that cannot be deleted, and all-or-nothing multi-row writes.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{
    CartStore, CatalogStore, OrderFilter, OrderStore, Page, ProductQuery, PromotionStore, ReviewStore, UserStore,
    WishlistStore,
};
use crate::domain::aggregates::{
    qualifies_for_review, CartItem, CartLine, Category, Order, OrderStatus, Payment, Product, Promotion, Review,
    ReviewContext, User, WishlistItem,
};
use crate::{EcommerceError, Result};

#[derive(Default)]
pub struct MemoryStore {
    state: RwLock<State>,
}

#[derive(Default)]
struct State {
    users: Vec<User>,
    categories: Vec<Category>,
    products: Vec<Product>,
    orders: Vec<Order>,
    promotions: Vec<Promotion>,
    reviews: Vec<Review>,
    cart: Vec<CartItem>,
    wishlist: Vec<WishlistItem>,
}

impl MemoryStore {
    pub fn new() -> Self { Self::default() }
}

fn quantity_of(line: &CartLine) -> Result<i32> {
    i32::try_from(line.quantity).map_err(|_| EcommerceError::validation("quantity too large"))
}

fn ensure_unique_product(state: &State, p: &Product) -> Result<()> {
    if state.products.iter().any(|o| o.id != p.id && o.sku == p.sku) {
        return Err(EcommerceError::conflict("duplicate value: products_sku_key"));
    }
    if state.products.iter().any(|o| o.id != p.id && o.slug == p.slug) {
        return Err(EcommerceError::conflict("duplicate value: products_slug_key"));
    }
    if !state.categories.iter().any(|c| c.id == p.category_id) {
        return Err(EcommerceError::conflict("record is still referenced"));
    }
    Ok(())
}

/// Stored orders never carry undrained events.
fn stored(order: &Order) -> Order {
    let mut order = order.clone();
    order.take_events();
    order
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn insert_user(&self, user: &User) -> Result<()> {
        let mut state = self.state.write().await;
        if state.users.iter().any(|u| u.email == user.email) {
            return Err(EcommerceError::conflict("email already registered"));
        }
        state.users.push(user.clone());
        Ok(())
    }

    async fn find_user(&self, id: Uuid) -> Result<Option<User>> {
        Ok(self.state.read().await.users.iter().find(|u| u.id == id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>> {
        Ok(self.state.read().await.users.iter().find(|u| u.email == email).cloned())
    }
}

#[async_trait]
impl CatalogStore for MemoryStore {
    async fn list_products(&self, q: &ProductQuery) -> Result<Page<Product>> {
        let state = self.state.read().await;
        let category = match &q.category_slug {
            Some(slug) => match state.categories.iter().find(|c| &c.slug == slug) {
                Some(c) => Some(c.id),
                None => return Ok(Page { data: vec![], total: 0, page: q.page.max(1) }),
            },
            None => None,
        };
        let needle = q.search.as_ref().map(|s| s.to_lowercase());
        let mut matching: Vec<&Product> = state.products.iter()
            .filter(|p| q.include_inactive || p.active)
            .filter(|p| category.map_or(true, |id| p.category_id == id))
            .filter(|p| needle.as_ref().map_or(true, |n| {
                p.name.to_lowercase().contains(n) || p.description.as_ref().is_some_and(|d| d.to_lowercase().contains(n))
            }))
            .collect();
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        let total = matching.len() as i64;
        let data = matching.into_iter()
            .skip(usize::try_from(q.offset()).unwrap_or(usize::MAX))
            .take(usize::try_from(q.limit()).unwrap_or(0))
            .cloned()
            .collect();
        Ok(Page { data, total, page: q.page.max(1) })
    }

    async fn find_product(&self, id: Uuid) -> Result<Option<Product>> {
        Ok(self.state.read().await.products.iter().find(|p| p.id == id).cloned())
    }

    async fn insert_product(&self, product: &Product) -> Result<()> {
        let mut state = self.state.write().await;
        ensure_unique_product(&state, product)?;
        state.products.push(product.clone());
        Ok(())
    }

    async fn update_product(&self, product: &Product) -> Result<()> {
        let mut state = self.state.write().await;
        ensure_unique_product(&state, product)?;
        let slot = state.products.iter_mut().find(|p| p.id == product.id).ok_or(EcommerceError::NotFound("product"))?;
        *slot = product.clone();
        Ok(())
    }

    async fn delete_product(&self, id: Uuid) -> Result<bool> {
        let mut state = self.state.write().await;
        if state.orders.iter().any(|o| o.contains_product(id)) {
            return Err(EcommerceError::conflict("product is referenced by existing orders"));
        }
        let before = state.products.len();
        state.products.retain(|p| p.id != id);
        if state.products.len() == before { return Ok(false); }
        state.reviews.retain(|r| r.product_id != id);
        state.cart.retain(|c| c.product_id != id);
        state.wishlist.retain(|w| w.product_id != id);
        Ok(true)
    }

    async fn list_categories(&self) -> Result<Vec<Category>> {
        let mut categories = self.state.read().await.categories.clone();
        categories.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(categories)
    }

    async fn find_category(&self, id: Uuid) -> Result<Option<Category>> {
        Ok(self.state.read().await.categories.iter().find(|c| c.id == id).cloned())
    }

    async fn insert_category(&self, category: &Category) -> Result<()> {
        let mut state = self.state.write().await;
        if state.categories.iter().any(|c| c.slug == category.slug) {
            return Err(EcommerceError::conflict("duplicate value: categories_slug_key"));
        }
        state.categories.push(category.clone());
        Ok(())
    }

    async fn delete_category(&self, id: Uuid) -> Result<bool> {
        let mut state = self.state.write().await;
        if state.products.iter().any(|p| p.category_id == id) {
            return Err(EcommerceError::conflict("category still has products"));
        }
        let before = state.categories.len();
        state.categories.retain(|c| c.id != id);
        Ok(state.categories.len() < before)
    }
}

#[async_trait]
impl OrderStore for MemoryStore {
    async fn create_order(&self, order: &Order) -> Result<()> {
        let mut state = self.state.write().await;
        if state.orders.iter().any(|o| o.order_number == order.order_number) {
            return Err(EcommerceError::conflict("duplicate value: orders_order_number_key"));
        }
        let mut remaining: HashMap<Uuid, i32> = HashMap::new();
        for item in &order.items {
            let product = state.products.iter().find(|p| p.id == item.product_id)
                .ok_or_else(|| EcommerceError::conflict("record is still referenced"))?;
            let stock = remaining.entry(product.id).or_insert(product.stock);
            if *stock < item.quantity {
                return Err(EcommerceError::conflict(format!("insufficient stock for product {}", item.product_id)));
            }
            *stock -= item.quantity;
        }
        let now = Utc::now();
        for product in state.products.iter_mut() {
            if let Some(stock) = remaining.get(&product.id) {
                product.stock = *stock;
                product.updated_at = now;
            }
        }
        state.orders.push(stored(order));
        Ok(())
    }

    async fn find_order(&self, id: Uuid) -> Result<Option<Order>> {
        Ok(self.state.read().await.orders.iter().find(|o| o.id == id).cloned())
    }

    async fn find_order_by_number(&self, order_number: &str) -> Result<Option<Order>> {
        Ok(self.state.read().await.orders.iter().find(|o| o.order_number == order_number).cloned())
    }

    async fn list_orders(&self, filter: &OrderFilter) -> Result<Vec<Order>> {
        let state = self.state.read().await;
        let mut orders: Vec<Order> = state.orders.iter()
            .filter(|o| filter.user_id.map_or(true, |u| o.user_id == u))
            .filter(|o| filter.status.map_or(true, |s| o.status == s))
            .cloned()
            .collect();
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(orders)
    }

    async fn update_order(&self, order: &Order) -> Result<()> {
        let mut state = self.state.write().await;
        let slot = state.orders.iter_mut().find(|o| o.id == order.id).ok_or(EcommerceError::NotFound("order"))?;
        slot.status = order.status;
        slot.payment_status = order.payment_status;
        slot.tracking_number = order.tracking_number.clone();
        slot.updated_at = order.updated_at;
        Ok(())
    }

    async fn reconcile_payment(&self, order: &Order, status: Option<OrderStatus>, payment: &Payment) -> Result<OrderStatus> {
        let mut state = self.state.write().await;
        let slot = state.orders.iter_mut().find(|o| o.id == order.id).ok_or(EcommerceError::NotFound("order"))?;
        if let Some(status) = status { slot.status = status; }
        slot.payment_status = order.payment_status;
        slot.updated_at = order.updated_at;
        match slot.payments.iter_mut().find(|p| p.transaction_id == payment.transaction_id) {
            Some(existing) => {
                existing.amount = payment.amount;
                existing.method = payment.method.clone();
                existing.status = payment.status;
                existing.updated_at = payment.updated_at;
            }
            None => slot.payments.push(payment.clone()),
        }
        Ok(slot.status)
    }
}

#[async_trait]
impl PromotionStore for MemoryStore {
    async fn list_promotions(&self) -> Result<Vec<Promotion>> {
        let mut promotions = self.state.read().await.promotions.clone();
        promotions.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(promotions)
    }

    async fn find_promotion_by_code(&self, code: &str) -> Result<Option<Promotion>> {
        Ok(self.state.read().await.promotions.iter().find(|p| p.code == code).cloned())
    }

    async fn insert_promotion(&self, promotion: &Promotion) -> Result<()> {
        let mut state = self.state.write().await;
        if state.promotions.iter().any(|p| p.code == promotion.code) {
            return Err(EcommerceError::conflict(format!("promotion code {} already exists", promotion.code)));
        }
        state.promotions.push(promotion.clone());
        Ok(())
    }
}

#[async_trait]
impl ReviewStore for MemoryStore {
    async fn review_context(&self, user_id: Uuid, product_id: Uuid) -> Result<ReviewContext> {
        let state = self.state.read().await;
        Ok(ReviewContext {
            already_reviewed: state.reviews.iter().any(|r| r.user_id == user_id && r.product_id == product_id),
            has_qualifying_purchase: state.orders.iter().any(|o| qualifies_for_review(o, user_id, product_id)),
        })
    }

    async fn insert_review(&self, review: &Review) -> Result<()> {
        let mut state = self.state.write().await;
        if state.reviews.iter().any(|r| r.user_id == review.user_id && r.product_id == review.product_id) {
            return Err(EcommerceError::conflict("duplicate value: reviews_user_id_product_id_key"));
        }
        state.reviews.push(review.clone());
        Ok(())
    }

    async fn list_reviews(&self, product_id: Uuid) -> Result<Vec<Review>> {
        let state = self.state.read().await;
        let mut reviews: Vec<Review> = state.reviews.iter().filter(|r| r.product_id == product_id).cloned().collect();
        reviews.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(reviews)
    }
}

#[async_trait]
impl CartStore for MemoryStore {
    async fn list_cart(&self, user_id: Uuid) -> Result<Vec<CartItem>> {
        Ok(self.state.read().await.cart.iter().filter(|c| c.user_id == user_id).cloned().collect())
    }

    async fn add_to_cart(&self, user_id: Uuid, line: &CartLine) -> Result<CartItem> {
        let quantity = quantity_of(line)?;
        let mut state = self.state.write().await;
        let existing = state.cart.iter_mut()
            .find(|c| c.user_id == user_id && c.product_id == line.product_id && c.size == line.size);
        match existing {
            Some(item) => {
                item.quantity = item.quantity.saturating_add(quantity);
                item.updated_at = Utc::now();
                Ok(item.clone())
            }
            None => {
                let item = line.clone().into_item(user_id);
                state.cart.push(item.clone());
                Ok(item)
            }
        }
    }

    async fn set_cart_quantity(&self, user_id: Uuid, line: &CartLine) -> Result<Option<CartItem>> {
        let quantity = quantity_of(line)?;
        let mut state = self.state.write().await;
        Ok(state.cart.iter_mut()
            .find(|c| c.user_id == user_id && c.product_id == line.product_id && c.size == line.size)
            .map(|item| {
                item.quantity = quantity;
                item.updated_at = Utc::now();
                item.clone()
            }))
    }

    async fn remove_from_cart(&self, user_id: Uuid, product_id: Uuid, size: Option<&str>) -> Result<bool> {
        let mut state = self.state.write().await;
        let before = state.cart.len();
        state.cart.retain(|c| !(c.user_id == user_id && c.product_id == product_id && c.size.as_deref() == size));
        Ok(state.cart.len() < before)
    }

    async fn clear_cart(&self, user_id: Uuid) -> Result<()> {
        self.state.write().await.cart.retain(|c| c.user_id != user_id);
        Ok(())
    }

    async fn replace_cart(&self, user_id: Uuid, lines: &[CartLine]) -> Result<Vec<CartItem>> {
        for line in lines { quantity_of(line)?; }
        let items: Vec<CartItem> = lines.iter().cloned().map(|l| l.into_item(user_id)).collect();
        let mut state = self.state.write().await;
        state.cart.retain(|c| c.user_id != user_id);
        state.cart.extend(items.iter().cloned());
        Ok(items)
    }
}

#[async_trait]
impl WishlistStore for MemoryStore {
    async fn list_wishlist(&self, user_id: Uuid) -> Result<Vec<WishlistItem>> {
        let state = self.state.read().await;
        let mut items: Vec<WishlistItem> = state.wishlist.iter().filter(|w| w.user_id == user_id).cloned().collect();
        items.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(items)
    }

    async fn toggle_wishlist(&self, user_id: Uuid, product_id: Uuid) -> Result<bool> {
        let mut state = self.state.write().await;
        let before = state.wishlist.len();
        state.wishlist.retain(|w| !(w.user_id == user_id && w.product_id == product_id));
        if state.wishlist.len() < before { return Ok(false); }
        state.wishlist.push(WishlistItem { user_id, product_id, created_at: Utc::now() });
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::aggregates::{OrderLine, PaymentStatus, ProductDraft, TransactionStatus};
    use crate::domain::value_objects::Sku;
    use rust_decimal::Decimal;

    async fn seeded(stock: i32) -> (MemoryStore, Product) {
        let store = MemoryStore::new();
        let category = Category::create("Kaos").unwrap();
        store.insert_category(&category).await.unwrap();
        let product = Product::create(ProductDraft {
            category_id: category.id, name: "Kaos Putih".into(), sku: Sku::new("KP-1").unwrap(), description: None,
            price: Decimal::from(100000), sale_price: None, stock, active: true, images: vec![], sizes: vec![],
        }).unwrap();
        store.insert_product(&product).await.unwrap();
        (store, product)
    }

    fn order_for(product: &Product, quantity: u32) -> Order {
        let line = OrderLine { product_id: product.id, quantity, price: product.price, size: None };
        Order::place(format!("ORD-{}", Uuid::now_v7()), Uuid::now_v7(), vec![line], Decimal::from(15000), "addr").unwrap()
    }

    #[tokio::test]
    async fn test_create_order_decrements_stock() {
        let (store, product) = seeded(5).await;
        store.create_order(&order_for(&product, 2)).await.unwrap();
        assert_eq!(store.find_product(product.id).await.unwrap().unwrap().stock, 3);
    }

    #[tokio::test]
    async fn test_oversell_leaves_no_trace() {
        let (store, product) = seeded(1).await;
        let order = order_for(&product, 2);
        assert!(matches!(store.create_order(&order).await, Err(EcommerceError::Conflict(_))));
        assert_eq!(store.find_product(product.id).await.unwrap().unwrap().stock, 1);
        assert!(store.find_order(order.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_reconcile_upserts_payment() {
        let (store, product) = seeded(5).await;
        let mut order = order_for(&product, 1);
        store.create_order(&order).await.unwrap();
        let status = order.apply_transaction(TransactionStatus::Pending, "trx-1");
        store.reconcile_payment(&order, status, &Payment::record(order.id, "trx-1", order.total, "bank_transfer", PaymentStatus::Pending)).await.unwrap();
        let status = order.apply_transaction(TransactionStatus::Settlement, "trx-1");
        let stored = store.reconcile_payment(&order, status, &Payment::record(order.id, "trx-1", order.total, "bank_transfer", PaymentStatus::Paid)).await.unwrap();
        assert_eq!(stored, OrderStatus::Confirmed);
        let saved = store.find_order(order.id).await.unwrap().unwrap();
        assert_eq!(saved.payments.len(), 1);
        assert_eq!(saved.payments[0].status, PaymentStatus::Paid);
        assert_eq!(saved.payment_status, PaymentStatus::Paid);
    }

    #[tokio::test]
    async fn test_pending_notification_keeps_concurrent_status_edit() {
        let (store, product) = seeded(5).await;
        let mut stale = order_for(&product, 1);
        store.create_order(&stale).await.unwrap();
        let mut edited = stale.clone();
        edited.update_by_admin(Some(OrderStatus::Processing), None, None);
        store.update_order(&edited).await.unwrap();

        let status = stale.apply_transaction(TransactionStatus::Pending, "trx-9");
        assert_eq!(status, None);
        let stored = store.reconcile_payment(&stale, status, &Payment::record(stale.id, "trx-9", stale.total, "qris", PaymentStatus::Pending)).await.unwrap();
        assert_eq!(stored, OrderStatus::Processing);
        assert_eq!(store.find_order(stale.id).await.unwrap().unwrap().status, OrderStatus::Processing);
    }

    #[tokio::test]
    async fn test_referenced_rows_cannot_be_deleted() {
        let (store, product) = seeded(5).await;
        assert!(store.delete_category(product.category_id).await.is_err());
        store.create_order(&order_for(&product, 1)).await.unwrap();
        assert!(store.delete_product(product.id).await.is_err());
    }
}
