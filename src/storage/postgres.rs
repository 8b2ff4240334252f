//! Postgres storage over a shared `sqlx` pool.

use async_trait::async_trait;
use sqlx::PgPool;
use std::collections::HashMap;
use uuid::Uuid;

use super::{
    CartStore, CatalogStore, OrderFilter, OrderStore, Page, ProductQuery, PromotionStore, ReviewStore, UserStore,
    WishlistStore,
};
use crate::domain::aggregates::{
    CartItem, CartLine, Category, Order, OrderItem, OrderStatus, Payment, Product, ProductSize, Promotion, Review,
    ReviewContext, User, WishlistItem,
};
use crate::{EcommerceError, Result};

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self { Self { pool } }

    async fn attach_sizes(&self, products: &mut [Product]) -> Result<()> {
        if products.is_empty() { return Ok(()); }
        let ids: Vec<Uuid> = products.iter().map(|p| p.id).collect();
        let sizes = sqlx::query_as::<_, ProductSize>("SELECT * FROM product_sizes WHERE product_id = ANY($1) ORDER BY size")
            .bind(&ids).fetch_all(&self.pool).await?;
        let mut by_product: HashMap<Uuid, Vec<ProductSize>> = HashMap::new();
        for size in sizes { by_product.entry(size.product_id).or_default().push(size); }
        for product in products { product.sizes = by_product.remove(&product.id).unwrap_or_default(); }
        Ok(())
    }

    async fn attach_order_children(&self, orders: &mut [Order]) -> Result<()> {
        if orders.is_empty() { return Ok(()); }
        let ids: Vec<Uuid> = orders.iter().map(|o| o.id).collect();
        let items = sqlx::query_as::<_, OrderItem>("SELECT * FROM order_items WHERE order_id = ANY($1) ORDER BY id")
            .bind(&ids).fetch_all(&self.pool).await?;
        let payments = sqlx::query_as::<_, Payment>("SELECT * FROM payments WHERE order_id = ANY($1) ORDER BY created_at")
            .bind(&ids).fetch_all(&self.pool).await?;
        let mut items_by_order: HashMap<Uuid, Vec<OrderItem>> = HashMap::new();
        for item in items { items_by_order.entry(item.order_id).or_default().push(item); }
        let mut payments_by_order: HashMap<Uuid, Vec<Payment>> = HashMap::new();
        for payment in payments { payments_by_order.entry(payment.order_id).or_default().push(payment); }
        for order in orders {
            order.items = items_by_order.remove(&order.id).unwrap_or_default();
            order.payments = payments_by_order.remove(&order.id).unwrap_or_default();
        }
        Ok(())
    }

    async fn find_order_where(&self, column: &str, key: OrderKey<'_>) -> Result<Option<Order>> {
        let sql = format!("SELECT * FROM orders WHERE {column} = $1");
        let query = sqlx::query_as::<_, Order>(&sql);
        let order = match key {
            OrderKey::Id(id) => query.bind(id).fetch_optional(&self.pool).await?,
            OrderKey::Number(number) => query.bind(number).fetch_optional(&self.pool).await?,
        };
        let Some(order) = order else { return Ok(None) };
        let mut orders = [order];
        self.attach_order_children(&mut orders).await?;
        let [order] = orders;
        Ok(Some(order))
    }
}

enum OrderKey<'a> { Id(Uuid), Number(&'a str) }

#[async_trait]
impl UserStore for PgStore {
    async fn insert_user(&self, user: &User) -> Result<()> {
        sqlx::query("INSERT INTO users (id, name, email, password_hash, role, created_at) VALUES ($1, $2, $3, $4, $5, $6)")
            .bind(user.id).bind(&user.name).bind(&user.email).bind(&user.password_hash).bind(user.role).bind(user.created_at)
            .execute(&self.pool).await
            .map_err(|e| match EcommerceError::from(e) {
                EcommerceError::Conflict(_) => EcommerceError::conflict("email already registered"),
                other => other,
            })?;
        Ok(())
    }

    async fn find_user(&self, id: Uuid) -> Result<Option<User>> {
        Ok(sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1").bind(id).fetch_optional(&self.pool).await?)
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>> {
        Ok(sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = $1").bind(email).fetch_optional(&self.pool).await?)
    }
}

#[async_trait]
impl CatalogStore for PgStore {
    async fn list_products(&self, q: &ProductQuery) -> Result<Page<Product>> {
        const FILTER: &str = "FROM products p JOIN categories c ON c.id = p.category_id \
            WHERE ($1 OR p.active) AND ($2::text IS NULL OR c.slug = $2) \
            AND ($3::text IS NULL OR p.name ILIKE '%' || $3 || '%' OR p.description ILIKE '%' || $3 || '%')";
        let mut products = sqlx::query_as::<_, Product>(&format!("SELECT p.* {FILTER} ORDER BY p.created_at DESC LIMIT $4 OFFSET $5"))
            .bind(q.include_inactive).bind(&q.category_slug).bind(&q.search).bind(q.limit()).bind(q.offset())
            .fetch_all(&self.pool).await?;
        let total: (i64,) = sqlx::query_as(&format!("SELECT COUNT(*) {FILTER}"))
            .bind(q.include_inactive).bind(&q.category_slug).bind(&q.search)
            .fetch_one(&self.pool).await?;
        self.attach_sizes(&mut products).await?;
        Ok(Page { data: products, total: total.0, page: q.page.max(1) })
    }

    async fn find_product(&self, id: Uuid) -> Result<Option<Product>> {
        let Some(product) = sqlx::query_as::<_, Product>("SELECT * FROM products WHERE id = $1").bind(id).fetch_optional(&self.pool).await? else {
            return Ok(None);
        };
        let mut products = [product];
        self.attach_sizes(&mut products).await?;
        let [product] = products;
        Ok(Some(product))
    }

    async fn insert_product(&self, p: &Product) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("INSERT INTO products (id, category_id, name, slug, sku, description, price, sale_price, stock, active, images, created_at, updated_at) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)")
            .bind(p.id).bind(p.category_id).bind(&p.name).bind(&p.slug).bind(&p.sku).bind(&p.description).bind(p.price)
            .bind(p.sale_price).bind(p.stock).bind(p.active).bind(&p.images).bind(p.created_at).bind(p.updated_at)
            .execute(&mut *tx).await?;
        for size in &p.sizes {
            sqlx::query("INSERT INTO product_sizes (product_id, size, stock) VALUES ($1, $2, $3)")
                .bind(p.id).bind(&size.size).bind(size.stock).execute(&mut *tx).await?;
        }
        tx.commit().await?;
        Ok(())
    }

    async fn update_product(&self, p: &Product) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        let updated = sqlx::query("UPDATE products SET category_id = $2, name = $3, slug = $4, sku = $5, description = $6, price = $7, sale_price = $8, stock = $9, active = $10, images = $11, updated_at = $12 WHERE id = $1")
            .bind(p.id).bind(p.category_id).bind(&p.name).bind(&p.slug).bind(&p.sku).bind(&p.description).bind(p.price)
            .bind(p.sale_price).bind(p.stock).bind(p.active).bind(&p.images).bind(p.updated_at)
            .execute(&mut *tx).await?;
        if updated.rows_affected() == 0 { return Err(EcommerceError::NotFound("product")); }
        sqlx::query("DELETE FROM product_sizes WHERE product_id = $1").bind(p.id).execute(&mut *tx).await?;
        for size in &p.sizes {
            sqlx::query("INSERT INTO product_sizes (product_id, size, stock) VALUES ($1, $2, $3)")
                .bind(p.id).bind(&size.size).bind(size.stock).execute(&mut *tx).await?;
        }
        tx.commit().await?;
        Ok(())
    }

    async fn delete_product(&self, id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM products WHERE id = $1").bind(id).execute(&self.pool).await
            .map_err(|e| match EcommerceError::from(e) {
                EcommerceError::Conflict(_) => EcommerceError::conflict("product is referenced by existing orders"),
                other => other,
            })?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_categories(&self) -> Result<Vec<Category>> {
        Ok(sqlx::query_as::<_, Category>("SELECT * FROM categories ORDER BY name").fetch_all(&self.pool).await?)
    }

    async fn find_category(&self, id: Uuid) -> Result<Option<Category>> {
        Ok(sqlx::query_as::<_, Category>("SELECT * FROM categories WHERE id = $1").bind(id).fetch_optional(&self.pool).await?)
    }

    async fn insert_category(&self, c: &Category) -> Result<()> {
        sqlx::query("INSERT INTO categories (id, name, slug, created_at) VALUES ($1, $2, $3, $4)")
            .bind(c.id).bind(&c.name).bind(&c.slug).bind(c.created_at)
            .execute(&self.pool).await?;
        Ok(())
    }

    async fn delete_category(&self, id: Uuid) -> Result<bool> {
        let (in_use,): (bool,) = sqlx::query_as("SELECT EXISTS (SELECT 1 FROM products WHERE category_id = $1)")
            .bind(id).fetch_one(&self.pool).await?;
        if in_use { return Err(EcommerceError::conflict("category still has products")); }
        let result = sqlx::query("DELETE FROM categories WHERE id = $1").bind(id).execute(&self.pool).await?;
        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl OrderStore for PgStore {
    async fn create_order(&self, o: &Order) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("INSERT INTO orders (id, order_number, user_id, status, payment_status, subtotal, shipping_cost, total, shipping_address, tracking_number, created_at, updated_at) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)")
            .bind(o.id).bind(&o.order_number).bind(o.user_id).bind(o.status).bind(o.payment_status).bind(o.subtotal)
            .bind(o.shipping_cost).bind(o.total).bind(&o.shipping_address).bind(&o.tracking_number).bind(o.created_at).bind(o.updated_at)
            .execute(&mut *tx).await?;
        for item in &o.items {
            sqlx::query("INSERT INTO order_items (id, order_id, product_id, price, quantity, size) VALUES ($1, $2, $3, $4, $5, $6)")
                .bind(item.id).bind(o.id).bind(item.product_id).bind(item.price).bind(item.quantity).bind(&item.size)
                .execute(&mut *tx).await?;
            let decremented = sqlx::query("UPDATE products SET stock = stock - $2, updated_at = NOW() WHERE id = $1 AND stock >= $2")
                .bind(item.product_id).bind(item.quantity)
                .execute(&mut *tx).await?;
            if decremented.rows_affected() == 0 {
                return Err(EcommerceError::conflict(format!("insufficient stock for product {}", item.product_id)));
            }
        }
        tx.commit().await?;
        Ok(())
    }

    async fn find_order(&self, id: Uuid) -> Result<Option<Order>> {
        self.find_order_where("id", OrderKey::Id(id)).await
    }

    async fn find_order_by_number(&self, order_number: &str) -> Result<Option<Order>> {
        self.find_order_where("order_number", OrderKey::Number(order_number)).await
    }

    async fn list_orders(&self, filter: &OrderFilter) -> Result<Vec<Order>> {
        let mut orders = sqlx::query_as::<_, Order>("SELECT * FROM orders WHERE ($1::uuid IS NULL OR user_id = $1) AND ($2::order_status IS NULL OR status = $2) ORDER BY created_at DESC")
            .bind(filter.user_id).bind(filter.status)
            .fetch_all(&self.pool).await?;
        self.attach_order_children(&mut orders).await?;
        Ok(orders)
    }

    async fn update_order(&self, o: &Order) -> Result<()> {
        let result = sqlx::query("UPDATE orders SET status = $2, payment_status = $3, tracking_number = $4, updated_at = $5 WHERE id = $1")
            .bind(o.id).bind(o.status).bind(o.payment_status).bind(&o.tracking_number).bind(o.updated_at)
            .execute(&self.pool).await?;
        if result.rows_affected() == 0 { return Err(EcommerceError::NotFound("order")); }
        Ok(())
    }

    async fn reconcile_payment(&self, o: &Order, status: Option<OrderStatus>, p: &Payment) -> Result<OrderStatus> {
        let mut tx = self.pool.begin().await?;
        let stored: Option<(OrderStatus,)> = sqlx::query_as(
            "UPDATE orders SET status = COALESCE($2, status), payment_status = $3, updated_at = $4 WHERE id = $1 RETURNING status")
            .bind(o.id).bind(status).bind(o.payment_status).bind(o.updated_at)
            .fetch_optional(&mut *tx).await?;
        let (stored,) = stored.ok_or(EcommerceError::NotFound("order"))?;
        sqlx::query("INSERT INTO payments (id, order_id, transaction_id, amount, method, status, created_at, updated_at) VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
                     ON CONFLICT (order_id, transaction_id) DO UPDATE SET amount = EXCLUDED.amount, method = EXCLUDED.method, status = EXCLUDED.status, updated_at = EXCLUDED.updated_at")
            .bind(p.id).bind(p.order_id).bind(&p.transaction_id).bind(p.amount).bind(&p.method).bind(p.status).bind(p.created_at).bind(p.updated_at)
            .execute(&mut *tx).await?;
        tx.commit().await?;
        Ok(stored)
    }
}

#[async_trait]
impl PromotionStore for PgStore {
    async fn list_promotions(&self) -> Result<Vec<Promotion>> {
        Ok(sqlx::query_as::<_, Promotion>("SELECT * FROM promotions ORDER BY created_at DESC").fetch_all(&self.pool).await?)
    }

    async fn find_promotion_by_code(&self, code: &str) -> Result<Option<Promotion>> {
        Ok(sqlx::query_as::<_, Promotion>("SELECT * FROM promotions WHERE code = $1").bind(code).fetch_optional(&self.pool).await?)
    }

    async fn insert_promotion(&self, p: &Promotion) -> Result<()> {
        sqlx::query("INSERT INTO promotions (id, code, promotion_type, value, min_purchase, max_discount, start_date, end_date, usage_limit, usage_count, active, created_at) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)")
            .bind(p.id).bind(&p.code).bind(p.promotion_type).bind(p.value).bind(p.min_purchase).bind(p.max_discount)
            .bind(p.start_date).bind(p.end_date).bind(p.usage_limit).bind(p.usage_count).bind(p.active).bind(p.created_at)
            .execute(&self.pool).await
            .map_err(|e| match EcommerceError::from(e) {
                EcommerceError::Conflict(_) => EcommerceError::conflict(format!("promotion code {} already exists", p.code)),
                other => other,
            })?;
        Ok(())
    }
}

#[async_trait]
impl ReviewStore for PgStore {
    async fn review_context(&self, user_id: Uuid, product_id: Uuid) -> Result<ReviewContext> {
        let (already_reviewed, has_qualifying_purchase): (bool, bool) = sqlx::query_as(
            "SELECT EXISTS (SELECT 1 FROM reviews WHERE user_id = $1 AND product_id = $2), \
                    EXISTS (SELECT 1 FROM order_items oi JOIN orders o ON o.id = oi.order_id \
                            WHERE o.user_id = $1 AND oi.product_id = $2 AND o.status = 'DELIVERED' AND o.payment_status = 'PAID')")
            .bind(user_id).bind(product_id)
            .fetch_one(&self.pool).await?;
        Ok(ReviewContext { already_reviewed, has_qualifying_purchase })
    }

    async fn insert_review(&self, r: &Review) -> Result<()> {
        sqlx::query("INSERT INTO reviews (id, user_id, product_id, rating, comment, created_at) VALUES ($1, $2, $3, $4, $5, $6)")
            .bind(r.id).bind(r.user_id).bind(r.product_id).bind(r.rating).bind(&r.comment).bind(r.created_at)
            .execute(&self.pool).await?;
        Ok(())
    }

    async fn list_reviews(&self, product_id: Uuid) -> Result<Vec<Review>> {
        Ok(sqlx::query_as::<_, Review>("SELECT * FROM reviews WHERE product_id = $1 ORDER BY created_at DESC")
            .bind(product_id).fetch_all(&self.pool).await?)
    }
}

#[async_trait]
impl CartStore for PgStore {
    async fn list_cart(&self, user_id: Uuid) -> Result<Vec<CartItem>> {
        Ok(sqlx::query_as::<_, CartItem>("SELECT * FROM cart_items WHERE user_id = $1 ORDER BY updated_at")
            .bind(user_id).fetch_all(&self.pool).await?)
    }

    async fn add_to_cart(&self, user_id: Uuid, line: &CartLine) -> Result<CartItem> {
        let quantity = i32::try_from(line.quantity).map_err(|_| EcommerceError::validation("quantity too large"))?;
        Ok(sqlx::query_as::<_, CartItem>("INSERT INTO cart_items (user_id, product_id, size, quantity, updated_at) VALUES ($1, $2, $3, $4, NOW()) \
                ON CONFLICT (user_id, product_id, size) DO UPDATE SET quantity = cart_items.quantity + EXCLUDED.quantity, updated_at = NOW() RETURNING *")
            .bind(user_id).bind(line.product_id).bind(&line.size).bind(quantity)
            .fetch_one(&self.pool).await?)
    }

    async fn set_cart_quantity(&self, user_id: Uuid, line: &CartLine) -> Result<Option<CartItem>> {
        let quantity = i32::try_from(line.quantity).map_err(|_| EcommerceError::validation("quantity too large"))?;
        Ok(sqlx::query_as::<_, CartItem>("UPDATE cart_items SET quantity = $4, updated_at = NOW() WHERE user_id = $1 AND product_id = $2 AND size IS NOT DISTINCT FROM $3 RETURNING *")
            .bind(user_id).bind(line.product_id).bind(&line.size).bind(quantity)
            .fetch_optional(&self.pool).await?)
    }

    async fn remove_from_cart(&self, user_id: Uuid, product_id: Uuid, size: Option<&str>) -> Result<bool> {
        let result = sqlx::query("DELETE FROM cart_items WHERE user_id = $1 AND product_id = $2 AND size IS NOT DISTINCT FROM $3")
            .bind(user_id).bind(product_id).bind(size)
            .execute(&self.pool).await?;
        Ok(result.rows_affected() > 0)
    }

    async fn clear_cart(&self, user_id: Uuid) -> Result<()> {
        sqlx::query("DELETE FROM cart_items WHERE user_id = $1").bind(user_id).execute(&self.pool).await?;
        Ok(())
    }

    async fn replace_cart(&self, user_id: Uuid, lines: &[CartLine]) -> Result<Vec<CartItem>> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("DELETE FROM cart_items WHERE user_id = $1").bind(user_id).execute(&mut *tx).await?;
        let mut items = Vec::with_capacity(lines.len());
        for line in lines {
            let quantity = i32::try_from(line.quantity).map_err(|_| EcommerceError::validation("quantity too large"))?;
            let item = sqlx::query_as::<_, CartItem>("INSERT INTO cart_items (user_id, product_id, size, quantity, updated_at) VALUES ($1, $2, $3, $4, NOW()) RETURNING *")
                .bind(user_id).bind(line.product_id).bind(&line.size).bind(quantity)
                .fetch_one(&mut *tx).await?;
            items.push(item);
        }
        tx.commit().await?;
        Ok(items)
    }
}

#[async_trait]
impl WishlistStore for PgStore {
    async fn list_wishlist(&self, user_id: Uuid) -> Result<Vec<WishlistItem>> {
        Ok(sqlx::query_as::<_, WishlistItem>("SELECT * FROM wishlist_items WHERE user_id = $1 ORDER BY created_at DESC")
            .bind(user_id).fetch_all(&self.pool).await?)
    }

    async fn toggle_wishlist(&self, user_id: Uuid, product_id: Uuid) -> Result<bool> {
        let removed = sqlx::query("DELETE FROM wishlist_items WHERE user_id = $1 AND product_id = $2")
            .bind(user_id).bind(product_id).execute(&self.pool).await?;
        if removed.rows_affected() > 0 { return Ok(false); }
        sqlx::query("INSERT INTO wishlist_items (user_id, product_id, created_at) VALUES ($1, $2, NOW()) ON CONFLICT DO NOTHING")
            .bind(user_id).bind(product_id).execute(&self.pool).await?;
        Ok(true)
    }
}
