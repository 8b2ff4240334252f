//! Server-side cart, priced against the current catalog.

use std::sync::Arc;

use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

use crate::domain::aggregates::{merge, CartLine, Product};
use crate::storage::{CartStore, CatalogStore};
use crate::{EcommerceError, Result};

#[derive(Debug, Clone, Serialize)]
pub struct CartEntry {
    pub product_id: Uuid,
    pub name: String,
    pub size: Option<String>,
    pub quantity: i32,
    pub price: Decimal,
    pub line_total: Decimal,
}

#[derive(Debug, Clone, Serialize)]
pub struct CartView {
    pub items: Vec<CartEntry>,
    pub subtotal: Decimal,
}

pub struct CartService {
    carts: Arc<dyn CartStore>,
    catalog: Arc<dyn CatalogStore>,
}

impl CartService {
    pub fn new(carts: Arc<dyn CartStore>, catalog: Arc<dyn CatalogStore>) -> Self { Self { carts, catalog } }

    pub async fn view(&self, user_id: Uuid) -> Result<CartView> {
        let mut items = Vec::new();
        for item in self.carts.list_cart(user_id).await? {
            let Some(product) = self.catalog.find_product(item.product_id).await? else { continue };
            let price = product.effective_price();
            items.push(CartEntry {
                product_id: item.product_id, name: product.name, size: item.size, quantity: item.quantity,
                price, line_total: price * Decimal::from(item.quantity),
            });
        }
        let subtotal = items.iter().map(|i| i.line_total).sum();
        Ok(CartView { items, subtotal })
    }

    /// Adds to whatever is already in the cart for the same product and size.
    pub async fn add(&self, user_id: Uuid, line: CartLine) -> Result<CartView> {
        if line.quantity == 0 { return Err(EcommerceError::validation("quantity must be at least 1")); }
        let product = self.product(line.product_id).await?;
        let in_cart = self.carts.list_cart(user_id).await?.into_iter()
            .find(|i| i.product_id == line.product_id && i.size == line.size)
            .map_or(0, |i| i.quantity.max(0).unsigned_abs());
        product.can_supply(in_cart.saturating_add(line.quantity), line.size.as_deref())?;
        self.carts.add_to_cart(user_id, &line).await?;
        self.view(user_id).await
    }

    /// A quantity of zero removes the line.
    pub async fn set_quantity(&self, user_id: Uuid, line: CartLine) -> Result<CartView> {
        if line.quantity == 0 {
            return self.remove(user_id, line.product_id, line.size).await;
        }
        self.product(line.product_id).await?.can_supply(line.quantity, line.size.as_deref())?;
        self.carts.set_cart_quantity(user_id, &line).await?.ok_or(EcommerceError::NotFound("cart item"))?;
        self.view(user_id).await
    }

    pub async fn remove(&self, user_id: Uuid, product_id: Uuid, size: Option<String>) -> Result<CartView> {
        let line = CartLine::new(product_id, size, 0);
        if !self.carts.remove_from_cart(user_id, product_id, line.size.as_deref()).await? {
            return Err(EcommerceError::NotFound("cart item"));
        }
        self.view(user_id).await
    }

    pub async fn clear(&self, user_id: Uuid) -> Result<()> { self.carts.clear_cart(user_id).await }

    /// Login-time reconciliation of a browser cart. Lines for products that no longer sell are dropped.
    pub async fn merge(&self, user_id: Uuid, local: Vec<CartLine>) -> Result<CartView> {
        let server: Vec<CartLine> = self.carts.list_cart(user_id).await?.iter().map(CartLine::from).collect();
        let mut kept = Vec::new();
        for line in merge(&local, &server) {
            match self.catalog.find_product(line.product_id).await? {
                Some(product) if product.active => kept.push(line),
                _ => tracing::debug!(product_id = %line.product_id, "dropping unavailable product from merged cart"),
            }
        }
        self.carts.replace_cart(user_id, &kept).await?;
        self.view(user_id).await
    }

    async fn product(&self, id: Uuid) -> Result<Product> {
        self.catalog.find_product(id).await?.ok_or(EcommerceError::NotFound("product"))
    }
}
