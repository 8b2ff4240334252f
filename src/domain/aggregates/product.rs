//! Product Aggregate

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::value_objects::{ensure_money, Sku, Slug};
use crate::EcommerceError;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Product {
    pub id: Uuid,
    pub category_id: Uuid,
    pub name: String,
    pub slug: String,
    pub sku: String,
    pub description: Option<String>,
    pub price: Decimal,
    pub sale_price: Option<Decimal>,
    pub stock: i32,
    pub active: bool,
    pub images: Vec<String>,
    #[sqlx(skip)]
    pub sizes: Vec<ProductSize>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct ProductSize {
    pub product_id: Uuid,
    pub size: String,
    pub stock: i32,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Category {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub created_at: DateTime<Utc>,
}

impl Category {
    pub fn create(name: &str) -> Result<Self, EcommerceError> {
        let name = name.trim();
        let slug = Slug::from_name(name)?;
        Ok(Self { id: Uuid::now_v7(), name: name.to_string(), slug: slug.into_inner(), created_at: Utc::now() })
    }
}

/// Validated product attributes coming from admin create/update.
#[derive(Clone, Debug)]
pub struct ProductDraft {
    pub category_id: Uuid,
    pub name: String,
    pub sku: Sku,
    pub description: Option<String>,
    pub price: Decimal,
    pub sale_price: Option<Decimal>,
    pub stock: i32,
    pub active: bool,
    pub images: Vec<String>,
    pub sizes: Vec<(String, i32)>,
}

impl ProductDraft {
    pub fn validate(&self) -> Result<(), EcommerceError> {
        if self.name.trim().is_empty() { return Err(EcommerceError::validation("name is required")); }
        if self.price <= Decimal::ZERO { return Err(EcommerceError::validation("price must be positive")); }
        ensure_money(self.price, "price")?;
        if let Some(sale) = self.sale_price {
            ensure_money(sale, "sale price")?;
            if sale <= Decimal::ZERO || sale >= self.price {
                return Err(EcommerceError::validation("sale price must be positive and lower than price"));
            }
        }
        if self.stock < 0 { return Err(EcommerceError::validation("stock must not be negative")); }
        let mut labels = std::collections::HashSet::new();
        for (size, stock) in &self.sizes {
            if size.trim().is_empty() { return Err(EcommerceError::validation("size label is required")); }
            if *stock < 0 { return Err(EcommerceError::validation("size stock must not be negative")); }
            if !labels.insert(size.trim().to_uppercase()) {
                return Err(EcommerceError::validation(format!("duplicate size {size}")));
            }
        }
        Ok(())
    }
}

impl Product {
    pub fn create(draft: ProductDraft) -> Result<Self, EcommerceError> {
        draft.validate()?;
        let id = Uuid::now_v7();
        let now = Utc::now();
        let slug = Slug::from_name(&draft.name)?;
        Ok(Self {
            id, category_id: draft.category_id, name: draft.name.trim().to_string(), slug: slug.into_inner(),
            sku: draft.sku.into_inner(), description: draft.description, price: draft.price,
            sale_price: draft.sale_price, stock: draft.stock, active: draft.active, images: draft.images,
            sizes: Self::sizes_for(id, draft.sizes), created_at: now, updated_at: now,
        })
    }

    /// Replaces every attribute, including the size list.
    pub fn apply(&mut self, draft: ProductDraft) -> Result<(), EcommerceError> {
        draft.validate()?;
        self.slug = Slug::from_name(&draft.name)?.into_inner();
        self.name = draft.name.trim().to_string();
        self.category_id = draft.category_id;
        self.sku = draft.sku.into_inner();
        self.description = draft.description;
        self.price = draft.price;
        self.sale_price = draft.sale_price;
        self.stock = draft.stock;
        self.active = draft.active;
        self.images = draft.images;
        self.sizes = Self::sizes_for(self.id, draft.sizes);
        self.touch();
        Ok(())
    }

    fn sizes_for(product_id: Uuid, sizes: Vec<(String, i32)>) -> Vec<ProductSize> {
        sizes.into_iter().map(|(size, stock)| ProductSize { product_id, size: size.trim().to_uppercase(), stock }).collect()
    }

    /// Price a buyer pays right now.
    pub fn effective_price(&self) -> Decimal { self.sale_price.unwrap_or(self.price) }

    pub fn size(&self, label: &str) -> Option<&ProductSize> {
        self.sizes.iter().find(|s| s.size.eq_ignore_ascii_case(label.trim()))
    }

    /// Whether `quantity` units (optionally of one size) can be sold.
    pub fn can_supply(&self, quantity: u32, size: Option<&str>) -> Result<(), EcommerceError> {
        if !self.active { return Err(EcommerceError::validation(format!("{} is not available", self.name))); }
        let available = match size {
            Some(label) => self.size(label)
                .ok_or_else(|| EcommerceError::validation(format!("size {label} does not exist for {}", self.name)))?
                .stock,
            None => self.stock,
        };
        if i64::from(quantity) > i64::from(available) {
            return Err(EcommerceError::validation(format!("only {available} of {} left in stock", self.name)));
        }
        Ok(())
    }

    fn touch(&mut self) { self.updated_at = Utc::now(); }
}
