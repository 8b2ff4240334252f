use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use rust_decimal::Decimal;
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use super::extract::{AdminUser, MaybeUser, QueryParams, ValidatedJson};
use super::AppState;
use crate::domain::aggregates::{Category, Product, ProductDraft};
use crate::domain::value_objects::Sku;
use crate::storage::{Page, ProductQuery};
use crate::Result;

const DEFAULT_PER_PAGE: u32 = 20;

#[derive(Debug, Deserialize)]
pub struct ListParams {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
    /// Category slug.
    pub category: Option<String>,
    pub search: Option<String>,
    #[serde(default)]
    pub include_inactive: bool,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct ProductRequest {
    pub category_id: Uuid,
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    #[validate(length(min = 1, max = 50))]
    pub sku: String,
    pub description: Option<String>,
    pub price: Decimal,
    pub sale_price: Option<Decimal>,
    #[validate(range(min = 0))]
    pub stock: i32,
    #[serde(default = "active_by_default")]
    pub active: bool,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub sizes: Vec<SizeRequest>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SizeRequest {
    pub size: String,
    pub stock: i32,
}

fn active_by_default() -> bool { true }

impl ProductRequest {
    fn into_draft(self) -> Result<ProductDraft> {
        Ok(ProductDraft {
            category_id: self.category_id,
            name: self.name,
            sku: Sku::new(self.sku)?,
            description: self.description.map(|d| d.trim().to_string()).filter(|d| !d.is_empty()),
            price: self.price,
            sale_price: self.sale_price,
            stock: self.stock,
            active: self.active,
            images: self.images,
            sizes: self.sizes.into_iter().map(|s| (s.size, s.stock)).collect(),
        })
    }
}

#[derive(Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct CategoryRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
}

pub async fn list_products(
    State(s): State<AppState>,
    MaybeUser(caller): MaybeUser,
    QueryParams(p): QueryParams<ListParams>,
) -> Result<Json<Page<Product>>> {
    let is_admin = caller.is_some_and(|c| c.is_admin());
    let query = ProductQuery {
        category_slug: p.category.filter(|c| !c.trim().is_empty()),
        search: p.search.map(|q| q.trim().to_string()).filter(|q| !q.is_empty()),
        include_inactive: is_admin && p.include_inactive,
        page: p.page.unwrap_or(1).max(1),
        per_page: p.per_page.unwrap_or(DEFAULT_PER_PAGE),
    };
    Ok(Json(s.services.catalog.list_products(&query).await?))
}

pub async fn get_product(
    State(s): State<AppState>,
    MaybeUser(caller): MaybeUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Product>> {
    let is_admin = caller.is_some_and(|c| c.is_admin());
    Ok(Json(s.services.catalog.get_product(id, is_admin).await?))
}

pub async fn create_product(
    State(s): State<AppState>,
    _admin: AdminUser,
    ValidatedJson(r): ValidatedJson<ProductRequest>,
) -> Result<(StatusCode, Json<Product>)> {
    let product = s.services.catalog.create_product(r.into_draft()?).await?;
    Ok((StatusCode::CREATED, Json(product)))
}

pub async fn update_product(
    State(s): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<Uuid>,
    ValidatedJson(r): ValidatedJson<ProductRequest>,
) -> Result<Json<Product>> {
    Ok(Json(s.services.catalog.update_product(id, r.into_draft()?).await?))
}

pub async fn delete_product(State(s): State<AppState>, _admin: AdminUser, Path(id): Path<Uuid>) -> Result<StatusCode> {
    s.services.catalog.delete_product(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_categories(State(s): State<AppState>) -> Result<Json<Vec<Category>>> {
    Ok(Json(s.services.catalog.list_categories().await?))
}

pub async fn create_category(
    State(s): State<AppState>,
    _admin: AdminUser,
    ValidatedJson(r): ValidatedJson<CategoryRequest>,
) -> Result<(StatusCode, Json<Category>)> {
    Ok((StatusCode::CREATED, Json(s.services.catalog.create_category(&r.name).await?)))
}

pub async fn delete_category(State(s): State<AppState>, _admin: AdminUser, Path(id): Path<Uuid>) -> Result<StatusCode> {
    s.services.catalog.delete_category(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
