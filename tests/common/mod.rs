#![allow(dead_code)]

use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use mockall::mock;
use rust_decimal::Decimal;
use serde_json::Value;
use tower::ServiceExt;
use uuid::Uuid;

use storefront::api::{self, AppState};
use storefront::config::Config;
use storefront::domain::aggregates::{Category, Product, ProductDraft, Role, User};
use storefront::domain::value_objects::Sku;
use storefront::events::EventPublisher;
use storefront::payment::{GatewayError, PaymentGateway, Session, SessionRequest};
use storefront::services::{Services, TokenSigner};
use storefront::storage::{CatalogStore, MemoryStore, UserStore};

pub const AUTH_SECRET: &str = "integration-secret-0123456789";
pub const SERVER_KEY: &str = "SB-Mid-server-integration";

mock! {
    pub Gateway {}

    #[async_trait]
    impl PaymentGateway for Gateway {
        async fn create_session(&self, request: SessionRequest) -> Result<Session, GatewayError>;
    }
}

pub struct TestApp {
    pub router: Router,
    pub store: Arc<MemoryStore>,
    pub tokens: TokenSigner,
}

pub fn test_config() -> Config {
    let upload_dir = std::env::temp_dir().join(format!("storefront-tests-{}", Uuid::now_v7()));
    Config::from_lookup(|key| match key {
        "AUTH_SECRET" => Some(AUTH_SECRET.to_string()),
        "PAYMENT_SERVER_KEY" => Some(SERVER_KEY.to_string()),
        "UPLOAD_DIR" => Some(upload_dir.to_string_lossy().into_owned()),
        _ => None,
    })
    .unwrap()
}

pub fn test_app(gateway: MockGateway) -> TestApp {
    let config = test_config();
    let store = Arc::new(MemoryStore::new());
    let services = Services::build(store.clone(), &config, Arc::new(gateway), EventPublisher::log_only());
    TestApp {
        router: api::router(AppState::new(services)),
        store,
        tokens: TokenSigner::new(&config.auth_secret, config.token_ttl_hours),
    }
}

/// Parses a JSON decimal, which the API renders as a string.
pub fn dec(value: &Value) -> Decimal {
    match value {
        Value::String(s) => Decimal::from_str(s).unwrap(),
        other => Decimal::from_str(&other.to_string()).unwrap(),
    }
}

impl TestApp {
    pub async fn call(&self, method: &str, uri: &str, token: Option<&str>, body: Option<Value>) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(serde_json::to_vec(&body).unwrap()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        self.send(request).await
    }

    pub async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes).unwrap_or(Value::Null) };
        (status, value)
    }

    async fn user_with_role(&self, email: &str, role: Role) -> (User, String) {
        let user = User { role, ..User::register("Test User", email, "not-a-real-hash".into()) };
        self.store.insert_user(&user).await.unwrap();
        let token = self.tokens.issue(&user).unwrap();
        (user, token)
    }

    pub async fn admin(&self) -> String {
        self.user_with_role(&format!("admin-{}@shop.test", Uuid::now_v7()), Role::Admin).await.1
    }

    pub async fn customer(&self) -> (Uuid, String) {
        let (user, token) = self.user_with_role(&format!("buyer-{}@shop.test", Uuid::now_v7()), Role::Customer).await;
        (user.id, token)
    }

    pub async fn seed_product(&self, price: i64, stock: i32) -> Product {
        let category = Category::create(&format!("Category {}", Uuid::now_v7())).unwrap();
        self.store.insert_category(&category).await.unwrap();
        let product = Product::create(ProductDraft {
            category_id: category.id,
            name: format!("Product {}", Uuid::now_v7()),
            sku: Sku::new(format!("SKU-{}", Uuid::now_v7().simple())).unwrap(),
            description: None,
            price: Decimal::from(price),
            sale_price: None,
            stock,
            active: true,
            images: vec![],
            sizes: vec![],
        })
        .unwrap();
        self.store.insert_product(&product).await.unwrap();
        product
    }

    pub async fn stock_of(&self, product_id: Uuid) -> i32 {
        self.store.find_product(product_id).await.unwrap().unwrap().stock
    }

    /// Places `quantity` units of `product` at its list price with 15000 shipping.
    pub async fn place_order(&self, token: &str, product: &Product, quantity: u32) -> (StatusCode, Value) {
        let body = serde_json::json!({
            "items": [{ "product_id": product.id, "quantity": quantity, "price": product.price.to_string() }],
            "shipping_cost": "15000",
            "shipping_address": "Jl. Merdeka No. 1, Bandung",
        });
        self.call("POST", "/orders", Some(token), Some(body)).await
    }
}
