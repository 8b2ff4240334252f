//! Application services. Built once at start-up and shared through the router state.

pub mod auth;
pub mod cart;
pub mod catalog;
pub mod orders;
pub mod payment;
pub mod promotion;
pub mod review;
pub mod upload;
pub mod wishlist;

use std::sync::Arc;

use crate::config::Config;
use crate::events::EventPublisher;
use crate::payment::PaymentGateway;
use crate::storage::Storage;

pub use auth::{AuthService, Claims, TokenSigner};
pub use cart::{CartEntry, CartService, CartView};
pub use catalog::CatalogService;
pub use orders::{OrderService, OrderUpdate, PlaceOrder};
pub use payment::{Notification, PaymentService};
pub use promotion::PromotionService;
pub use review::ReviewService;
pub use upload::UploadService;
pub use wishlist::WishlistService;

pub struct Services {
    pub auth: AuthService,
    pub catalog: CatalogService,
    pub cart: CartService,
    pub orders: OrderService,
    pub payment: PaymentService,
    pub promotions: PromotionService,
    pub reviews: ReviewService,
    pub wishlist: WishlistService,
    pub uploads: UploadService,
}

impl Services {
    pub fn build<S: Storage>(
        store: Arc<S>,
        config: &Config,
        gateway: Arc<dyn PaymentGateway>,
        events: EventPublisher,
    ) -> Self {
        Self {
            auth: AuthService::new(store.clone(), TokenSigner::new(&config.auth_secret, config.token_ttl_hours)),
            catalog: CatalogService::new(store.clone()),
            cart: CartService::new(store.clone(), store.clone()),
            orders: OrderService::new(store.clone(), store.clone(), store.clone(), events.clone()),
            payment: PaymentService::new(
                store.clone(),
                store.clone(),
                gateway,
                config.payment.server_key.clone(),
                events,
            ),
            promotions: PromotionService::new(store.clone()),
            reviews: ReviewService::new(store.clone(), store.clone()),
            wishlist: WishlistService::new(store.clone(), store),
            uploads: UploadService::new(config.upload_dir.clone()),
        }
    }
}
