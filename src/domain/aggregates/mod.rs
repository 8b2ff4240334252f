//! Aggregates module
pub mod product;
pub mod order;
pub mod cart;
pub mod payment;
pub mod promotion;
pub mod review;
pub mod user;

pub use product::{Category, Product, ProductDraft, ProductSize};
pub use order::{generate_order_number, Order, OrderItem, OrderLine, OrderStatus, PaymentStatus};
pub use cart::{merge, normalize_size, CartItem, CartLine};
pub use payment::{Payment, TransactionStatus};
pub use promotion::{Discount, Promotion, PromotionDraft, PromotionError, PromotionType};
pub use review::{qualifies_for_review, Review, ReviewContext, ReviewError};
pub use user::{Role, User, WishlistItem};
