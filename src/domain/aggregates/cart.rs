//! Cart Aggregate

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// Server-side cart row, unique per `(user_id, product_id, size)`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct CartItem {
    pub user_id: Uuid,
    pub product_id: Uuid,
    pub size: Option<String>,
    pub quantity: i32,
    pub updated_at: DateTime<Utc>,
}

/// A cart entry independent of where it is stored (browser or server).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    pub product_id: Uuid,
    pub size: Option<String>,
    pub quantity: u32,
}

impl CartLine {
    pub fn new(product_id: Uuid, size: Option<String>, quantity: u32) -> Self {
        Self { product_id, size: normalize_size(size), quantity }
    }

    pub fn into_item(self, user_id: Uuid) -> CartItem {
        CartItem {
            user_id, product_id: self.product_id, size: self.size,
            quantity: i32::try_from(self.quantity).unwrap_or(i32::MAX), updated_at: Utc::now(),
        }
    }
}

impl From<&CartItem> for CartLine {
    fn from(item: &CartItem) -> Self {
        CartLine::new(item.product_id, item.size.clone(), item.quantity.max(0).unsigned_abs())
    }
}

/// Sizes compare case-insensitively; blank means "no size".
pub fn normalize_size(size: Option<String>) -> Option<String> {
    size.map(|s| s.trim().to_uppercase()).filter(|s| !s.is_empty())
}

/// Reconciles a browser cart with the stored one: one line per (product, size), keeping the larger quantity.
///
/// Stored lines keep their order; lines only present locally are appended in local order.
pub fn merge(local: &[CartLine], server: &[CartLine]) -> Vec<CartLine> {
    let mut merged: Vec<CartLine> = Vec::with_capacity(local.len() + server.len());
    let mut index: HashMap<(Uuid, Option<String>), usize> = HashMap::new();
    for line in server.iter().chain(local) {
        let line = CartLine::new(line.product_id, line.size.clone(), line.quantity);
        if line.quantity == 0 { continue; }
        let key = (line.product_id, line.size.clone());
        match index.get(&key) {
            Some(&pos) => merged[pos].quantity = merged[pos].quantity.max(line.quantity),
            None => {
                index.insert(key, merged.len());
                merged.push(line);
            }
        }
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_takes_max_quantity_per_key() {
        let (p1, p2, p3) = (Uuid::now_v7(), Uuid::now_v7(), Uuid::now_v7());
        let server = vec![CartLine::new(p1, Some("M".into()), 1), CartLine::new(p2, None, 4)];
        let local = vec![
            CartLine::new(p1, Some("m".into()), 3),
            CartLine::new(p1, Some("L".into()), 1),
            CartLine::new(p2, None, 2),
            CartLine::new(p3, Some(" ".into()), 5),
        ];
        let merged = merge(&local, &server);
        assert_eq!(merged, vec![
            CartLine::new(p1, Some("M".into()), 3),
            CartLine::new(p2, None, 4),
            CartLine::new(p1, Some("L".into()), 1),
            CartLine::new(p3, None, 5),
        ]);
    }

    #[test]
    fn test_merge_with_empty_sides() {
        let p = Uuid::now_v7();
        let only = vec![CartLine::new(p, None, 2)];
        assert_eq!(merge(&only, &[]), only);
        assert_eq!(merge(&[], &only), only);
        assert!(merge(&[CartLine::new(p, None, 0)], &[]).is_empty());
    }
}
