use std::sync::Arc;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use crate::domain::aggregates::{Discount, Promotion, PromotionDraft, PromotionError};
use crate::domain::value_objects::ensure_money;
use crate::storage::PromotionStore;
use crate::Result;

pub struct PromotionService {
    store: Arc<dyn PromotionStore>,
}

impl PromotionService {
    pub fn new(store: Arc<dyn PromotionStore>) -> Self { Self { store } }

    pub async fn list(&self) -> Result<Vec<Promotion>> { self.store.list_promotions().await }

    pub async fn create(&self, draft: PromotionDraft) -> Result<Promotion> {
        let promotion = Promotion::create(draft)?;
        self.store.insert_promotion(&promotion).await?;
        tracing::info!(code = %promotion.code, "promotion created");
        Ok(promotion)
    }

    /// Prices `code` against `subtotal` without consuming a usage.
    pub async fn apply(&self, code: &str, subtotal: Decimal, now: DateTime<Utc>) -> Result<Discount> {
        ensure_money(subtotal, "subtotal")?;
        let code = code.trim().to_uppercase();
        let promotion = self.store.find_promotion_by_code(&code).await?.ok_or(PromotionError::NotFound)?;
        Ok(promotion.evaluate(subtotal, now)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::aggregates::PromotionType;
    use crate::domain::value_objects::PromoCode;
    use crate::storage::MemoryStore;
    use crate::EcommerceError;
    use chrono::Duration;

    fn draft(code: &str) -> PromotionDraft {
        PromotionDraft {
            code: PromoCode::new(code).unwrap(), promotion_type: PromotionType::FixedAmount, value: Decimal::from(50000),
            min_purchase: None, max_discount: None, start_date: Utc::now() - Duration::days(1),
            end_date: Utc::now() + Duration::days(1), usage_limit: None, active: true,
        }
    }

    #[tokio::test]
    async fn test_lookup_is_case_insensitive() {
        let service = PromotionService::new(Arc::new(MemoryStore::new()));
        service.create(draft("hemat50")).await.unwrap();
        let discount = service.apply(" Hemat50 ", Decimal::from(30000), Utc::now()).await.unwrap();
        assert_eq!(discount.discount_amount, Decimal::from(30000));
        assert_eq!(discount.final_total, Decimal::ZERO);
    }

    #[tokio::test]
    async fn test_unknown_and_duplicate_codes() {
        let service = PromotionService::new(Arc::new(MemoryStore::new()));
        service.create(draft("HEMAT")).await.unwrap();
        assert!(matches!(service.create(draft("hemat")).await, Err(EcommerceError::Conflict(_))));
        assert!(matches!(
            service.apply("NOPE", Decimal::ONE, Utc::now()).await,
            Err(EcommerceError::Promotion(PromotionError::NotFound))
        ));
    }
}
