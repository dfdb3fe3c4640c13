use crate::error::StoreError;
use crate::logic::pricing;
use crate::model::Id;
use crate::store::traits::Store;
use serde::Serialize;

/// Derived pricing for a special: the stored discount against the live
/// sum of its items.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpecialPricing {
    /// Σ calculated unit price × quantity over the special's items.
    pub original_price: i64,
    pub discounted_price: i64,
    pub savings: i64,
    pub savings_percent: i64,
}

impl SpecialPricing {
    pub fn compute(original_price: i64, discounted_price: i64) -> Self {
        let savings = original_price - discounted_price;
        let savings_percent = if original_price > 0 {
            ((savings as f64 / original_price as f64) * 100.0).round() as i64
        } else {
            0
        };
        Self {
            original_price,
            discounted_price,
            savings,
            savings_percent,
        }
    }
}

pub struct SpecialOperations;

impl SpecialOperations {
    /// Price a special live. The original price is derived every time from
    /// the items' calculated prices, never read from a stored aggregate.
    pub async fn pricing<S: Store>(
        store: &S,
        special_id: &Id,
    ) -> Result<SpecialPricing, StoreError> {
        let special = store
            .get_special(special_id)
            .await?
            .ok_or_else(|| StoreError::not_found("Special", special_id))?;

        let mut original_price = 0;
        for item in store.list_special_items(&special.id).await? {
            let Some(config) = store.get_product_config(&item.product_id).await? else {
                log::warn!(
                    "special {} item {} references missing product {}",
                    special.id,
                    item.id,
                    item.product_id
                );
                continue;
            };
            original_price += pricing::line_total(&config, &item.selection, item.quantity);
        }

        Ok(SpecialPricing::compute(
            original_price,
            special.discounted_price,
        ))
    }
}
