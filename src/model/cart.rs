use crate::model::selection::ParameterSelection;
use crate::model::{generate_id, Id, Identity};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CartStatus {
    Active,
    /// Terminal: reached when an order is created from the cart, or when a
    /// guest cart is retired by a merge. Checked-out carts are never
    /// mutated or deleted.
    CheckedOut,
}

impl CartStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CartStatus::Active => "active",
            CartStatus::CheckedOut => "checked_out",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "active" => Some(CartStatus::Active),
            "checked_out" => Some(CartStatus::CheckedOut),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cart {
    pub id: Id,
    /// User or guest, exactly one, for the cart's whole life.
    pub owner: Identity,
    pub status: CartStatus,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

impl Cart {
    pub fn new(owner: Identity) -> Self {
        let now = chrono::Utc::now();
        Self {
            id: generate_id(),
            owner,
            status: CartStatus::Active,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_active(&self) -> bool {
        self.status == CartStatus::Active
    }
}

/// One configured product in a cart.
///
/// Lines sharing a non-null `special_id` form a bundle: inserted together,
/// removed together, and never individually re-parameterized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartLine {
    pub id: Id,
    pub cart_id: Id,
    pub product_id: Id,
    pub quantity: i64,
    pub selection: ParameterSelection,
    pub special_id: Option<Id>,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl CartLine {
    pub fn new(
        cart_id: Id,
        product_id: Id,
        quantity: i64,
        selection: ParameterSelection,
    ) -> Self {
        Self {
            id: generate_id(),
            cart_id,
            product_id,
            quantity,
            selection,
            special_id: None,
            created_at: chrono::Utc::now(),
        }
    }

    pub fn new_bundle_line(
        cart_id: Id,
        special_id: Id,
        product_id: Id,
        quantity: i64,
        selection: ParameterSelection,
    ) -> Self {
        Self {
            id: generate_id(),
            cart_id,
            product_id,
            quantity,
            selection,
            special_id: Some(special_id),
            created_at: chrono::Utc::now(),
        }
    }

    pub fn is_bundle_line(&self) -> bool {
        self.special_id.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_cart_is_active() {
        let cart = Cart::new(Identity::Guest("sess-1".to_string()));
        assert!(cart.is_active());
        assert_eq!(cart.status.as_str(), "active");
    }

    #[test]
    fn test_status_round_trip() {
        for status in [CartStatus::Active, CartStatus::CheckedOut] {
            assert_eq!(CartStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(CartStatus::parse("abandoned"), None);
    }
}
