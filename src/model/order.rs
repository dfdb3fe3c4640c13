use crate::error::StoreError;
use crate::model::selection::ParameterSelection;
use crate::model::{generate_id, Id, Identity};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    #[default]
    Pending,
    Processing,
    Shipped,
    Completed,
    Cancelled,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Processing => "processing",
            OrderStatus::Shipped => "shipped",
            OrderStatus::Completed => "completed",
            OrderStatus::Cancelled => "cancelled",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(OrderStatus::Pending),
            "processing" => Some(OrderStatus::Processing),
            "shipped" => Some(OrderStatus::Shipped),
            "completed" => Some(OrderStatus::Completed),
            "cancelled" => Some(OrderStatus::Cancelled),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Completed | OrderStatus::Cancelled)
    }
}

/// Buyer contact details captured at checkout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContactDetails {
    pub name: String,
    pub phone: String,
    pub secondary_phone: Option<String>,
    pub address: String,
}

impl ContactDetails {
    /// Rejects missing required fields and malformed phone numbers before
    /// any write happens.
    pub fn validate(&self) -> Result<(), StoreError> {
        if self.name.trim().is_empty() {
            return Err(StoreError::validation("name is required"));
        }
        if self.address.trim().is_empty() {
            return Err(StoreError::validation("address is required"));
        }
        validate_phone(&self.phone)?;
        if let Some(secondary) = &self.secondary_phone {
            validate_phone(secondary)?;
        }
        Ok(())
    }
}

fn validate_phone(phone: &str) -> Result<(), StoreError> {
    let digits: String = phone
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '-' && *c != '(' && *c != ')')
        .collect();
    let rest = digits.strip_prefix('+').unwrap_or(&digits);
    if rest.len() < 6 || rest.len() > 15 || !rest.chars().all(|c| c.is_ascii_digit()) {
        return Err(StoreError::validation(format!(
            "malformed phone number: '{}'",
            phone
        )));
    }
    Ok(())
}

/// An immutable record of a checkout.
///
/// `total_price` is frozen at creation from the live calculator; nothing
/// ever recomputes it from the catalog afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: Id,
    pub cart_id: Id,
    pub buyer: Identity,
    pub name: String,
    pub phone: String,
    pub secondary_phone: Option<String>,
    pub address: String,
    pub total_price: i64,
    pub status: OrderStatus,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

impl Order {
    pub fn new(cart_id: Id, buyer: Identity, contact: ContactDetails, total_price: i64) -> Self {
        let now = chrono::Utc::now();
        Self {
            id: generate_id(),
            cart_id,
            buyer,
            name: contact.name,
            phone: contact.phone,
            secondary_phone: contact.secondary_phone,
            address: contact.address,
            total_price,
            status: OrderStatus::Pending,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Snapshot of one cart line at checkout: product name, unit price and
/// selection as they were, independent of later catalog edits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderLine {
    pub id: Id,
    pub order_id: Id,
    pub product_id: Id,
    pub product_name: String,
    pub quantity: i64,
    pub unit_price: i64,
    pub selection: ParameterSelection,
    pub special_id: Option<Id>,
}

impl OrderLine {
    pub fn line_total(&self) -> i64 {
        self.unit_price * self.quantity
    }
}
