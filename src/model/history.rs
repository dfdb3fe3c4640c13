use crate::model::{generate_id, Id};
use serde::{Deserialize, Serialize};

/// Who performed an audited action.
///
/// Attribution is mutually exclusive by construction: an admin, a user, or
/// the system itself. Never two at once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Actor {
    Admin(Id),
    User(Id),
    System,
}

impl Actor {
    pub fn admin_id(&self) -> Option<&Id> {
        match self {
            Actor::Admin(id) => Some(id),
            _ => None,
        }
    }

    pub fn user_id(&self) -> Option<&Id> {
        match self {
            Actor::User(id) => Some(id),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HistoryAction {
    Created,
    StatusChanged,
    Edited,
}

impl HistoryAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            HistoryAction::Created => "created",
            HistoryAction::StatusChanged => "status_changed",
            HistoryAction::Edited => "edited",
        }
    }
}

/// One row of the append-only audit trail.
///
/// Rows are immutable once written; no update or delete path exists
/// anywhere in the crate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub id: Id,
    pub entity_type: String,
    pub entity_id: Id,
    pub action: HistoryAction,
    pub field: Option<String>,
    pub old_value: Option<String>,
    pub new_value: Option<String>,
    pub actor: Actor,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl HistoryEntry {
    /// Summary row for a whole-entity action (e.g. order creation).
    pub fn created(entity_type: &str, entity_id: Id, new_value: &str, actor: Actor) -> Self {
        Self {
            id: generate_id(),
            entity_type: entity_type.to_string(),
            entity_id,
            action: HistoryAction::Created,
            field: None,
            old_value: None,
            new_value: Some(new_value.to_string()),
            actor,
            created_at: chrono::Utc::now(),
        }
    }

    /// One row per changed field.
    pub fn field_changed(
        entity_type: &str,
        entity_id: Id,
        action: HistoryAction,
        field: &str,
        old_value: &str,
        new_value: &str,
        actor: Actor,
    ) -> Self {
        Self {
            id: generate_id(),
            entity_type: entity_type.to_string(),
            entity_id,
            action,
            field: Some(field.to_string()),
            old_value: Some(old_value.to_string()),
            new_value: Some(new_value.to_string()),
            actor,
            created_at: chrono::Utc::now(),
        }
    }
}
