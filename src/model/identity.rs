use crate::model::history::Actor;
use crate::model::Id;
use serde::{Deserialize, Serialize};

/// Resolved request identity: an authenticated user or a guest session.
///
/// Exactly one of the two is present for any request; the core never
/// authenticates, it only branches on which variant the caller resolved.
/// The same type doubles as the cart owner, so "one active cart per
/// identity" is a single lookup key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Identity {
    /// Authenticated user id.
    User(Id),
    /// Anonymous guest session id.
    Guest(Id),
}

impl Identity {
    pub fn is_user(&self) -> bool {
        matches!(self, Identity::User(_))
    }

    /// Attribution for audit rows created on behalf of this identity.
    /// Guest actions are recorded as system-generated, since a session id is
    /// not a stable accountable party.
    pub fn actor(&self) -> Actor {
        match self {
            Identity::User(id) => Actor::User(id.clone()),
            Identity::Guest(_) => Actor::System,
        }
    }

    pub fn key(&self) -> &Id {
        match self {
            Identity::User(id) | Identity::Guest(id) => id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_guest_actions_attribute_to_system() {
        let guest = Identity::Guest("sess-1".to_string());
        assert_eq!(guest.actor(), Actor::System);

        let user = Identity::User("user-1".to_string());
        assert_eq!(user.actor(), Actor::User("user-1".to_string()));
    }
}
