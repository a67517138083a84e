//! Caller identity used by the guarded method surface.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable identifier for a user account.
///
/// Kept as a type alias to make semantic intent explicit in signatures.
pub type UserId = Uuid;

/// Identity of the party issuing a method call.
///
/// Every method receives a `Caller` rather than a bare `UserId` so the
/// unauthenticated case stays representable: several operations must answer
/// with a specific error when no one is logged in, and the order of that
/// check relative to input validation is observable behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Caller {
    /// No authenticated session.
    Anonymous,
    /// Authenticated session for the given user.
    User(UserId),
}

impl Caller {
    /// Returns the authenticated user id, or `None` for anonymous callers.
    pub fn user_id(&self) -> Option<UserId> {
        match self {
            Self::Anonymous => None,
            Self::User(id) => Some(*id),
        }
    }

    /// Returns whether this caller is the given user.
    pub fn is_user(&self, user: &UserId) -> bool {
        matches!(self, Self::User(id) if id == user)
    }
}

impl From<UserId> for Caller {
    fn from(value: UserId) -> Self {
        Self::User(value)
    }
}
