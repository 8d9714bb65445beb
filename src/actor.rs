//! # Acting Identity
//!
//! The identity/session layer (JWT, 2FA, SSO) lives outside this core; it
//! hands every request either an authenticated [`Actor`] or nothing at all.
//! Public share endpoints pass `None` until a token grants access.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An authenticated caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    /// Stable user identifier
    pub id: Uuid,

    /// Login name; doubles as the home directory name under the home base
    pub username: String,
}

impl Actor {
    pub fn new(id: Uuid, username: impl Into<String>) -> Self {
        Self {
            id,
            username: username.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_actor_construction() {
        let id = Uuid::new_v4();
        let actor = Actor::new(id, "alice");
        assert_eq!(actor.id, id);
        assert_eq!(actor.username, "alice");
    }
}
