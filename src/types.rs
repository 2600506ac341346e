/// Shared types used across the codebase

use serde::{Deserialize, Serialize};
use std::fmt;

/// Account roles. Stored lowercase in `profiles.role` and in the identity
/// provider's `user_metadata.role` hint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Subcontractor,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Subcontractor => "subcontractor",
        }
    }

    /// True when a stored role string names this role exactly.
    pub fn matches(&self, stored: &str) -> bool {
        stored == self.as_str()
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
