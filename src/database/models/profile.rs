use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::types::Role;

/// One row of the `profiles` table. Rows are created by the signup flow;
/// `id` equals the identity provider's account id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Profile {
    pub id: Uuid,
    pub company_name: Option<String>,
    pub contact_person: Option<String>,
    pub phone_number: Option<String>,
    pub address: Option<String>,
    pub role: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Profile {
    pub fn has_role(&self, role: Role) -> bool {
        role.matches(&self.role)
    }
}
