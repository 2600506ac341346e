//! In-memory identity and profile stores with failure switches.
//!
//! Compiled for unit tests and behind the `testing` feature, which the
//! integration suite under `tests/` enables.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use uuid::Uuid;

use crate::database::{Profile, ProfileStore, ProfileStoreError};
use crate::identity::{Account, IdentityError, IdentityStore};
use crate::types::Role;

pub fn account(id: Uuid, email: &str, role_hint: Option<&str>) -> Account {
    Account {
        id,
        email: Some(email.to_string()),
        role_hint: role_hint.map(str::to_string),
    }
}

pub fn profile(id: Uuid, role: &str) -> Profile {
    let signup: DateTime<Utc> = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    Profile {
        id,
        company_name: Some("Acme Framing".to_string()),
        contact_person: Some("Pat Doe".to_string()),
        phone_number: None,
        address: None,
        role: role.to_string(),
        created_at: signup,
        updated_at: signup,
    }
}

#[derive(Default)]
pub struct MemoryIdentityStore {
    accounts: Mutex<Vec<Account>>,
    fail_list: AtomicBool,
    fail_update: AtomicBool,
    updates: AtomicUsize,
}

impl MemoryIdentityStore {
    pub fn with_accounts(accounts: Vec<Account>) -> Self {
        Self {
            accounts: Mutex::new(accounts),
            ..Default::default()
        }
    }

    pub fn fail_list(&self, fail: bool) {
        self.fail_list.store(fail, Ordering::SeqCst);
    }

    pub fn fail_update(&self, fail: bool) {
        self.fail_update.store(fail, Ordering::SeqCst);
    }

    /// Successful metadata writes so far
    pub fn update_count(&self) -> usize {
        self.updates.load(Ordering::SeqCst)
    }

    pub fn role_hint_of(&self, id: Uuid) -> Option<String> {
        let accounts = self.accounts.lock().unwrap();
        accounts
            .iter()
            .find(|a| a.id == id)
            .and_then(|a| a.role_hint.clone())
    }
}

#[async_trait]
impl IdentityStore for MemoryIdentityStore {
    async fn list_accounts(&self) -> Result<Vec<Account>, IdentityError> {
        if self.fail_list.load(Ordering::SeqCst) {
            return Err(IdentityError::Status {
                status: 503,
                message: "identity provider unavailable".to_string(),
            });
        }
        Ok(self.accounts.lock().unwrap().clone())
    }

    async fn update_role_hint(&self, account_id: Uuid, role: Role) -> Result<(), IdentityError> {
        if self.fail_update.load(Ordering::SeqCst) {
            return Err(IdentityError::Status {
                status: 500,
                message: "metadata update rejected".to_string(),
            });
        }

        let mut accounts = self.accounts.lock().unwrap();
        let account = accounts
            .iter_mut()
            .find(|a| a.id == account_id)
            .ok_or_else(|| IdentityError::Status {
                status: 404,
                message: "User not found".to_string(),
            })?;
        account.role_hint = Some(role.as_str().to_string());
        self.updates.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[derive(Default)]
pub struct MemoryProfileStore {
    rows: Mutex<HashMap<Uuid, Profile>>,
    fail_read: AtomicBool,
    fail_update: AtomicBool,
    fail_ping: AtomicBool,
    updates: AtomicUsize,
}

impl MemoryProfileStore {
    pub fn with_profiles(profiles: Vec<Profile>) -> Self {
        Self {
            rows: Mutex::new(profiles.into_iter().map(|p| (p.id, p)).collect()),
            ..Default::default()
        }
    }

    pub fn fail_read(&self, fail: bool) {
        self.fail_read.store(fail, Ordering::SeqCst);
    }

    pub fn fail_update(&self, fail: bool) {
        self.fail_update.store(fail, Ordering::SeqCst);
    }

    pub fn fail_ping(&self, fail: bool) {
        self.fail_ping.store(fail, Ordering::SeqCst);
    }

    /// Successful role updates so far
    pub fn update_count(&self) -> usize {
        self.updates.load(Ordering::SeqCst)
    }

    pub fn get(&self, id: Uuid) -> Option<Profile> {
        self.rows.lock().unwrap().get(&id).cloned()
    }

    pub fn role_of(&self, id: Uuid) -> Option<String> {
        self.get(id).map(|p| p.role)
    }
}

#[async_trait]
impl ProfileStore for MemoryProfileStore {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Profile>, ProfileStoreError> {
        if self.fail_read.load(Ordering::SeqCst) {
            return Err(ProfileStoreError::Sqlx(sqlx::Error::PoolTimedOut));
        }
        Ok(self.get(id))
    }

    async fn update_role(
        &self,
        id: Uuid,
        role: Role,
        updated_at: DateTime<Utc>,
    ) -> Result<(), ProfileStoreError> {
        if self.fail_update.load(Ordering::SeqCst) {
            return Err(ProfileStoreError::Sqlx(sqlx::Error::PoolTimedOut));
        }

        let mut rows = self.rows.lock().unwrap();
        let row = rows.get_mut(&id).ok_or(ProfileStoreError::NotFound(id))?;
        row.role = role.as_str().to_string();
        row.updated_at = updated_at;
        self.updates.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn ping(&self) -> Result<(), ProfileStoreError> {
        if self.fail_ping.load(Ordering::SeqCst) {
            return Err(ProfileStoreError::Sqlx(sqlx::Error::PoolClosed));
        }
        Ok(())
    }
}
