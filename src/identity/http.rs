use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use url::Url;
use uuid::Uuid;

use super::{Account, IdentityError, IdentityStore};
use crate::config::IdentityConfig;
use crate::types::Role;

const ADMIN_USERS_PATH: &str = "auth/v1/admin/users";

/// Upper bound on listing pages; at the default page size this is ten
/// million accounts.
const MAX_PAGES: u32 = 10_000;

/// Identity store backed by the auth provider's admin REST API
pub struct HttpIdentityStore {
    base_url: Url,
    service_key: String,
    page_size: u32,
    client: Client,
}

/// One user record from the admin listing
#[derive(Debug, Deserialize)]
struct AdminUser {
    id: Uuid,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    user_metadata: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
struct AdminUserPage {
    #[serde(default)]
    users: Vec<AdminUser>,
}

impl From<AdminUser> for Account {
    fn from(user: AdminUser) -> Self {
        let role_hint = user
            .user_metadata
            .get("role")
            .and_then(Value::as_str)
            .map(str::to_string);

        Account {
            id: user.id,
            // The provider reports "" for accounts without an email
            email: user.email.filter(|e| !e.is_empty()),
            role_hint,
        }
    }
}

impl HttpIdentityStore {
    pub fn new(config: &IdentityConfig) -> Result<Self, IdentityError> {
        if config.service_key.is_empty() {
            return Err(IdentityError::NotConfigured("IDENTITY_SERVICE_KEY"));
        }

        // Url::join drops the last path segment unless it ends with '/'
        let mut base = config.url.trim_end_matches('/').to_string();
        base.push('/');
        let base_url = Url::parse(&base)?;

        let mut builder = Client::builder();
        if let Some(secs) = config.request_timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }

        Ok(Self {
            base_url,
            service_key: config.service_key.clone(),
            page_size: config.page_size.max(1),
            client: builder.build()?,
        })
    }

    /// Build an authenticated request against the admin API
    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        self.client
            .request(method, url)
            .header("apikey", &self.service_key)
            .bearer_auth(&self.service_key)
    }

    fn users_url(&self) -> Result<Url, IdentityError> {
        Ok(self.base_url.join(ADMIN_USERS_PATH)?)
    }

    async fn fetch_page(&self, page: u32) -> Result<Vec<AdminUser>, IdentityError> {
        let mut url = self.users_url()?;
        url.query_pairs_mut()
            .append_pair("page", &page.to_string())
            .append_pair("per_page", &self.page_size.to_string());

        let response = self.request(Method::GET, url).send().await?;
        let response = check_status(response).await?;
        let body: AdminUserPage = response.json().await?;
        Ok(body.users)
    }
}

/// Map non-success responses into `IdentityError::Status`
async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, IdentityError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<Value>(&body)
        .ok()
        .and_then(|v| {
            ["msg", "message", "error_description", "error"]
                .iter()
                .find_map(|key| v.get(*key).and_then(Value::as_str).map(str::to_string))
        })
        .unwrap_or_else(|| status.canonical_reason().unwrap_or("unknown error").to_string());

    Err(IdentityError::Status {
        status: status.as_u16(),
        message,
    })
}

#[async_trait]
impl IdentityStore for HttpIdentityStore {
    async fn list_accounts(&self) -> Result<Vec<Account>, IdentityError> {
        let mut accounts = Vec::new();
        let mut previous_first: Option<Uuid> = None;
        let mut page = 1;

        loop {
            let users = self.fetch_page(page).await?;
            let fetched = users.len();

            // A provider that ignores `page` returns the same full page forever
            let first = users.first().map(|u| u.id);
            if first.is_some() && first == previous_first {
                return Err(IdentityError::Pagination(format!(
                    "page {} repeats page {}",
                    page,
                    page - 1
                )));
            }
            previous_first = first;
            accounts.extend(users.into_iter().map(Account::from));

            if fetched < self.page_size as usize {
                break;
            }
            if page >= MAX_PAGES {
                return Err(IdentityError::Pagination(format!(
                    "more than {} pages of {} accounts",
                    MAX_PAGES, self.page_size
                )));
            }
            page += 1;
        }

        tracing::debug!("Listed {} accounts from identity provider", accounts.len());
        Ok(accounts)
    }

    async fn update_role_hint(&self, account_id: Uuid, role: Role) -> Result<(), IdentityError> {
        let url = self
            .base_url
            .join(&format!("{}/{}", ADMIN_USERS_PATH, account_id))?;
        let body = json!({ "user_metadata": { "role": role.as_str() } });

        let response = self.request(Method::PUT, url).json(&body).send().await?;
        check_status(response).await?;
        Ok(())
    }
}
