use anyhow::Result;
use serde_json::{json, Value};
use uuid::Uuid;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use subtrack_api::config::IdentityConfig;
use subtrack_api::identity::{HttpIdentityStore, IdentityError, IdentityStore};
use subtrack_api::types::Role;

const SERVICE_KEY: &str = "service-role-key";

fn store_for(server: &MockServer, page_size: u32) -> HttpIdentityStore {
    let config = IdentityConfig {
        url: server.uri(),
        service_key: SERVICE_KEY.to_string(),
        page_size,
        request_timeout_secs: Some(5),
    };
    HttpIdentityStore::new(&config).expect("store")
}

fn user(n: u128, email: &str) -> Value {
    json!({
        "id": Uuid::from_u128(n).to_string(),
        "email": email,
        "user_metadata": {}
    })
}

#[tokio::test]
async fn lists_every_page_with_service_credentials() -> Result<()> {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/auth/v1/admin/users"))
        .and(query_param("page", "1"))
        .and(query_param("per_page", "2"))
        .and(header("apikey", SERVICE_KEY))
        .and(header("authorization", format!("Bearer {}", SERVICE_KEY).as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "users": [user(1, "a@example.com"), user(2, "b@example.com")]
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/auth/v1/admin/users"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "users": [user(42, "admin@example.com")]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let accounts = store_for(&server, 2).list_accounts().await?;

    assert_eq!(accounts.len(), 3);
    assert_eq!(accounts[2].id, Uuid::from_u128(42));
    assert!(accounts[2].has_email("admin@example.com"));
    Ok(())
}

#[tokio::test]
async fn listing_stops_when_provider_ignores_page() -> Result<()> {
    let server = MockServer::start().await;

    // Same full page regardless of the page parameter
    Mock::given(method("GET"))
        .and(path("/auth/v1/admin/users"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "users": [user(1, "a@example.com"), user(2, "b@example.com")]
        })))
        .expect(2)
        .mount(&server)
        .await;

    let result = store_for(&server, 2).list_accounts().await;

    assert!(matches!(result, Err(IdentityError::Pagination(_))), "{:?}", result);
    Ok(())
}

#[tokio::test]
async fn error_status_carries_provider_message() -> Result<()> {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/auth/v1/admin/users"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({ "msg": "Invalid API key" })))
        .mount(&server)
        .await;

    let err = store_for(&server, 50).list_accounts().await.unwrap_err();

    match err {
        IdentityError::Status { status, message } => {
            assert_eq!(status, 401);
            assert_eq!(message, "Invalid API key");
        }
        other => panic!("unexpected error: {:?}", other),
    }
    Ok(())
}

#[tokio::test]
async fn update_puts_role_into_user_metadata() -> Result<()> {
    let server = MockServer::start().await;
    let id = Uuid::from_u128(42);

    Mock::given(method("PUT"))
        .and(path(format!("/auth/v1/admin/users/{}", id)))
        .and(header("apikey", SERVICE_KEY))
        .and(body_json(json!({ "user_metadata": { "role": "admin" } })))
        .respond_with(ResponseTemplate::new(200).set_body_json(user(42, "admin@example.com")))
        .expect(1)
        .mount(&server)
        .await;

    store_for(&server, 50).update_role_hint(id, Role::Admin).await?;
    Ok(())
}

#[tokio::test]
async fn update_of_unknown_account_is_an_error() -> Result<()> {
    let server = MockServer::start().await;

    Mock::given(method("PUT"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({ "msg": "User not found" })))
        .mount(&server)
        .await;

    let result = store_for(&server, 50)
        .update_role_hint(Uuid::from_u128(9), Role::Admin)
        .await;

    assert!(matches!(result, Err(IdentityError::Status { status: 404, .. })));
    Ok(())
}
