mod common;

use anyhow::Result;
use chrono::DateTime;
use reqwest::StatusCode;
use serde_json::Value;
use subtrack_api::testing::{MemoryIdentityStore, MemoryProfileStore};
use uuid::Uuid;

use common::{account, profile, TestServer, ADMIN_EMAIL};

async fn ensure_admin(server: &TestServer) -> Result<(StatusCode, Value)> {
    let res = reqwest::get(server.url("/ensure-admin")).await?;
    let status = res.status();
    Ok((status, res.json::<Value>().await?))
}

fn assert_envelope(body: &Value) {
    assert!(body["message"].is_string(), "missing message: {}", body);
    let timestamp = body["timestamp"].as_str().expect("timestamp string");
    assert!(DateTime::parse_from_rfc3339(timestamp).is_ok(), "bad timestamp: {}", timestamp);
}

#[tokio::test]
async fn promotes_designated_subcontractor() -> Result<()> {
    let id = Uuid::from_u128(42);
    let server = TestServer::spawn(
        MemoryIdentityStore::with_accounts(vec![account(id, ADMIN_EMAIL, None)]),
        MemoryProfileStore::with_profiles(vec![profile(id, "subcontractor")]),
    )
    .await?;

    let (status, body) = ensure_admin(&server).await?;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_envelope(&body);
    assert_eq!(server.profiles.role_of(id).as_deref(), Some("admin"));
    assert_eq!(server.profiles.update_count(), 1);
    assert_eq!(server.identity.role_hint_of(id).as_deref(), Some("admin"));
    Ok(())
}

#[tokio::test]
async fn repeated_calls_are_idempotent() -> Result<()> {
    let id = Uuid::from_u128(42);
    let server = TestServer::spawn(
        MemoryIdentityStore::with_accounts(vec![account(id, ADMIN_EMAIL, None)]),
        MemoryProfileStore::with_profiles(vec![profile(id, "subcontractor")]),
    )
    .await?;

    let (first, _) = ensure_admin(&server).await?;
    let row_after_first = server.profiles.get(id);
    let (second, body) = ensure_admin(&server).await?;

    assert_eq!(first, StatusCode::OK);
    assert_eq!(second, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(server.profiles.get(id), row_after_first);
    assert_eq!(server.profiles.update_count(), 1);
    assert_eq!(server.identity.update_count(), 1);
    Ok(())
}

#[tokio::test]
async fn no_matching_account_makes_no_writes() -> Result<()> {
    let crew = Uuid::from_u128(7);
    let server = TestServer::spawn(
        MemoryIdentityStore::with_accounts(vec![account(crew, "crew@example.com", None)]),
        MemoryProfileStore::with_profiles(vec![profile(crew, "subcontractor")]),
    )
    .await?;

    let (status, body) = ensure_admin(&server).await?;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(server.profiles.update_count(), 0);
    assert_eq!(server.identity.update_count(), 0);
    Ok(())
}

#[tokio::test]
async fn metadata_failure_still_succeeds() -> Result<()> {
    let id = Uuid::from_u128(42);
    let server = TestServer::spawn(
        MemoryIdentityStore::with_accounts(vec![account(id, ADMIN_EMAIL, None)]),
        MemoryProfileStore::with_profiles(vec![profile(id, "subcontractor")]),
    )
    .await?;
    server.identity.fail_update(true);

    let (status, body) = ensure_admin(&server).await?;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    let message = body["message"].as_str().unwrap_or_default();
    assert!(message.contains("metadata"), "message should mention metadata: {}", message);
    assert_eq!(server.profiles.role_of(id).as_deref(), Some("admin"));
    Ok(())
}

#[tokio::test]
async fn admin_profile_with_missing_hint_syncs_metadata_only() -> Result<()> {
    let id = Uuid::from_u128(42);
    let server = TestServer::spawn(
        MemoryIdentityStore::with_accounts(vec![account(id, ADMIN_EMAIL, None)]),
        MemoryProfileStore::with_profiles(vec![profile(id, "admin")]),
    )
    .await?;

    let (status, body) = ensure_admin(&server).await?;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    let message = body["message"].as_str().unwrap_or_default();
    assert!(message.contains("metadata role hint synced"), "unexpected message: {}", message);
    assert_eq!(server.profiles.update_count(), 0);
    assert_eq!(server.identity.update_count(), 1);
    assert_eq!(server.identity.role_hint_of(id).as_deref(), Some("admin"));
    Ok(())
}

#[tokio::test]
async fn identity_outage_returns_500_without_writes() -> Result<()> {
    let id = Uuid::from_u128(42);
    let server = TestServer::spawn(
        MemoryIdentityStore::with_accounts(vec![account(id, ADMIN_EMAIL, None)]),
        MemoryProfileStore::with_profiles(vec![profile(id, "subcontractor")]),
    )
    .await?;
    server.identity.fail_list(true);

    let (status, body) = ensure_admin(&server).await?;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["success"], false);
    assert_envelope(&body);
    assert_eq!(server.profiles.update_count(), 0);
    assert_eq!(server.identity.update_count(), 0);
    assert_eq!(server.profiles.role_of(id).as_deref(), Some("subcontractor"));
    Ok(())
}

#[tokio::test]
async fn profile_write_failure_returns_500() -> Result<()> {
    let id = Uuid::from_u128(42);
    let server = TestServer::spawn(
        MemoryIdentityStore::with_accounts(vec![account(id, ADMIN_EMAIL, None)]),
        MemoryProfileStore::with_profiles(vec![profile(id, "subcontractor")]),
    )
    .await?;
    server.profiles.fail_update(true);

    let (status, body) = ensure_admin(&server).await?;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["success"], false);
    assert_eq!(server.identity.update_count(), 0);
    Ok(())
}

#[tokio::test]
async fn query_parameters_cannot_redirect_the_target() -> Result<()> {
    let admin = Uuid::from_u128(42);
    let crew = Uuid::from_u128(43);
    let server = TestServer::spawn(
        MemoryIdentityStore::with_accounts(vec![
            account(admin, ADMIN_EMAIL, Some("admin")),
            account(crew, "crew@example.com", None),
        ]),
        MemoryProfileStore::with_profiles(vec![profile(admin, "admin"), profile(crew, "subcontractor")]),
    )
    .await?;

    let res = reqwest::get(server.url("/ensure-admin?email=crew@example.com")).await?;

    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(server.profiles.role_of(crew).as_deref(), Some("subcontractor"));
    assert_eq!(server.profiles.update_count(), 0);
    Ok(())
}
