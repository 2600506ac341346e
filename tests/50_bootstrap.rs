use anyhow::Result;
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use subtrack_api::config::BootstrapConfig;
use subtrack_api::services::{BootstrapResult, BootstrapTrigger, TriggerState};

fn settings(fallback: Option<&str>) -> BootstrapConfig {
    BootstrapConfig {
        enabled: true,
        delay_ms: 10,
        endpoint: "/ensure-admin".to_string(),
        fallback_endpoint: fallback.map(str::to_string),
    }
}

#[tokio::test]
async fn primary_success_reconciles_once() -> Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/ensure-admin"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "message": "Granted admin role to admin@example.com",
            "timestamp": "2024-05-01T12:00:00Z"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let trigger = BootstrapTrigger::new(&server.uri(), &settings(None));
    let handle = trigger.fire().expect("first fire spawns");
    assert!(trigger.fire().is_none());

    let result = handle.await?;
    assert_eq!(
        result,
        BootstrapResult::Reconciled {
            message: "Granted admin role to admin@example.com".to_string()
        }
    );
    assert_eq!(trigger.state(), TriggerState::Done);
    assert!(trigger.fire().is_none());
    Ok(())
}

#[tokio::test]
async fn falls_back_after_primary_failure() -> Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/ensure-admin"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({
            "success": false,
            "message": "failed to list accounts: identity provider unavailable"
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/fix-admin"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "message": "admin@example.com already holds the admin role"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let trigger = BootstrapTrigger::new(&server.uri(), &settings(Some("/fix-admin")));
    let result = trigger.fire().expect("spawned").await?;

    assert!(matches!(result, BootstrapResult::ReconciledByFallback { .. }));
    assert_eq!(trigger.state(), TriggerState::Done);
    Ok(())
}

#[tokio::test]
async fn failure_without_fallback_is_reported_not_raised() -> Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/ensure-admin"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({
            "success": false,
            "message": "failed to update profile role"
        })))
        .mount(&server)
        .await;

    let trigger = BootstrapTrigger::new(&server.uri(), &settings(None));
    let result = trigger.fire().expect("spawned").await?;

    match result {
        BootstrapResult::Failed { reason } => assert!(reason.contains("failed to update profile role")),
        other => panic!("unexpected result: {:?}", other),
    }
    assert_eq!(trigger.state(), TriggerState::Done);
    Ok(())
}

#[tokio::test]
async fn success_false_in_a_200_body_counts_as_failure() -> Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/ensure-admin"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": false,
            "message": "not yet"
        })))
        .mount(&server)
        .await;

    let trigger = BootstrapTrigger::new(&server.uri(), &settings(None));
    let result = trigger.fire().expect("spawned").await?;

    assert!(matches!(result, BootstrapResult::Failed { .. }));
    Ok(())
}
