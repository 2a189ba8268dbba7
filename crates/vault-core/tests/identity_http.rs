//! Login against a local HTTP identity provider

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::Query;
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use serde_json::{json, Value};

use vault_core::{
    AuthMethod, AuthOutcome, IdentitySettings, MasterKey, MemoryStore, RecordStore, Settings,
    Vault,
};

const API_KEY: &str = "test-api-key";

/// Accepts `alice@passvault.test` with "provider-key", answers 503 for
/// `bob@passvault.test`, rejects everything else.
async fn sign_in(
    Query(query): Query<HashMap<String, String>>,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    if query.get("key").map(String::as_str) != Some(API_KEY) {
        return (StatusCode::FORBIDDEN, Json(json!({ "error": "bad key" })));
    }
    if body["returnSecureToken"] != json!(true) {
        return (StatusCode::BAD_REQUEST, Json(json!({ "error": "no token" })));
    }

    match (body["email"].as_str(), body["password"].as_str()) {
        (Some("alice@passvault.test"), Some("provider-key")) => (
            StatusCode::OK,
            Json(json!({ "localId": "remote-alice", "idToken": "token" })),
        ),
        (Some("bob@passvault.test"), _) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({ "error": "maintenance" })),
        ),
        _ => (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": { "message": "INVALID_PASSWORD" } })),
        ),
    }
}

async fn spawn_provider() -> SocketAddr {
    let app = Router::new().route("/v1/signIn", post(sign_in));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    addr
}

fn settings_for(addr: SocketAddr) -> Settings {
    Settings {
        identity: Some(IdentitySettings {
            endpoint: format!("http://{}/v1/signIn", addr),
            api_key: Some(API_KEY.to_string()),
            email_domain: "passvault.test".to_string(),
        }),
        ..Settings::default()
    }
}

async fn vault_with(settings: &Settings) -> Vault {
    let store: Arc<dyn RecordStore> = Arc::new(MemoryStore::new());
    let vault = Vault::new(store, settings).unwrap();

    vault
        .register("alice", &MasterKey::from("local-key"))
        .await
        .unwrap();
    vault
        .register("bob", &MasterKey::from("bob-local-key"))
        .await
        .unwrap();
    vault
}

#[tokio::test]
async fn test_provider_accepts() {
    let addr = spawn_provider().await;
    let vault = vault_with(&settings_for(addr)).await;

    let outcome = vault
        .login("alice", MasterKey::from("provider-key"))
        .await
        .unwrap();

    assert!(matches!(
        outcome,
        AuthOutcome::Authenticated {
            method: AuthMethod::IdentityProvider,
            ..
        }
    ));
    assert!(vault.is_authenticated().await);
}

#[tokio::test]
async fn test_provider_rejects_then_local_hash() {
    let addr = spawn_provider().await;
    let vault = vault_with(&settings_for(addr)).await;

    let outcome = vault
        .login("alice", MasterKey::from("local-key"))
        .await
        .unwrap();
    assert!(matches!(
        outcome,
        AuthOutcome::Authenticated {
            method: AuthMethod::LocalHash,
            ..
        }
    ));

    let outcome = vault
        .login("alice", MasterKey::from("neither-key"))
        .await
        .unwrap();
    assert_eq!(outcome, AuthOutcome::Rejected);
    assert!(!vault.is_authenticated().await);
}

#[tokio::test]
async fn test_provider_outage_falls_back() {
    let addr = spawn_provider().await;
    let vault = vault_with(&settings_for(addr)).await;

    let outcome = vault
        .login("bob", MasterKey::from("bob-local-key"))
        .await
        .unwrap();
    assert!(matches!(
        outcome,
        AuthOutcome::Authenticated {
            method: AuthMethod::LocalHash,
            ..
        }
    ));
}

#[tokio::test]
async fn test_unreachable_provider_falls_back() {
    // Reserve a port, then close it
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let vault = vault_with(&settings_for(addr)).await;

    let outcome = vault
        .login("alice", MasterKey::from("local-key"))
        .await
        .unwrap();
    assert!(matches!(
        outcome,
        AuthOutcome::Authenticated {
            method: AuthMethod::LocalHash,
            ..
        }
    ));

    let outcome = vault
        .login("alice", MasterKey::from("provider-key"))
        .await
        .unwrap();
    assert_eq!(outcome, AuthOutcome::Rejected);
}
