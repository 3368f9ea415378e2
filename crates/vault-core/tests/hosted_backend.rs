//! Hosted backend wire behaviour against a mock HTTP server

use httpmock::prelude::*;
use serde_json::json;

use vault_core::api;
use vault_core::domain::{NewVault, Table};
use vault_core::repository::{Backend, Upload};
use vault_core::{ClientConfig, SupabaseBackend};

fn backend_for(server: &MockServer) -> SupabaseBackend {
    SupabaseBackend::new(&ClientConfig {
        supabase_url: server.base_url(),
        anon_key: "anon-key".into(),
        ..ClientConfig::default()
    })
}

#[tokio::test]
async fn test_threads_are_selected_with_filter_and_order() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/rest/v1/threads")
                .query_param("select", "*")
                .query_param("memory_id", "eq.m1")
                .query_param("order", "created_at.asc")
                .header("apikey", "anon-key")
                .header("Authorization", "Bearer anon-key");
            then.status(200).json_body(json!([
                {"id": "t2", "memory_id": "m1", "created_by": "u1", "content": "second", "created_at": "2024-01-02T00:00:00Z"},
                {"id": "t1", "memory_id": "m1", "created_by": "u1", "content": "first", "created_at": "2024-01-01T00:00:00Z"}
            ]));
        })
        .await;

    let backend = backend_for(&server);
    let threads = api::list_threads(&backend, "m1").await.into_result().unwrap();
    mock.assert_async().await;
    // re-sorted locally even when the server ignores the order
    let ids: Vec<_> = threads.iter().map(|t| t.id.as_str()).collect();
    assert_eq!(ids, vec!["t1", "t2"]);
}

#[tokio::test]
async fn test_create_vault_inserts_vault_then_owner() {
    let server = MockServer::start_async().await;
    let vaults = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/rest/v1/vaults")
                .header("Prefer", "return=representation")
                .json_body(json!({"name": "Family Stories", "creator_id": "u1", "theme": ["sepia"]}));
            then.status(201).json_body(json!([{
                "id": "v1",
                "name": "Family Stories",
                "creator_id": "u1",
                "theme": ["sepia"],
                "created_at": "2024-06-01T00:00:00Z"
            }]));
        })
        .await;
    let members = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/rest/v1/members")
                .json_body(json!({"vault_id": "v1", "user_id": "u1", "role": "owner"}));
            then.status(201).json_body(json!([
                {"id": "mem1", "vault_id": "v1", "user_id": "u1", "role": "owner"}
            ]));
        })
        .await;

    let backend = backend_for(&server);
    let vault = api::create_vault(&backend, NewVault::new("Family Stories", "u1"))
        .await
        .into_result()
        .unwrap();
    assert_eq!(vault.id, "v1");
    vaults.assert_async().await;
    members.assert_async().await;
}

#[tokio::test]
async fn test_row_level_security_error_is_surfaced() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/rest/v1/threads");
            then.status(403).json_body(json!({
                "code": "42501",
                "message": "new row violates row-level security policy for table \"threads\""
            }));
        })
        .await;

    let backend = backend_for(&server);
    let err = backend
        .insert(Table::Threads, json!({"memory_id": "m1", "content": "hi"}))
        .await
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "permission denied: new row violates row-level security policy for table \"threads\""
    );
}

#[tokio::test]
async fn test_upload_returns_public_url() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/storage/v1/object/photos/v1/5-beach.jpg")
                .header("x-upsert", "false")
                .header("cache-control", "max-age=3600")
                .header("Content-Type", "image/jpeg");
            then.status(200).json_body(json!({"Key": "photos/v1/5-beach.jpg"}));
        })
        .await;

    let backend = backend_for(&server);
    let url = backend
        .upload(Upload {
            bucket: "photos".into(),
            path: "v1/5-beach.jpg".into(),
            content_type: "image/jpeg".into(),
            bytes: vec![0xff, 0xd8, 0xff],
        })
        .await
        .unwrap();
    mock.assert_async().await;
    assert_eq!(
        url,
        format!("{}/storage/v1/object/public/photos/v1/5-beach.jpg", server.base_url())
    );
}

#[tokio::test]
async fn test_restore_session_creates_missing_profile() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/auth/v1/user")
                .header("Authorization", "Bearer user-jwt");
            then.status(200).json_body(json!({
                "id": "u42",
                "email": "june@example.com",
                "user_metadata": {"name": "June"}
            }));
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/rest/v1/users").query_param("id", "eq.u42");
            then.status(200).json_body(json!([]));
        })
        .await;
    let create = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/rest/v1/users")
                .json_body(json!({"id": "u42", "email": "june@example.com", "name": "June"}));
            then.status(201).json_body(json!([
                {"id": "u42", "email": "june@example.com", "name": "June", "avatar_url": null}
            ]));
        })
        .await;

    let backend = backend_for(&server);
    let session = api::restore_session(&backend, "user-jwt").await.into_result().unwrap();
    create.assert_async().await;
    assert_eq!(session.user.name, "June");
    assert_eq!(session.access_token.as_deref(), Some("user-jwt"));
    assert_eq!(backend.access_token().as_deref(), Some("user-jwt"));
}

#[tokio::test]
async fn test_account_without_email_signs_in_twice() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/auth/v1/user");
            then.status(200).json_body(json!({
                "id": "u9",
                "phone": "+15550100",
                "user_metadata": {"full_name": "Sam"}
            }));
        })
        .await;
    let missing = server
        .mock_async(|when, then| {
            when.method(GET).path("/rest/v1/users").query_param("id", "eq.u9");
            then.status(200).json_body(json!([]));
        })
        .await;
    let create = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/rest/v1/users")
                .json_body(json!({"id": "u9", "email": "", "name": "Sam"}));
            then.status(201).json_body(json!([
                {"id": "u9", "email": "", "name": "Sam", "avatar_url": null}
            ]));
        })
        .await;

    let backend = backend_for(&server);
    let first = api::restore_session(&backend, "phone-jwt").await.into_result().unwrap();
    assert_eq!(first.user.email, "");
    create.assert_hits_async(1).await;

    // the stored row must read back on the next visit
    missing.delete_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/rest/v1/users").query_param("id", "eq.u9");
            then.status(200).json_body(json!([
                {"id": "u9", "email": "", "name": "Sam", "avatar_url": null}
            ]));
        })
        .await;
    let second = api::restore_session(&backend, "phone-jwt").await.into_result().unwrap();
    assert_eq!(second.user.name, "Sam");
    create.assert_hits_async(1).await;
    assert_eq!(backend.access_token().as_deref(), Some("phone-jwt"));
}

#[tokio::test]
async fn test_rejected_token_is_forgotten() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/auth/v1/user");
            then.status(401).json_body(json!({"msg": "invalid JWT"}));
        })
        .await;

    let backend = backend_for(&server);
    let response = api::restore_session(&backend, "expired").await;
    assert_eq!(response.error(), Some("permission denied: invalid JWT"));
    assert_eq!(backend.access_token(), None);
}

#[tokio::test]
async fn test_vault_listing_endpoint() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/api/v1/vaults");
            then.status(200).json_body(json!({"vaults": [{
                "id": "v1",
                "name": "Family Stories",
                "creator_id": "u1",
                "theme": ["sepia"],
                "created_at": "2024-06-01T00:00:00Z"
            }]}));
        })
        .await;

    let vaults = api::fetch_vault_listing(&server.base_url()).await.into_result().unwrap();
    assert_eq!(vaults.len(), 1);
    assert_eq!(vaults[0].name, "Family Stories");
}

#[tokio::test]
async fn test_vault_listing_failure_is_generic() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/api/v1/vaults");
            then.status(500).body("boom");
        })
        .await;

    let response = api::fetch_vault_listing(&server.base_url()).await;
    assert_eq!(response.error(), Some(api::LISTING_FAILED));
}
