//! End-to-end publish flows against a mocked LinkedIn API
//!
//! The real token manager, media orchestrator and publisher run on top of
//! the LinkedIn adapters; wiremock stands in for both the API and OAuth
//! hosts.

mod support;

use std::time::{Duration, Instant};

use chrono::Utc;
use serde_json::{json, Value};
use socialpub_core::TokenStore;
use socialpub_domain::constants::MAX_TOKEN_LIFETIME_SECS;
use socialpub_domain::{MediaAsset, MediaStatus, PostDraft, PublishError, Visibility};
use support::{credential, Stack, AUTHOR_URN, SUBJECT};
use wiremock::matchers::{body_string_contains, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const ASSET_URN: &str = "urn:li:digitalmediaAsset:asset-1";

fn created(post_id: &str) -> ResponseTemplate {
    ResponseTemplate::new(201).insert_header("x-restli-id", post_id)
}

fn token_body(access: &str, refresh: &str) -> Value {
    json!({
        "access_token": access,
        "expires_in": 3600,
        "refresh_token": refresh,
        "scope": "openid,w_member_social"
    })
}

async fn ugc_post_requests(server: &MockServer) -> Vec<wiremock::Request> {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .into_iter()
        .filter(|r| r.url.path() == "/v2/ugcPosts")
        .collect()
}

async fn mount_register_upload(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/v2/assets"))
        .and(query_param("action", "registerUpload"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "value": {
                "asset": ASSET_URN,
                "uploadMechanism": {
                    "com.linkedin.digitalmedia.uploading.MediaUploadHttpRequest": {
                        "uploadUrl": format!("{}/upload/asset-1", server.uri()),
                        "headers": { "x-upload-token": "signed" }
                    }
                }
            }
        })))
        .expect(1)
        .mount(server)
        .await;

    Mock::given(method("PUT"))
        .and(path("/upload/asset-1"))
        .and(header("x-upload-token", "signed"))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(server)
        .await;
}

fn asset_state(state: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "recipes": [{ "recipe": "urn:li:digitalmediaRecipe:feedshare-image", "status": state }]
    }))
}

#[tokio::test]
async fn text_post_is_sent_with_protocol_headers() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v2/ugcPosts"))
        .and(header("authorization", "Bearer access-1"))
        .and(header("x-restli-protocol-version", "2.0.0"))
        .and(header("x-idempotency-key", "launch-1"))
        .respond_with(created("urn:li:share:100"))
        .expect(1)
        .mount(&server)
        .await;

    let stack = Stack::new(&server, Some(credential("access-1", 3600, Some("refresh-1")))).await;
    let mut draft = PostDraft::new("Launch day")
        .with_visibility(Visibility::ConnectionsOnly)
        .with_idempotency_key("launch-1");

    let result = stack.publisher.publish(&mut draft, SUBJECT).await.unwrap();
    assert_eq!(result.remote_post_id(), "urn:li:share:100");

    let requests = ugc_post_requests(&server).await;
    let body: Value = requests[0].body_json().unwrap();
    assert_eq!(body["author"], AUTHOR_URN);
    assert_eq!(body["lifecycleState"], "PUBLISHED");
    assert_eq!(
        body["specificContent"]["com.linkedin.ugc.ShareContent"]["shareCommentary"]["text"],
        "Launch day"
    );
    assert_eq!(body["specificContent"]["com.linkedin.ugc.ShareContent"]["shareMediaCategory"], "NONE");
    assert_eq!(body["visibility"]["com.linkedin.ugc.MemberNetworkVisibility"], "CONNECTIONS");
}

#[tokio::test]
async fn post_id_falls_back_to_response_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v2/ugcPosts"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "id": "urn:li:share:7" })))
        .mount(&server)
        .await;

    let stack = Stack::new(&server, Some(credential("access-1", 3600, None))).await;
    let result = stack.publisher.publish(&mut PostDraft::new("hi"), SUBJECT).await.unwrap();

    assert_eq!(result.remote_post_id(), "urn:li:share:7");
}

#[tokio::test]
async fn transient_post_failures_are_retried() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v2/ugcPosts"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(2)
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v2/ugcPosts"))
        .respond_with(created("urn:li:share:200"))
        .expect(1)
        .mount(&server)
        .await;

    let stack = Stack::new(&server, Some(credential("access-1", 3600, Some("refresh-1")))).await;
    let mut draft = PostDraft::new("Third time lucky").with_idempotency_key("retry-1");

    let started = Instant::now();
    let result = stack.publisher.publish(&mut draft, SUBJECT).await.unwrap();
    let elapsed = started.elapsed();
    assert_eq!(result.remote_post_id(), "urn:li:share:200");

    // Backoff of the un-jittered test policy: 20ms, then 40ms.
    assert!(elapsed >= Duration::from_millis(60), "retried too early: {elapsed:?}");
    assert!(elapsed < Duration::from_secs(2), "backoff overshot: {elapsed:?}");

    // Every attempt carried the same key.
    let requests = ugc_post_requests(&server).await;
    assert_eq!(requests.len(), 3);
    assert!(requests.iter().all(|r| r.headers.get("x-idempotency-key").unwrap() == "retry-1"));
}

#[tokio::test]
async fn replayed_key_does_not_post_twice() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v2/ugcPosts"))
        .respond_with(created("urn:li:share:300"))
        .expect(1)
        .mount(&server)
        .await;

    let stack = Stack::new(&server, Some(credential("access-1", 3600, None))).await;
    let first = stack
        .publisher
        .publish(&mut PostDraft::new("once").with_idempotency_key("k"), SUBJECT)
        .await
        .unwrap();
    let second = stack
        .publisher
        .publish(&mut PostDraft::new("once").with_idempotency_key("k"), SUBJECT)
        .await
        .unwrap();

    assert_eq!(first, second);
    assert_eq!(stack.ledger.len(), 1);
}

#[tokio::test]
async fn image_post_registers_uploads_and_waits_for_processing() {
    let server = MockServer::start().await;
    mount_register_upload(&server).await;
    Mock::given(method("GET"))
        .and(path("/v2/assets/asset-1"))
        .respond_with(asset_state("PROCESSING"))
        .up_to_n_times(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v2/assets/asset-1"))
        .respond_with(asset_state("AVAILABLE"))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v2/ugcPosts"))
        .respond_with(created("urn:li:share:400"))
        .expect(1)
        .mount(&server)
        .await;

    let stack = Stack::new(&server, Some(credential("access-1", 3600, None))).await;
    stack.media_file("photo.png", b"\x89PNG fake image bytes");
    let mut draft = PostDraft::new("Look at this").with_media(MediaAsset::image("photo.png"));

    let result = stack.publisher.publish(&mut draft, SUBJECT).await.unwrap();

    assert_eq!(result.remote_post_id(), "urn:li:share:400");
    assert_eq!(draft.media[0].status(), MediaStatus::Ready);
    assert_eq!(draft.media[0].remote_asset_id(), Some(ASSET_URN));

    let uploads: Vec<_> = server
        .received_requests()
        .await
        .unwrap()
        .into_iter()
        .filter(|r| r.url.path() == "/upload/asset-1")
        .collect();
    assert_eq!(uploads[0].body, b"\x89PNG fake image bytes");
    assert_eq!(uploads[0].headers.get("content-type").unwrap(), "image/png");

    let body: Value = ugc_post_requests(&server).await[0].body_json().unwrap();
    let share = &body["specificContent"]["com.linkedin.ugc.ShareContent"];
    assert_eq!(share["shareMediaCategory"], "IMAGE");
    assert_eq!(share["media"][0]["media"], ASSET_URN);
    assert_eq!(share["media"][0]["status"], "READY");
}

#[tokio::test]
async fn failed_processing_never_creates_the_post() {
    let server = MockServer::start().await;
    mount_register_upload(&server).await;
    Mock::given(method("GET"))
        .and(path("/v2/assets/asset-1"))
        .respond_with(asset_state("PROCESSING"))
        .up_to_n_times(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v2/assets/asset-1"))
        .respond_with(asset_state("FAILED"))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v2/ugcPosts"))
        .respond_with(created("urn:li:share:never"))
        .expect(0)
        .mount(&server)
        .await;

    let stack = Stack::new(&server, Some(credential("access-1", 3600, None))).await;
    stack.media_file("photo.png", b"image");
    let mut draft = PostDraft::new("doomed").with_media(MediaAsset::image("photo.png"));

    let err = stack.publisher.publish(&mut draft, SUBJECT).await.unwrap_err();

    assert!(
        matches!(err, PublishError::MediaProcessingFailed { index: 0, ref asset_id, .. } if asset_id == ASSET_URN),
        "unexpected error: {err:?}"
    );
    assert_eq!(draft.media[0].status(), MediaStatus::Failed);
}

#[tokio::test]
async fn rejected_token_is_refreshed_once_and_post_retried() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v2/ugcPosts"))
        .and(header("authorization", "Bearer stale"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "status": 401,
            "message": "Invalid access token"
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/oauth/v2/accessToken"))
        .and(body_string_contains("grant_type=refresh_token"))
        .and(body_string_contains("refresh_token=refresh-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(token_body("fresh", "refresh-2")))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v2/ugcPosts"))
        .and(header("authorization", "Bearer fresh"))
        .respond_with(created("urn:li:share:500"))
        .expect(1)
        .mount(&server)
        .await;

    // Locally the token still looks valid; only the platform knows better.
    let stack = Stack::new(&server, Some(credential("stale", 3600, Some("refresh-1")))).await;

    let result = stack.publisher.publish(&mut PostDraft::new("hi"), SUBJECT).await.unwrap();
    assert_eq!(result.remote_post_id(), "urn:li:share:500");

    let stored = stack.store.get(SUBJECT).await.unwrap().unwrap();
    assert_eq!(stored.access_token, "fresh");
    assert_eq!(stored.refresh_token.as_deref(), Some("refresh-2"));
    assert_eq!(stored.external_urn.as_deref(), Some(AUTHOR_URN));
}

#[tokio::test]
async fn oversized_token_lifetime_is_clamped_on_refresh() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/oauth/v2/accessToken"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "forever",
            "expires_in": 9_999_999_999_999_999_i64,
            "refresh_token": "refresh-2"
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v2/ugcPosts"))
        .and(header("authorization", "Bearer forever"))
        .respond_with(created("urn:li:share:600"))
        .expect(1)
        .mount(&server)
        .await;

    let stack = Stack::new(&server, Some(credential("expired", -60, Some("refresh-1")))).await;

    let result = stack.publisher.publish(&mut PostDraft::new("hi"), SUBJECT).await.unwrap();
    assert_eq!(result.remote_post_id(), "urn:li:share:600");

    let stored = stack.store.get(SUBJECT).await.unwrap().unwrap();
    let limit = Utc::now() + chrono::Duration::seconds(MAX_TOKEN_LIFETIME_SECS);
    assert!(stored.expires_at <= limit, "lifetime not clamped: {}", stored.expires_at);
}

#[tokio::test]
async fn revoked_refresh_token_requires_reauthorization() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/oauth/v2/accessToken"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": "invalid_grant",
            "error_description": "The refresh token has been revoked"
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v2/ugcPosts"))
        .respond_with(created("urn:li:share:never"))
        .expect(0)
        .mount(&server)
        .await;

    let stack = Stack::new(&server, Some(credential("expired", -60, Some("revoked")))).await;

    let err = stack.publisher.publish(&mut PostDraft::new("hi"), SUBJECT).await.unwrap_err();

    assert!(matches!(err, PublishError::AuthExpired(_)), "unexpected error: {err:?}");
    assert!(format!("{err:?}").contains("revoked"), "reason dropped: {err:?}");
}

#[tokio::test]
async fn connect_exchanges_code_and_records_identity() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/oauth/v2/accessToken"))
        .and(body_string_contains("grant_type=authorization_code"))
        .and(body_string_contains("code=auth-code-1"))
        .and(body_string_contains("client_id=client-123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(token_body("new-access", "new-refresh")))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v2/userinfo"))
        .and(header("authorization", "Bearer new-access"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "sub": "member-9",
            "name": "Ada Lovelace",
            "email": "ada@example.com"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let stack = Stack::new(&server, None).await;

    let status = stack.tokens.connect(SUBJECT, "auth-code-1").await.unwrap();

    assert!(status.is_connected);
    assert_eq!(status.external_urn.as_deref(), Some("urn:li:person:member-9"));
    let stored = stack.store.get(SUBJECT).await.unwrap().unwrap();
    assert_eq!(stored.access_token, "new-access");
    assert!(stored.granted_scopes.contains("w_member_social"));
}

#[tokio::test]
async fn disconnect_then_publish_reports_not_connected() {
    let server = MockServer::start().await;
    let stack = Stack::new(&server, Some(credential("access-1", 3600, None))).await;

    assert!(stack.tokens.disconnect(SUBJECT).await.unwrap());
    assert!(!stack.tokens.connection_status(SUBJECT).await.unwrap().is_connected);

    let err = stack.publisher.publish(&mut PostDraft::new("hi"), SUBJECT).await.unwrap_err();
    assert!(matches!(err, PublishError::AuthExpired(_)), "unexpected error: {err:?}");
    assert!(server.received_requests().await.unwrap().is_empty());
}
