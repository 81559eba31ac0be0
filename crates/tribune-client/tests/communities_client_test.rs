// SPDX-License-Identifier: BUSL-1.1
//! Contract tests for CommunityClient against a wiremock backend.
//!
//! ## Endpoints Tested
//!
//! | Method | Path | Test |
//! |--------|------|------|
//! | GET    | `/communities` | `list_*` |
//! | GET    | `/communities/{id}` | `get_*` |
//! | POST   | `/communities` | `create_*` |
//! | DELETE | `/communities/{id}` | `discard_*` |
//! | POST   | `/communities/verify-email/send` | `send_email_otp_*` |
//! | POST   | `/communities/verify-email/confirm` | `confirm_email_otp_*` |
//! | POST   | `/communities/{id}/invite-authorized` | `invite_authorized_*` |
//! | POST   | `/communities/authorized/approve` | `approve_*` |
//! | POST   | `/communities/{id}/join` | `join_request_*` |
//! | POST   | `/communities/request/{approve,reject}` | `join_request_*` |

use std::sync::Arc;

use tribune_client::{
    ApiError, Approver, DiscardOutcome, JoinDecision, TribuneApiConfig, TribuneClient,
};
use tribune_core::{
    CommunityId, CommunityStatus, CommunityType, Email, MemorySessionStore, OtpCode, SessionStore,
    UserId, KEY_ADMIN_USER, KEY_IS_AUTHENTICATED, KEY_TOKEN,
};
use tribune_state::NewCommunity;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Build a client pointed at the mock server, with a logged-in session.
fn test_client(mock_server: &MockServer) -> (TribuneClient, Arc<MemorySessionStore>) {
    let store = Arc::new(MemorySessionStore::new());
    store.set(KEY_TOKEN, "tok-1");
    store.set(KEY_IS_AUTHENTICATED, "true");
    store.set(KEY_ADMIN_USER, r#"{"_id":"admin-1","role":"Admin"}"#);
    let config = TribuneApiConfig::new(mock_server.uri().parse().unwrap());
    let client = TribuneClient::new(config, store.clone()).unwrap();
    (client, store)
}

fn cid(s: &str) -> CommunityId {
    CommunityId::new(s).unwrap()
}

fn email(s: &str) -> Email {
    Email::new(s).unwrap()
}

// ── GET /communities ─────────────────────────────────────────────────

#[tokio::test]
async fn list_sends_bearer_and_reads_bare_array() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/communities"))
        .and(header("authorization", "Bearer tok-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
            {"_id": "c1", "name": "Tech Daily", "type": "Single", "status": "Active"},
            {"id": "c2", "name": "Makers", "type": "Multi", "status": "Pending", "approvals": 1}
        ])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let (client, _) = test_client(&mock_server);
    let list = client.communities().list().await.unwrap();
    assert_eq!(list.len(), 2);
    assert_eq!(list[0].id.as_str(), "c1");
    assert_eq!(list[0].status, CommunityStatus::Active);
    assert_eq!(list[1].id.as_str(), "c2");
    assert_eq!(list[1].community_type, CommunityType::Multi);
    assert_eq!(list[1].approvals, 1);
}

#[tokio::test]
async fn list_401_clears_session() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/communities"))
        .respond_with(ResponseTemplate::new(401).set_body_json(serde_json::json!({
            "message": "jwt expired"
        })))
        .mount(&mock_server)
        .await;

    let (client, store) = test_client(&mock_server);
    let err = client.communities().list().await.unwrap_err();
    assert!(matches!(err, ApiError::Unauthorized { .. }));
    assert!(store.get(KEY_TOKEN).is_none());
    assert!(store.get(KEY_IS_AUTHENTICATED).is_none());
    assert!(store.get(KEY_ADMIN_USER).is_none());
}

#[tokio::test]
async fn list_500_surfaces_server_message() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/communities"))
        .respond_with(ResponseTemplate::new(500).set_body_json(serde_json::json!({
            "message": "database unavailable"
        })))
        .mount(&mock_server)
        .await;

    let (client, store) = test_client(&mock_server);
    match client.communities().list().await.unwrap_err() {
        ApiError::Api {
            status, message, ..
        } => {
            assert_eq!(status, 500);
            assert_eq!(message, "database unavailable");
        }
        other => panic!("expected Api error, got: {other:?}"),
    }
    // Only a 401 touches the session.
    assert_eq!(store.get(KEY_TOKEN).as_deref(), Some("tok-1"));
}

// ── GET /communities/{id} ────────────────────────────────────────────

#[tokio::test]
async fn get_returns_none_on_404() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/communities/missing"))
        .respond_with(ResponseTemplate::new(404).set_body_json(serde_json::json!({
            "message": "Community not found"
        })))
        .mount(&mock_server)
        .await;

    let (client, _) = test_client(&mock_server);
    assert!(client.communities().get(&cid("missing")).await.unwrap().is_none());
}

// ── POST /communities ────────────────────────────────────────────────

#[tokio::test]
async fn create_single_sends_domain_email_only() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/communities"))
        .and(body_json(serde_json::json!({
            "name": "Tech Daily",
            "description": "",
            "type": "Single",
            "image": "",
            "creatorId": "admin-1",
            "domainEmail": "ed@tech.com"
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!({
            "_id": "c9", "name": "Tech Daily", "type": "Single", "status": "Pending",
            "domainEmail": "ed@tech.com"
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let (client, _) = test_client(&mock_server);
    let req = NewCommunity {
        name: "Tech Daily".into(),
        description: String::new(),
        community_type: CommunityType::Single,
        image: String::new(),
        creator_id: UserId::new("admin-1").unwrap(),
        domain_email: Some(email("ed@tech.com")),
        authorized_persons: None,
    };
    let created = client.communities().create(&req).await.unwrap();
    assert_eq!(created.id.as_str(), "c9");
    assert_eq!(created.status, CommunityStatus::Pending);
    assert_eq!(created.domain_email.as_deref(), Some("ed@tech.com"));
}

#[tokio::test]
async fn create_rejects_response_without_id() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/communities"))
        .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!({
            "name": "Makers", "type": "Multi", "status": "Pending"
        })))
        .mount(&mock_server)
        .await;

    let (client, _) = test_client(&mock_server);
    let req = NewCommunity {
        name: "Makers".into(),
        description: String::new(),
        community_type: CommunityType::Multi,
        image: String::new(),
        creator_id: UserId::new("admin-1").unwrap(),
        domain_email: None,
        authorized_persons: Some(vec![email("a@x.com"), email("b@x.com")]),
    };
    let err = client.communities().create(&req).await.unwrap_err();
    assert!(matches!(err, ApiError::Deserialization { .. }));
}

// ── OTP issuance and confirmation ────────────────────────────────────

#[tokio::test]
async fn send_email_otp_posts_community_and_email() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/communities/verify-email/send"))
        .and(body_json(serde_json::json!({
            "communityId": "c1",
            "domainEmail": "ed@tech.com"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "message": "OTP sent", "otp": "048213"
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let (client, _) = test_client(&mock_server);
    let issued = client
        .communities()
        .send_email_otp(&cid("c1"), &email("ed@tech.com"))
        .await
        .unwrap();
    assert_eq!(issued.otp.unwrap().as_str(), "048213");
    assert_eq!(issued.message.as_deref(), Some("OTP sent"));
}

#[tokio::test]
async fn confirm_email_otp_400_is_client_error_with_message() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/communities/verify-email/confirm"))
        .and(body_json(serde_json::json!({"communityId": "c1", "otp": "000000"})))
        .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
            "message": "Invalid or expired OTP"
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let (client, _) = test_client(&mock_server);
    let err = client
        .communities()
        .confirm_email_otp(&cid("c1"), &OtpCode::new("000000").unwrap())
        .await
        .unwrap_err();
    assert!(err.is_client_error());
    assert_eq!(err.user_message(), "Invalid or expired OTP");
}

#[tokio::test]
async fn confirm_email_otp_success_reports_active() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/communities/verify-email/confirm"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "message": "Community verified", "status": "Active"
        })))
        .mount(&mock_server)
        .await;

    let (client, _) = test_client(&mock_server);
    let ack = client
        .communities()
        .confirm_email_otp(&cid("c1"), &OtpCode::new("482913").unwrap())
        .await
        .unwrap();
    assert_eq!(ack.status, Some(CommunityStatus::Active));
}

// ── Authorized invites ───────────────────────────────────────────────

#[tokio::test]
async fn invite_authorized_posts_email_to_community_path() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/communities/c2/invite-authorized"))
        .and(header("authorization", "Bearer tok-1"))
        .and(body_json(serde_json::json!({"email": "a@x.com"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "message": "Invitation sent"
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let (client, _) = test_client(&mock_server);
    let issued = client
        .communities()
        .invite_authorized(&cid("c2"), &email("a@x.com"))
        .await
        .unwrap();
    assert!(issued.otp.is_none());
}

#[tokio::test]
async fn approve_by_user_id_sends_user_id() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/communities/authorized/approve"))
        .and(body_json(serde_json::json!({
            "communityId": "c2", "userId": "u-a", "otp": "111222"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "message": "Approved", "approvals": 1, "status": "Pending"
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let (client, _) = test_client(&mock_server);
    let ack = client
        .communities()
        .approve_authorized(
            &cid("c2"),
            &Approver::User(UserId::new("u-a").unwrap()),
            &OtpCode::new("111222").unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(ack.approvals, Some(1));
    assert_eq!(ack.status, Some(CommunityStatus::Pending));
}

#[tokio::test]
async fn approve_by_email_sends_email() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/communities/authorized/approve"))
        .and(body_json(serde_json::json!({
            "communityId": "c2", "email": "b@x.com", "otp": "333444"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "approvals": 2, "status": "Active"
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let (client, _) = test_client(&mock_server);
    let ack = client
        .communities()
        .approve_authorized(
            &cid("c2"),
            &Approver::Email(email("b@x.com")),
            &OtpCode::new("333444").unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(ack.status, Some(CommunityStatus::Active));
}

// ── discard_pending ──────────────────────────────────────────────────

#[tokio::test]
async fn discard_deletes_pending_community() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/communities/c3"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "_id": "c3", "name": "Orphan", "type": "Single", "status": "Pending"
        })))
        .mount(&mock_server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/communities/c3"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "message": "Community deleted"
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let (client, _) = test_client(&mock_server);
    let outcome = client.communities().discard_pending(&cid("c3")).await.unwrap();
    assert_eq!(outcome, DiscardOutcome::Deleted);
}

#[tokio::test]
async fn discard_keeps_active_community() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/communities/c4"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "_id": "c4", "name": "Live", "type": "Single", "status": "Active"
        })))
        .mount(&mock_server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/communities/c4"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;

    let (client, _) = test_client(&mock_server);
    let outcome = client.communities().discard_pending(&cid("c4")).await.unwrap();
    assert_eq!(outcome, DiscardOutcome::KeptActive);
}

#[tokio::test]
async fn discard_missing_is_not_found() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/communities/gone"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&mock_server)
        .await;

    let (client, _) = test_client(&mock_server);
    let outcome = client.communities().discard_pending(&cid("gone")).await.unwrap();
    assert_eq!(outcome, DiscardOutcome::NotFound);
}

// ── Identifiers in paths ─────────────────────────────────────────────

#[tokio::test]
async fn reserved_characters_stay_inside_the_id_segment() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/communities/..%2Fusers"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "_id": "../users", "name": "Odd", "type": "Single", "status": "Pending"
        })))
        .expect(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/communities/..%2Fusers"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/communities/a%3Fx=1"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/users"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;

    let (client, _) = test_client(&mock_server);
    let outcome = client
        .communities()
        .discard_pending(&cid("../users"))
        .await
        .unwrap();
    assert_eq!(outcome, DiscardOutcome::Deleted);
    assert!(client.communities().get(&cid("a?x=1")).await.unwrap().is_none());
}

#[tokio::test]
async fn dot_segment_id_is_refused_before_sending() {
    let mock_server = MockServer::start().await;

    Mock::given(method("DELETE"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;

    let (client, _) = test_client(&mock_server);
    assert!(matches!(
        client.communities().delete(&cid("..")).await,
        Err(ApiError::InvalidPathSegment(_))
    ));
}

// ── POST /communities/request/{approve,reject} ───────────────────────

#[tokio::test]
async fn join_request_approve_and_reject_post_ids() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/communities/request/approve"))
        .and(body_json(serde_json::json!({"communityId": "c1", "userId": "u1"})))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({"message": "User approved"})),
        )
        .expect(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("POST"))
        .and(path("/communities/request/reject"))
        .and(body_json(serde_json::json!({"communityId": "c1", "userId": "u2"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
        .expect(1)
        .mount(&mock_server)
        .await;

    let (client, _) = test_client(&mock_server);
    let ack = client
        .communities()
        .decide_join_request(&cid("c1"), &UserId::new("u1").unwrap(), JoinDecision::Approve)
        .await
        .unwrap();
    assert_eq!(ack.message.as_deref(), Some("User approved"));
    let ack = client
        .communities()
        .decide_join_request(&cid("c1"), &UserId::new("u2").unwrap(), JoinDecision::Reject)
        .await
        .unwrap();
    assert_eq!(ack.message, None);
}

#[tokio::test]
async fn join_request_missing_request_surfaces_404() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/communities/request/approve"))
        .respond_with(
            ResponseTemplate::new(404)
                .set_body_json(serde_json::json!({"message": "No such join request"})),
        )
        .mount(&mock_server)
        .await;

    let (client, _) = test_client(&mock_server);
    let err = client
        .communities()
        .decide_join_request(&cid("c1"), &UserId::new("u9").unwrap(), JoinDecision::Approve)
        .await
        .unwrap_err();
    match err {
        ApiError::Api { status, message, .. } => {
            assert_eq!(status, 404);
            assert_eq!(message, "No such join request");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn join_request_conflict_is_reported() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/communities/c1/join"))
        .and(header("authorization", "Bearer tok-1"))
        .respond_with(
            ResponseTemplate::new(409)
                .set_body_json(serde_json::json!({"message": "Join request already pending"})),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let (client, store) = test_client(&mock_server);
    let err = client.communities().request_join(&cid("c1")).await.unwrap_err();
    assert!(matches!(err, ApiError::Api { status: 409, .. }), "got {err:?}");
    assert!(store.get(KEY_TOKEN).is_some());
}
