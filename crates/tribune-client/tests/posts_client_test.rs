// SPDX-License-Identifier: BUSL-1.1
//! Contract tests for PostClient against a wiremock backend.
//!
//! ## Endpoints Tested
//!
//! | Method | Path | Test |
//! |--------|------|------|
//! | GET    | `/communities/{id}/posts` | `list_*` |
//! | POST   | `/communities/posts` | `create_*` |
//! | PATCH  | `/communities/posts/{id}/like` | `like_*` |
//! | PATCH  | `/communities/posts/{id}/share` | `share_*` |

use std::sync::Arc;

use tribune_client::{ApiError, TribuneApiConfig, TribuneClient};
use tribune_core::{
    CachedUser, CommunityId, MemorySessionStore, PostId, PostType, Role, SessionStore, UserId,
    KEY_TOKEN,
};
use tribune_state::{AdminSession, NewPost};
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn test_client(mock_server: &MockServer) -> (TribuneClient, Arc<MemorySessionStore>) {
    let store = Arc::new(MemorySessionStore::new());
    store.set(KEY_TOKEN, "tok-1");
    let config = TribuneApiConfig::new(mock_server.uri().parse().unwrap());
    let client = TribuneClient::new(config, store.clone()).unwrap();
    (client, store)
}

fn admin(id: Option<&str>) -> AdminSession {
    AdminSession::new(CachedUser {
        id: id.map(|s| UserId::new(s).unwrap()),
        role: Role::Admin,
        full_name: Some("Ada".into()),
        email: None,
    })
}

fn cid(s: &str) -> CommunityId {
    CommunityId::new(s).unwrap()
}

#[tokio::test]
async fn list_reads_posts_of_one_community() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/communities/c1/posts"))
        .and(header("authorization", "Bearer tok-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
            {"_id": "p1", "content": "Hi", "type": "Event", "authorName": "Ada",
             "likes": 3, "comments": [{"text": "a"}, {"text": "b"}]},
            {"id": "p2", "content": "Yo"}
        ])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let (client, _) = test_client(&mock_server);
    let posts = client.posts().list(&cid("c1")).await.unwrap();
    assert_eq!(posts.len(), 2);
    assert_eq!(posts[0].id.as_str(), "p1");
    assert_eq!(posts[0].post_type, PostType::Event);
    assert_eq!(posts[0].likes, 3);
    assert_eq!(posts[0].comment_count, 2);
    assert_eq!(posts[1].post_type, PostType::Public);
}

#[tokio::test]
async fn create_sends_composed_body() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/communities/posts"))
        .and(body_json(serde_json::json!({
            "communityId": "c1",
            "content": "Launch day",
            "type": "Member",
            "authorName": "Ada",
            "userId": "admin-1"
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!({
            "_id": "p9", "communityId": "c1", "content": "Launch day",
            "type": "Member", "authorName": "Ada"
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let (client, _) = test_client(&mock_server);
    let post = NewPost::compose(&admin(Some("admin-1")), cid("c1"), " Launch day ", PostType::Member)
        .unwrap();
    let created = client.posts().create(&post).await.unwrap();
    assert_eq!(created.id.as_str(), "p9");
    assert_eq!(created.community_id.as_deref(), Some("c1"));
    assert_eq!(created.likes, 0);
}

#[tokio::test]
async fn create_surfaces_server_message() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/communities/posts"))
        .respond_with(
            ResponseTemplate::new(404)
                .set_body_json(serde_json::json!({"message": "Community not found"})),
        )
        .mount(&mock_server)
        .await;

    let (client, _) = test_client(&mock_server);
    let post = NewPost::compose(&admin(Some("admin-1")), cid("gone"), "x", PostType::Public)
        .unwrap();
    let err = client.posts().create(&post).await.unwrap_err();
    assert!(!matches!(err, ApiError::Unauthorized { .. }), "got {err:?}");
    assert!(err.to_string().contains("Community not found"), "got {err}");
}

#[tokio::test]
async fn like_and_share_patch_the_post() {
    let mock_server = MockServer::start().await;

    Mock::given(method("PATCH"))
        .and(path("/communities/posts/p1/like"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"likes": 4})))
        .expect(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("PATCH"))
        .and(path("/communities/posts/p1/share"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&mock_server)
        .await;

    let (client, _) = test_client(&mock_server);
    let id = PostId::new("p1").unwrap();
    client.posts().like(&id).await.unwrap();
    client.posts().share(&id).await.unwrap();
}

#[tokio::test]
async fn like_401_clears_session() {
    let mock_server = MockServer::start().await;

    Mock::given(method("PATCH"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&mock_server)
        .await;

    let (client, store) = test_client(&mock_server);
    let err = client
        .posts()
        .like(&PostId::new("p1").unwrap())
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::Unauthorized { .. }));
    assert_eq!(store.get(KEY_TOKEN), None);
}
