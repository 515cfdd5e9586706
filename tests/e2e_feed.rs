//! E2E tests for the home feed

mod common;

use common::TestServer;
use serde_json::Value;

async fn feed(server: &TestServer, token: &str, query: &str) -> Value {
    server
        .client
        .get(server.url(&format!("/api/posts/feed{}", query)))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap()
}

#[tokio::test]
async fn test_feed_requires_auth() {
    let server = TestServer::new().await;

    let response = server
        .client
        .get(server.url("/api/posts/feed"))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 401);
}

#[tokio::test]
async fn test_feed_contains_own_and_followed_posts_only() {
    let server = TestServer::new().await;
    let (alice_token, alice_id) = server.register_and_token("alice").await;
    let (bob_token, _bob_id) = server.register_and_token("bob").await;
    let (carol_token, _carol_id) = server.register_and_token("carol").await;

    server.create_post(&alice_token, "from alice").await;
    server.create_post(&bob_token, "from bob").await;
    server.create_post(&carol_token, "from carol").await;

    // bob follows alice but not carol
    server.follow(&bob_token, &alice_id).await;

    let body = feed(&server, &bob_token, "").await;
    let contents: Vec<&str> = body["posts"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["content"].as_str().unwrap())
        .collect();

    assert!(contents.contains(&"from alice"));
    assert!(contents.contains(&"from bob"));
    assert!(!contents.contains(&"from carol"));
}

#[tokio::test]
async fn test_feed_is_reverse_chronological() {
    let server = TestServer::new().await;
    let (token, _user_id) = server.register_and_token("alice").await;

    for content in ["oldest", "middle", "newest"] {
        server.create_post(&token, content).await;
    }

    let body = feed(&server, &token, "").await;
    let contents: Vec<&str> = body["posts"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["content"].as_str().unwrap())
        .collect();

    assert_eq!(contents, vec!["newest", "middle", "oldest"]);

    // created_at is strictly non-increasing
    let timestamps: Vec<&str> = body["posts"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["created_at"].as_str().unwrap())
        .collect();
    for pair in timestamps.windows(2) {
        assert!(pair[0] >= pair[1]);
    }
}

#[tokio::test]
async fn test_feed_excludes_soft_deleted_posts() {
    let server = TestServer::new().await;
    let (alice_token, alice_id) = server.register_and_token("alice").await;
    let (bob_token, _bob_id) = server.register_and_token("bob").await;

    let post_id = server.create_post(&alice_token, "now you see me").await;
    server.follow(&bob_token, &alice_id).await;

    let body = feed(&server, &bob_token, "").await;
    assert_eq!(body["posts"].as_array().unwrap().len(), 1);

    server
        .client
        .delete(server.url(&format!("/api/posts/{}", post_id)))
        .header("Authorization", format!("Bearer {}", alice_token))
        .send()
        .await
        .unwrap();

    let body = feed(&server, &bob_token, "").await;
    assert_eq!(body["posts"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn test_feed_pagination_and_has_more_approximation() {
    let server = TestServer::new().await;
    let (token, _user_id) = server.register_and_token("alice").await;

    for i in 0..5 {
        server.create_post(&token, &format!("post {}", i)).await;
    }

    let body = feed(&server, &token, "?page=1&limit=2").await;
    assert_eq!(body["posts"].as_array().unwrap().len(), 2);
    assert_eq!(body["pagination"]["page"], 1);
    assert_eq!(body["pagination"]["limit"], 2);
    assert_eq!(body["pagination"]["hasMore"], true);

    let body = feed(&server, &token, "?page=3&limit=2").await;
    assert_eq!(body["posts"].as_array().unwrap().len(), 1);
    assert_eq!(body["pagination"]["hasMore"], false);

    // Pages do not overlap
    let page1 = feed(&server, &token, "?page=1&limit=2").await;
    let page2 = feed(&server, &token, "?page=2&limit=2").await;
    let ids = |body: &Value| -> Vec<String> {
        body["posts"]
            .as_array()
            .unwrap()
            .iter()
            .map(|p| p["id"].as_str().unwrap().to_string())
            .collect()
    };
    for id in ids(&page2) {
        assert!(!ids(&page1).contains(&id));
    }
}

#[tokio::test]
async fn test_feed_annotates_engagement_counts() {
    let server = TestServer::new().await;
    let (alice_token, alice_id) = server.register_and_token("alice").await;
    let (bob_token, _bob_id) = server.register_and_token("bob").await;

    let post_id = server.create_post(&alice_token, "count me").await;
    server.follow(&bob_token, &alice_id).await;

    server
        .client
        .post(server.url("/api/likes"))
        .header("Authorization", format!("Bearer {}", bob_token))
        .json(&serde_json::json!({ "post_id": post_id }))
        .send()
        .await
        .unwrap();
    server
        .client
        .post(server.url("/api/comments"))
        .header("Authorization", format!("Bearer {}", bob_token))
        .json(&serde_json::json!({ "post_id": post_id, "content": "hi" }))
        .send()
        .await
        .unwrap();

    let body = feed(&server, &bob_token, "").await;
    let post = &body["posts"].as_array().unwrap()[0];
    assert_eq!(post["likesCount"], 1);
    assert_eq!(post["commentsCount"], 1);
    assert_eq!(post["username"], "alice");
    assert_eq!(post["full_name"], "alice Example");
}

/// The full end-to-end scenario from the acceptance checklist:
/// register, failed login, post, follow, feed, idempotent like,
/// disable comments, blocked comment.
#[tokio::test]
async fn test_full_social_scenario() {
    let server = TestServer::new().await;

    // Register alice
    let response = server
        .client
        .post(server.url("/api/auth/register"))
        .json(&serde_json::json!({
            "username": "alice",
            "email": "alice@x.com",
            "password": "pw123456",
            "full_name": "Alice A",
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 201);
    let body: Value = response.json().await.unwrap();
    let alice_token = body["token"].as_str().unwrap().to_string();
    let alice_id = body["user"]["id"].as_str().unwrap().to_string();

    // Login with wrong password fails
    let response = server
        .client
        .post(server.url("/api/auth/login"))
        .json(&serde_json::json!({ "email": "alice@x.com", "password": "wrong" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 401);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], "Invalid credentials");

    // Alice posts
    let post_id = server.create_post(&alice_token, "hello").await;

    // Bob registers and follows alice
    let (bob_token, _bob_id) = server.register_and_token("bob").await;
    assert_eq!(server.follow(&bob_token, &alice_id).await.status(), 200);

    // Alice's post appears in bob's feed page 1
    let body = feed(&server, &bob_token, "?page=1").await;
    let posts = body["posts"].as_array().unwrap();
    assert!(posts.iter().any(|p| p["id"] == post_id.as_str()));

    // Bob likes the post: count becomes 1
    let response = server
        .client
        .post(server.url("/api/likes"))
        .header("Authorization", format!("Bearer {}", bob_token))
        .json(&serde_json::json!({ "post_id": post_id }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 201);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["likesCount"], 1);

    // Bob likes again: still 1, reported as already liked
    let response = server
        .client
        .post(server.url("/api/likes"))
        .header("Authorization", format!("Bearer {}", bob_token))
        .json(&serde_json::json!({ "post_id": post_id }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["message"], "Post already liked");
    assert_eq!(body["likesCount"], 1);

    // Alice disables comments on the post
    let response = server
        .client
        .put(server.url(&format!("/api/posts/{}", post_id)))
        .header("Authorization", format!("Bearer {}", alice_token))
        .json(&serde_json::json!({ "comments_enabled": false }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);

    // Bob's comment attempt is rejected
    let response = server
        .client
        .post(server.url("/api/comments"))
        .header("Authorization", format!("Bearer {}", bob_token))
        .json(&serde_json::json!({ "post_id": post_id, "content": "hi" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 403);
}
