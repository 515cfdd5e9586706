//! E2E tests for comments

mod common;

use common::TestServer;
use serde_json::Value;

async fn comment(
    server: &TestServer,
    token: &str,
    post_id: &str,
    content: &str,
) -> reqwest::Response {
    server
        .client
        .post(server.url("/api/comments"))
        .header("Authorization", format!("Bearer {}", token))
        .json(&serde_json::json!({ "post_id": post_id, "content": content }))
        .send()
        .await
        .unwrap()
}

#[tokio::test]
async fn test_create_comment() {
    let server = TestServer::new().await;
    let (alice_token, _alice_id) = server.register_and_token("alice").await;
    let (bob_token, bob_id) = server.register_and_token("bob").await;
    let post_id = server.create_post(&alice_token, "discuss").await;

    let response = comment(&server, &bob_token, &post_id, "nice post").await;
    assert_eq!(response.status(), 201);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["comment"]["content"], "nice post");
    assert_eq!(body["comment"]["user_id"], bob_id.as_str());
    assert_eq!(body["comment"]["username"], "bob");
    assert_eq!(body["commentsCount"], 1);
}

#[tokio::test]
async fn test_comment_on_missing_post_is_not_found() {
    let server = TestServer::new().await;
    let (token, _user_id) = server.register_and_token("alice").await;

    let response = comment(&server, &token, "01JUNKJUNKJUNKJUNKJUNKJUNK", "hello").await;
    assert_eq!(response.status(), 404);
}

#[tokio::test]
async fn test_comment_on_deleted_post_is_not_found() {
    let server = TestServer::new().await;
    let (alice_token, _alice_id) = server.register_and_token("alice").await;
    let (bob_token, _bob_id) = server.register_and_token("bob").await;
    let post_id = server.create_post(&alice_token, "short-lived").await;

    server
        .client
        .delete(server.url(&format!("/api/posts/{}", post_id)))
        .header("Authorization", format!("Bearer {}", alice_token))
        .send()
        .await
        .unwrap();

    let response = comment(&server, &bob_token, &post_id, "too late").await;
    assert_eq!(response.status(), 404);
}

#[tokio::test]
async fn test_comment_on_disabled_post_is_forbidden() {
    let server = TestServer::new().await;
    let (alice_token, _alice_id) = server.register_and_token("alice").await;
    let (bob_token, _bob_id) = server.register_and_token("bob").await;
    let post_id = server.create_post(&alice_token, "no comments please").await;

    server
        .client
        .put(server.url(&format!("/api/posts/{}", post_id)))
        .header("Authorization", format!("Bearer {}", alice_token))
        .json(&serde_json::json!({ "comments_enabled": false }))
        .send()
        .await
        .unwrap();

    let response = comment(&server, &bob_token, &post_id, "anyway").await;
    assert_eq!(response.status(), 403);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], "Comments are disabled for this post");
}

#[tokio::test]
async fn test_threaded_reply_carries_parent_id() {
    let server = TestServer::new().await;
    let (token, _user_id) = server.register_and_token("alice").await;
    let post_id = server.create_post(&token, "thread root").await;

    let response = comment(&server, &token, &post_id, "top level").await;
    let body: Value = response.json().await.unwrap();
    let parent_id = body["comment"]["id"].as_str().unwrap().to_string();

    let response = server
        .client
        .post(server.url("/api/comments"))
        .header("Authorization", format!("Bearer {}", token))
        .json(&serde_json::json!({
            "post_id": post_id,
            "content": "a reply",
            "parent_comment_id": parent_id,
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 201);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["comment"]["parent_comment_id"], parent_id.as_str());
}

#[tokio::test]
async fn test_update_comment_owner_only() {
    let server = TestServer::new().await;
    let (alice_token, _alice_id) = server.register_and_token("alice").await;
    let (bob_token, _bob_id) = server.register_and_token("bob").await;
    let post_id = server.create_post(&alice_token, "post").await;

    let response = comment(&server, &bob_token, &post_id, "first draft").await;
    let body: Value = response.json().await.unwrap();
    let comment_id = body["comment"]["id"].as_str().unwrap().to_string();

    // Owner can edit
    let response = server
        .client
        .put(server.url(&format!("/api/comments/{}", comment_id)))
        .header("Authorization", format!("Bearer {}", bob_token))
        .json(&serde_json::json!({ "content": "second draft" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["comment"]["content"], "second draft");

    // Non-owner sees not-found
    let response = server
        .client
        .put(server.url(&format!("/api/comments/{}", comment_id)))
        .header("Authorization", format!("Bearer {}", alice_token))
        .json(&serde_json::json!({ "content": "hijacked" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 404);
}

#[tokio::test]
async fn test_delete_comment_excluded_from_thread_but_persists() {
    let server = TestServer::new().await;
    let (token, _user_id) = server.register_and_token("alice").await;
    let post_id = server.create_post(&token, "post").await;

    let response = comment(&server, &token, &post_id, "regret this").await;
    let body: Value = response.json().await.unwrap();
    let comment_id = body["comment"]["id"].as_str().unwrap().to_string();

    let response = server
        .client
        .delete(server.url(&format!("/api/comments/{}", comment_id)))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);

    let body: Value = server
        .client
        .get(server.url(&format!("/api/comments/post/{}", post_id)))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["comments"].as_array().unwrap().len(), 0);
    assert_eq!(body["commentsCount"], 0);

    // Row persists for audit history
    let row = server
        .state
        .db
        .get_comment_row(&comment_id)
        .await
        .unwrap()
        .unwrap();
    assert!(row.deleted);
}

#[tokio::test]
async fn test_post_comments_in_chronological_order() {
    let server = TestServer::new().await;
    let (token, _user_id) = server.register_and_token("alice").await;
    let post_id = server.create_post(&token, "post").await;

    for content in ["first", "second", "third"] {
        let response = comment(&server, &token, &post_id, content).await;
        assert_eq!(response.status(), 201);
    }

    let body: Value = server
        .client
        .get(server.url(&format!("/api/comments/post/{}", post_id)))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    let contents: Vec<&str> = body["comments"]
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["content"].as_str().unwrap())
        .collect();
    assert_eq!(contents, vec!["first", "second", "third"]);
}

#[tokio::test]
async fn test_user_comments_include_post_text() {
    let server = TestServer::new().await;
    let (alice_token, _alice_id) = server.register_and_token("alice").await;
    let (bob_token, bob_id) = server.register_and_token("bob").await;
    let post_id = server.create_post(&alice_token, "the post body").await;

    comment(&server, &bob_token, &post_id, "bob was here").await;

    let body: Value = server
        .client
        .get(server.url(&format!("/api/comments/user/{}", bob_id)))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    let comments = body["comments"].as_array().unwrap();
    assert_eq!(comments.len(), 1);
    assert_eq!(comments[0]["content"], "bob was here");
    assert_eq!(comments[0]["post_content"], "the post body");
}
