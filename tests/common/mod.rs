//! Common test utilities for E2E tests

use ripple::{AppState, config};
use tempfile::TempDir;
use tokio::net::TcpListener;

pub const TEST_TOKEN_SECRET: &str = "test-secret-key-32-bytes-long!!!";

/// Test server instance
pub struct TestServer {
    pub addr: String,
    pub state: AppState,
    pub _temp_dir: TempDir,
    pub client: reqwest::Client,
}

impl TestServer {
    /// Create a new test server instance
    pub async fn new() -> Self {
        // Create temporary directory for test database
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("test.db");

        // Create test configuration
        let config = config::AppConfig {
            server: config::ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 0, // Let OS assign port
            },
            database: config::DatabaseConfig {
                path: db_path,
                max_connections: 5,
                acquire_timeout_seconds: 5,
                connect_attempts: 1,
            },
            auth: config::AuthConfig {
                token_secret: TEST_TOKEN_SECRET.to_string(),
                token_max_age: 86400,
            },
            logging: config::LoggingConfig {
                level: "info".to_string(),
                format: "pretty".to_string(),
            },
        };

        // Initialize app state
        let state = AppState::new(config).await.unwrap();

        // Create HTTP client
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(10))
            .build()
            .unwrap();

        // Bind to random port
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let addr_str = format!("http://{}", addr);

        // Build router
        let app = ripple::build_router(state.clone());

        // Spawn server in background
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        // Wait a bit for server to start
        tokio::time::sleep(tokio::time::Duration::from_millis(100)).await;

        Self {
            addr: addr_str,
            state,
            _temp_dir: temp_dir,
            client,
        }
    }

    /// Get base URL for API requests
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.addr, path)
    }

    /// Register a user through the API and return the response body
    ///
    /// Panics if registration does not return 201.
    pub async fn register_user(&self, username: &str) -> serde_json::Value {
        let response = self
            .client
            .post(self.url("/api/auth/register"))
            .json(&serde_json::json!({
                "username": username,
                "email": format!("{}@example.com", username),
                "password": "pw123456",
                "full_name": format!("{} Example", username),
            }))
            .send()
            .await
            .unwrap();

        assert_eq!(response.status(), 201, "registration failed for {username}");
        response.json().await.unwrap()
    }

    /// Register a user and return (token, user_id)
    pub async fn register_and_token(&self, username: &str) -> (String, String) {
        let body = self.register_user(username).await;
        let token = body["token"].as_str().unwrap().to_string();
        let user_id = body["user"]["id"].as_str().unwrap().to_string();
        (token, user_id)
    }

    /// Create a post as the given token holder, returning the post id
    pub async fn create_post(&self, token: &str, content: &str) -> String {
        let response = self
            .client
            .post(self.url("/api/posts"))
            .header("Authorization", format!("Bearer {}", token))
            .json(&serde_json::json!({ "content": content }))
            .send()
            .await
            .unwrap();

        assert_eq!(response.status(), 201, "post creation failed");
        let body: serde_json::Value = response.json().await.unwrap();
        body["post"]["id"].as_str().unwrap().to_string()
    }

    /// Follow a user as the given token holder
    pub async fn follow(&self, token: &str, followee_id: &str) -> reqwest::Response {
        self.client
            .post(self.url("/api/users/follow"))
            .header("Authorization", format!("Bearer {}", token))
            .json(&serde_json::json!({ "followeeId": followee_id }))
            .send()
            .await
            .unwrap()
    }
}
