//! Shared test helpers for integration tests.

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::Value;
use tower::ServiceExt;
use uuid::Uuid;

use schoolhub_api::{AppState, build_app};
use schoolhub_auth::JwtEncoder;
use schoolhub_core::config::AppConfig;
use schoolhub_database::Stores;
use schoolhub_entity::user::{CreateUser, User, UserRole};
use schoolhub_service::{MemoryArtifactStore, RequestContext, ServiceRegistry};

/// Test application context
pub struct TestApp {
    /// The Axum router for making test requests
    pub router: Router,
    /// Services behind the router, for setup and direct assertions
    pub services: ServiceRegistry,
    encoder: JwtEncoder,
}

impl TestApp {
    /// Create a new test application over a fresh in-memory store
    pub fn new() -> Self {
        let mut config = AppConfig::default();
        config.auth.session_secret = "integration-test-secret".to_string();
        config.credits.initial_grant = 100;

        let stores = Stores::memory();
        let services = ServiceRegistry::new(&stores, &config, Arc::new(MemoryArtifactStore::new()));
        let state = AppState::new(Arc::new(config.clone()), services.clone(), stores.health.clone());

        Self {
            router: build_app(state),
            services,
            encoder: JwtEncoder::new(&config.auth),
        }
    }

    /// Create a user with the configured initial grant
    pub async fn create_user(&self, role: UserRole, school_id: Option<Uuid>) -> User {
        let id = Uuid::new_v4();
        let (user, _) = self
            .services
            .users
            .create(
                &RequestContext::system(),
                CreateUser {
                    id: Some(id),
                    email: format!("{}@school.test", id.simple()),
                    full_name: format!("User {}", &id.simple().to_string()[..8]),
                    full_name_bn: None,
                    role,
                    school_id,
                },
            )
            .await
            .expect("Failed to create test user");
        user
    }

    /// Issue a bearer token for `user`
    pub fn token_for(&self, user: &User) -> String {
        self.encoder
            .issue(user.id, user.role, user.school_id)
            .expect("Failed to issue token")
            .token
    }

    /// Make an HTTP request to the test app
    pub async fn request(
        &self,
        method: &str,
        path: &str,
        body: Option<Value>,
        token: Option<&str>,
    ) -> TestResponse {
        let body_str = body
            .map(|b| serde_json::to_string(&b).expect("Failed to serialize body"))
            .unwrap_or_default();

        let mut req = Request::builder()
            .method(method)
            .uri(path)
            .header("Content-Type", "application/json");

        if let Some(token) = token {
            req = req.header("Authorization", format!("Bearer {}", token));
        }

        let req = req
            .body(Body::from(body_str))
            .expect("Failed to build request");

        let response = self
            .router
            .clone()
            .oneshot(req)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let body_bytes = axum::body::to_bytes(response.into_body(), 1024 * 1024)
            .await
            .expect("Failed to read body");

        let body: Value = serde_json::from_slice(&body_bytes).unwrap_or(Value::Null);

        TestResponse { status, body }
    }

    /// Current balance of `user` as seen through the API
    pub async fn current_credits(&self, user: &User) -> i64 {
        let token = self.token_for(user);
        let response = self
            .request("GET", "/api/credits/balance", None, Some(&token))
            .await;
        assert_eq!(response.status, StatusCode::OK, "{:?}", response.body);
        response.body["data"]["currentCredits"]
            .as_i64()
            .expect("currentCredits missing")
    }
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    /// HTTP status code
    pub status: StatusCode,
    /// Parsed JSON body
    pub body: Value,
}
