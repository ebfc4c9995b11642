#![allow(dead_code)]

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use chrono::{Duration, Utc};
use expense_service::config::{
    ExpenseConfig, IdentityConfig, SessionConfig, StoreBackend, StoreConfig,
};
use expense_service::services::{JwtIdentityVerifier, MongoBudgetStore, MongoDb, MongoExpenseStore};
use expense_service::{build_router, AppState};
use http_body_util::BodyExt;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use secrecy::Secret;
use serde_json::{json, Value};
use service_core::config::{Config as CoreConfig, Environment};
use std::sync::Arc;
use tower::ServiceExt;
use uuid::Uuid;

pub const TEST_SECRET: &str = "integration-test-secret";
pub const ALICE: &str = "alice-uid";
pub const BOB: &str = "bob-uid";

pub fn test_config() -> ExpenseConfig {
    ExpenseConfig {
        common: CoreConfig {
            port: 0,
            log_level: "debug".to_string(),
            otlp_endpoint: None,
        },
        environment: Environment::Dev,
        service_name: "expense-service".to_string(),
        port: 0,
        log_level: "debug".to_string(),
        otlp_endpoint: None,
        store: StoreConfig {
            backend: StoreBackend::Memory,
            mongodb: None,
        },
        identity: IdentityConfig {
            jwt_secret: Secret::new(TEST_SECRET.to_string()),
            issuer: None,
            audience: None,
        },
        session: SessionConfig {
            secure_cookie: false,
            inactivity_hours: 1,
        },
    }
}

/// Sign an ID token the way the identity provider would.
pub fn id_token(user_id: &str, email: &str) -> String {
    let claims = json!({
        "sub": user_id,
        "email": email,
        "exp": (Utc::now() + Duration::hours(1)).timestamp(),
    });
    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(TEST_SECRET.as_bytes()),
    )
    .expect("Failed to sign test token")
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: axum::http::HeaderMap,
    pub body: Value,
}

/// The full router over in-memory stores, driven in-process.
pub struct TestApp {
    pub router: Router,
}

impl TestApp {
    pub fn spawn() -> Self {
        let config = test_config();
        let identity = Arc::new(JwtIdentityVerifier::new(&config.identity));
        let state = AppState::in_memory(config, identity);

        TestApp {
            router: build_router(state),
        }
    }

    pub async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to execute request");

        let status = response.status();
        let headers = response.headers().clone();
        let bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to read body")
            .to_bytes();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| {
                Value::String(String::from_utf8_lossy(&bytes).into_owned())
            })
        };

        TestResponse {
            status,
            headers,
            body,
        }
    }

    pub async fn request(
        &self,
        method: &str,
        uri: &str,
        cookie: Option<&str>,
        body: Option<Value>,
    ) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string())),
            None => builder.body(Body::empty()),
        }
        .expect("Failed to build request");

        self.send(request).await
    }

    /// Log in as `user_id` and return the session cookie.
    pub async fn login(&self, user_id: &str) -> String {
        let token = id_token(user_id, &format!("{}@example.com", user_id));
        let response = self
            .request(
                "POST",
                "/api/auth/login",
                None,
                Some(json!({ "idToken": token })),
            )
            .await;
        assert_eq!(response.status, StatusCode::OK, "login failed: {}", response.body);

        session_cookie(&response).expect("login did not set a session cookie")
    }

    pub async fn create_expense(&self, cookie: &str, body: Value) -> Value {
        let response = self
            .request("POST", "/api/expenses", Some(cookie), Some(body))
            .await;
        assert_eq!(response.status, StatusCode::CREATED, "{}", response.body);
        response.body["expense"].clone()
    }

    pub async fn set_budget(&self, cookie: &str, body: Value) -> Value {
        let response = self
            .request("POST", "/api/budgets", Some(cookie), Some(body))
            .await;
        assert_eq!(response.status, StatusCode::OK, "{}", response.body);
        response.body["budget"].clone()
    }
}

/// `name=value` of the session cookie set on `response`, if any.
pub fn session_cookie(response: &TestResponse) -> Option<String> {
    response
        .headers
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .filter_map(|v| v.split(';').next())
        .map(|pair| pair.trim().to_string())
        .find(|pair| !pair.is_empty())
}

/// Today's date as the service sees it.
pub fn today() -> chrono::NaiveDate {
    Utc::now().date_naive()
}

/// A throwaway database on a live MongoDB, named per test.
///
/// Reads `MONGODB_URI`, defaulting to a local server.
pub struct MongoTestDb {
    pub db: MongoDb,
    pub db_name: String,
    uri: String,
}

impl MongoTestDb {
    pub async fn create() -> Self {
        let uri = std::env::var("MONGODB_URI")
            .unwrap_or_else(|_| "mongodb://localhost:27017".to_string());
        let db_name = format!("expense_test_{}", Uuid::new_v4());

        let db = MongoDb::connect(&uri, &db_name)
            .await
            .expect("Failed to connect to MongoDB");
        db.initialize_indexes()
            .await
            .expect("Failed to create indexes");

        MongoTestDb { db, db_name, uri }
    }

    pub fn expenses(&self) -> MongoExpenseStore {
        MongoExpenseStore::new(&self.db)
    }

    pub fn budgets(&self) -> MongoBudgetStore {
        MongoBudgetStore::new(&self.db)
    }

    pub async fn cleanup(&self) {
        if let Ok(client) = mongodb::Client::with_uri_str(&self.uri).await {
            let _ = client.database(&self.db_name).drop(None).await;
        }
    }
}
