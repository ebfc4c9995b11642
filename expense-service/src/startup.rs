use axum::{
    middleware::from_fn,
    routing::{get, post},
    Router,
};
use service_core::error::AppError;
use service_core::middleware::{
    http_trace_layer, metrics_middleware, request_id_middleware, security_headers_middleware,
};
use std::future::IntoFuture;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_sessions::{Expiry, MemoryStore, SessionManagerLayer};

use crate::config::{ExpenseConfig, StoreBackend};
use crate::handlers;
use crate::middleware::require_user;
use crate::services::{
    BudgetStore, ExpenseStore, IdentityVerifier, JwtIdentityVerifier, MemoryBudgetStore,
    MemoryExpenseStore, MongoBudgetStore, MongoDb, MongoExpenseStore,
};

#[derive(Clone)]
pub struct AppState {
    pub config: ExpenseConfig,
    pub expenses: Arc<dyn ExpenseStore>,
    pub budgets: Arc<dyn BudgetStore>,
    /// Only set for the MongoDB backend; used by health checks.
    pub db: Option<MongoDb>,
    pub identity: Arc<dyn IdentityVerifier>,
}

impl AppState {
    pub async fn from_config(config: &ExpenseConfig) -> Result<Self, AppError> {
        let identity: Arc<dyn IdentityVerifier> =
            Arc::new(JwtIdentityVerifier::new(&config.identity));

        match (config.store.backend, config.store.mongodb.as_ref()) {
            (StoreBackend::Mongo, Some(mongo)) => {
                let db = MongoDb::connect(&mongo.uri, &mongo.database)
                    .await
                    .map_err(|e| {
                        tracing::error!("Failed to connect to MongoDB: {}", e);
                        e
                    })?;
                db.initialize_indexes().await.map_err(|e| {
                    tracing::error!("Failed to initialize database indexes: {}", e);
                    e
                })?;

                Ok(Self {
                    config: config.clone(),
                    expenses: Arc::new(MongoExpenseStore::new(&db)),
                    budgets: Arc::new(MongoBudgetStore::new(&db)),
                    db: Some(db),
                    identity,
                })
            }
            (StoreBackend::Mongo, None) => Err(AppError::ConfigError(anyhow::anyhow!(
                "MongoDB backend selected without connection settings"
            ))),
            (StoreBackend::Memory, _) => {
                tracing::info!("Using in-memory store");
                Ok(Self::in_memory(config.clone(), identity))
            }
        }
    }

    pub fn in_memory(config: ExpenseConfig, identity: Arc<dyn IdentityVerifier>) -> Self {
        Self {
            config,
            expenses: Arc::new(MemoryExpenseStore::new()),
            budgets: Arc::new(MemoryBudgetStore::new()),
            db: None,
            identity,
        }
    }
}

pub fn build_router(state: AppState) -> Router {
    let session_layer = SessionManagerLayer::new(MemoryStore::default())
        .with_secure(state.config.session.secure_cookie)
        .with_expiry(Expiry::OnInactivity(time::Duration::hours(
            state.config.session.inactivity_hours,
        )));

    let api = Router::new()
        .route("/api/auth/me", get(handlers::auth::me))
        .route(
            "/api/expenses",
            get(handlers::expenses::list_expenses).post(handlers::expenses::create_expense),
        )
        .route(
            "/api/expenses/:id",
            get(handlers::expenses::get_expense)
                .put(handlers::expenses::update_expense)
                .delete(handlers::expenses::delete_expense),
        )
        .route(
            "/api/budgets",
            get(handlers::budgets::list_budgets).post(handlers::budgets::set_budget),
        )
        .route("/api/budgets/status", get(handlers::budgets::budget_status))
        .route(
            "/api/budgets/:id",
            get(handlers::budgets::get_budget)
                .put(handlers::budgets::update_budget)
                .delete(handlers::budgets::delete_budget),
        )
        .route(
            "/api/reports/summary",
            get(handlers::reports::spending_summary),
        )
        .route_layer(from_fn(require_user));

    Router::new()
        .route("/health", get(handlers::health_check))
        .route("/ready", get(handlers::readiness_check))
        .route("/metrics", get(handlers::metrics_endpoint))
        .route("/api/auth/login", post(handlers::auth::login))
        .route("/api/auth/logout", post(handlers::auth::logout))
        .merge(api)
        .with_state(state)
        .layer(session_layer)
        .layer(from_fn(security_headers_middleware))
        .layer(from_fn(metrics_middleware))
        .layer(http_trace_layer())
        .layer(from_fn(request_id_middleware))
}

pub struct Application {
    port: u16,
    server: Box<dyn std::future::Future<Output = std::io::Result<()>> + Send + Unpin>,
    state: AppState,
}

impl Application {
    pub async fn build(config: ExpenseConfig) -> Result<Self, AppError> {
        let state = AppState::from_config(&config).await?;
        let app = build_router(state.clone());

        let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
        let listener = TcpListener::bind(addr).await.map_err(|e| {
            tracing::error!("Failed to bind TCP listener to {}: {}", addr, e);
            AppError::from(e)
        })?;
        let port = listener.local_addr()?.port();

        tracing::info!(port, "Listening");

        let server = axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .into_future();

        Ok(Self {
            port,
            server: Box::new(server),
            state,
        })
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub async fn run_until_stopped(self) -> std::io::Result<()> {
        self.server.await
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received SIGINT, starting graceful shutdown");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        },
    }
}
