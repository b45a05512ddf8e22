pub mod handlers;
pub mod state;
pub mod types;

use anyhow::Context;
use axum::{
    Router,
    middleware::from_fn_with_state,
    routing::{get, post},
};
use std::sync::Arc;
use tokio::net::TcpListener;

use crate::account::LedgerStore;
use crate::auth::require_bearer_token;
use crate::user_auth;
use state::{AuthServiceState, PaymentsState};

/// Payments API: public health check plus bearer-protected money movement
pub fn payments_router<S: LedgerStore + 'static>(state: Arc<PaymentsState<S>>) -> Router {
    let private_routes = Router::new()
        .route("/deposit", post(handlers::deposit::<S>))
        .route("/withdraw", post(handlers::withdraw::<S>))
        .route("/transfer", post(handlers::create_transfer::<S>))
        .route("/balances", get(handlers::get_balances::<S>))
        .route_layer(from_fn_with_state(
            state.verifier.clone(),
            require_bearer_token,
        ));

    let api = Router::new()
        .route("/health", get(handlers::health_check::<S>))
        .merge(private_routes)
        .with_state(state);

    Router::new().nest("/api/v1", api)
}

/// Auth API exposed to clients
pub fn auth_router(state: Arc<AuthServiceState>) -> Router {
    let api = Router::new()
        .route("/register", post(user_auth::handlers::register))
        .route("/login", post(user_auth::handlers::login))
        .with_state(state);

    Router::new().nest("/api/v1", api)
}

/// Key publishing, bound to the internal listener only
pub fn internal_router(state: Arc<AuthServiceState>) -> Router {
    Router::new()
        .route("/jwt-public-key", get(user_auth::handlers::jwt_public_key))
        .with_state(state)
}

/// Bind `addr` and serve `app` until Ctrl-C
pub async fn serve(name: &'static str, addr: &str, app: Router) -> anyhow::Result<()> {
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {name} listener on {addr}"))?;

    tracing::info!(listener = name, addr, "Listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(name))
        .await
        .with_context(|| format!("{name} server error"))
}

async fn shutdown_signal(name: &'static str) {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(listener = name, error = %e, "Failed to install Ctrl-C handler");
        std::future::pending::<()>().await;
    }
    tracing::info!(listener = name, "Shutdown signal received");
}
