//! HTTP API for the web client and the admin panel.
//!
//! Three JSON endpoints: code generation and the verification polling loop
//! (pairing), and the status-change notification hook. The endpoints carry no
//! auth token; the service is expected to sit behind network-level trust.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{routing::post, Router};

use ptb_core::{codes::VerificationCodeStore, relay::StatusRelay, Result};

pub mod api;

#[derive(Clone)]
pub struct ApiState {
    pub codes: Arc<VerificationCodeStore>,
    pub relay: Arc<StatusRelay>,
}

pub fn app(state: ApiState) -> Router {
    Router::new()
        .route("/api/generate-code", post(api::generate_code))
        .route("/api/verify-code", post(api::verify_code))
        .route("/api/notify-status-change", post(api::notify_status_change))
        .with_state(state)
}

pub async fn serve(addr: SocketAddr, state: ApiState) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("notification API listening on {addr}");
    axum::serve(listener, app(state)).await?;
    Ok(())
}
