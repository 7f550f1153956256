//! JSON over HTTP surface for instructors, admins and the payment collaborator.

pub mod caller;
pub mod error;
pub mod handlers;

use crate::application::engine::LedgerEngine;
use crate::config::ServerConfig;
use crate::error::Result;
use axum::Router;
use axum::routing::{get, post};
use std::sync::Arc;

/// Builds the router. Caller identity comes from the `x-caller-role` and
/// `x-caller-id` headers set by the upstream authenticator.
pub fn router(engine: Arc<LedgerEngine>) -> Router {
    Router::new()
        .route("/wallet", get(handlers::wallet))
        .route("/wallet/transactions", get(handlers::wallet_transactions))
        .route("/payouts", get(handlers::payouts))
        .route(
            "/payment-account",
            get(handlers::payment_account).put(handlers::update_payment_account),
        )
        .route("/payout/request", post(handlers::request_payout))
        .route("/admin/payout", get(handlers::admin_payouts))
        .route("/admin/payout/pending", get(handlers::pending_payouts))
        .route("/admin/payout/history", get(handlers::settled_payouts))
        .route("/admin/payout/{id}/approve", post(handlers::approve_payout))
        .route("/admin/payout/{id}/mark-paid", post(handlers::mark_paid))
        .route("/admin/payout/{id}/reject", post(handlers::reject_payout))
        .route("/admin/revenue/total", get(handlers::revenue_total))
        .route("/admin/revenue/by-course", get(handlers::revenue_by_course))
        .route(
            "/admin/revenue/by-instructor",
            get(handlers::revenue_by_instructor),
        )
        .route(
            "/admin/revenue/transactions",
            get(handlers::revenue_transactions),
        )
        .route("/internal/orders/completed", post(handlers::order_completed))
        .with_state(engine)
}

/// Serves the router until the process receives ctrl-c.
pub async fn serve(engine: Arc<LedgerEngine>, config: ServerConfig) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(config.bind).await?;
    tracing::info!(addr = %listener.local_addr()?, "listening");
    axum::serve(listener, router(engine))
        .with_graceful_shutdown(async {
            if let Err(err) = tokio::signal::ctrl_c().await {
                tracing::warn!(%err, "failed to install ctrl-c handler");
                std::future::pending::<()>().await;
            }
        })
        .await?;
    tracing::info!("server stopped");
    Ok(())
}
