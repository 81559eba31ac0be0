// SPDX-License-Identifier: BUSL-1.1
//! Tribune backend stub server, standalone development binary.
//!
//! Storage is in-memory (DashMap) with no persistence; data is lost on
//! restart.

use std::net::SocketAddr;

use anyhow::Context;
use tracing_subscriber::EnvFilter;

use tribune_stub::{router, AppState, StubConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = StubConfig::from_env()?;
    let state = AppState::new(&config).context("invalid seeded admin")?;
    let app = router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!(admin = %config.admin_email, "tribune-stub listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    axum::serve(listener, app.into_make_service())
        .await
        .context("server error")?;
    Ok(())
}
