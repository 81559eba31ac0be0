// SPDX-License-Identifier: BUSL-1.1
//! Shared harness: a live tribune-stub on an ephemeral port and clients
//! pointed at it.

#![allow(dead_code)]

use std::sync::Arc;

use tribune_client::{TribuneApiConfig, TribuneClient};
use tribune_core::{Email, MemorySessionStore, SessionStore};
use tribune_state::{AdminSession, RouteGuard};
use tribune_stub::{router, AppState, StubConfig};

pub const ADMIN_EMAIL: &str = "admin@tribune.local";
pub const ADMIN_PASSWORD: &str = "admin";

/// A running stub. Shuts down when dropped.
pub struct Backend {
    pub port: u16,
    pub state: AppState,
    shutdown: Option<tokio::sync::oneshot::Sender<()>>,
}

impl Drop for Backend {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
    }
}

impl Backend {
    pub fn config(&self) -> TribuneApiConfig {
        TribuneApiConfig::local(self.port).unwrap()
    }

    /// A client with its own empty in-memory session.
    pub fn client(&self) -> (TribuneClient, Arc<MemorySessionStore>) {
        let session = Arc::new(MemorySessionStore::new());
        let client = TribuneClient::new(self.config(), session.clone()).unwrap();
        (client, session)
    }

    /// A client logged in as the seeded admin, plus its guarded session.
    pub async fn admin(&self) -> (TribuneClient, Arc<MemorySessionStore>, AdminSession) {
        let (client, session) = self.client();
        client
            .auth()
            .login(&Email::new(ADMIN_EMAIL).unwrap(), ADMIN_PASSWORD)
            .await
            .unwrap();
        let admin = RouteGuard::check(session.as_ref()).session().unwrap();
        (client, session, admin)
    }
}

/// Start a stub with default configuration on a random port.
pub async fn start_backend() -> Backend {
    start_backend_with(StubConfig::default()).await
}

/// Start a stub with `config` (its port is ignored) on a random port.
pub async fn start_backend_with(config: StubConfig) -> Backend {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("failed to bind to random port");
    let port = listener.local_addr().unwrap().port();

    let state = AppState::new(&config).unwrap();
    let app = router(state.clone());
    let (tx, rx) = tokio::sync::oneshot::channel::<()>();

    tokio::spawn(async move {
        axum::serve(listener, app.into_make_service())
            .with_graceful_shutdown(async {
                rx.await.ok();
            })
            .await
            .ok();
    });

    Backend {
        port,
        state,
        shutdown: Some(tx),
    }
}

/// The bearer token currently cached in `session`.
pub fn cached_token(session: &dyn SessionStore) -> String {
    session.get(tribune_core::KEY_TOKEN).unwrap()
}

pub fn email(s: &str) -> Email {
    Email::new(s).unwrap()
}
