//! Scriptly HTTP surface.
//!
//! Serves the admin tool over axum: page routes answering JSON view models,
//! the action API under `/api`, and a sign-in flow that exchanges a client
//! identity token for a signed session cookie.
//!
//! ## Architectural Layer
//!
//! **Infrastructure.** Handlers translate HTTP into calls on the [`nodes`]
//! agents and the [`pipeline::BlogStore`] port and map their errors onto
//! status codes. Every failure answers `{ "success": false, "error": ... }`.
//!
//! ## Module Layout
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`error`] | [`ApiError`] and its status mapping |
//! | [`routes`] | Route table and handlers |
//! | [`session`] | Signed-cookie session and its extractors |
//! | [`state`] | [`AppState`], [`ServerLimits`], [`ClientConfig`] |
//! | [`views`] | Page view models |

pub mod error;
pub mod routes;
pub mod session;
pub mod state;
pub mod views;

use std::future::Future;
use std::io;

use axum::Router;
use tokio::net::TcpListener;
use tracing::info;

pub use axum_extra::extract::cookie::Key;
pub use error::ApiError;
pub use routes::router;
pub use session::{Session, SESSION_COOKIE};
pub use state::{AppState, ClientConfig, ServerLimits};

/// Serves `router` on `listener` until `shutdown` resolves, then lets
/// in-flight requests finish.
pub async fn serve<F>(listener: TcpListener, router: Router, shutdown: F) -> io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    if let Ok(addr) = listener.local_addr() {
        info!(%addr, "listening");
    }
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown)
        .await
}

/// Resolves on Ctrl-C, or SIGTERM on Unix.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %err, "could not listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                tracing::warn!(error = %err, "could not listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("shutdown signal received");
}
