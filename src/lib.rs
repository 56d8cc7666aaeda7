//! The Saba booking backend: a REST API for a chart of accounts, double-entry
//! journals, persons, projects, units, reservations, shares and wallets,
//! plus the theme settings and translation files for the web client.
//!
//! The binaries in `src/bin` use [build_router] and [initialize_db] to serve
//! the API and prepare databases.

use std::{net::SocketAddr, time::Duration};

use axum_server::Handle;
use tokio::signal;

pub mod account;
mod app_state;
pub mod auth;
mod db;
pub mod endpoints;
mod error;
pub mod journal;
mod logging;
pub mod person;
pub mod project;
pub mod report;
pub mod reservation;
mod response;
mod routing;
pub mod share;
pub mod theme;
pub mod translation;
pub mod unit;
pub mod user_log;
pub mod wallet;

pub use app_state::AppState;
pub use auth::{PasswordHash, ValidatedPassword, get_user_by_username, update_password};
pub use db::initialize as initialize_db;
pub use error::Error;
pub use logging::{LOG_BODY_LENGTH_LIMIT, logging_middleware};
pub use response::{Envelope, ErrorBody, codes};
pub use routing::build_router;

/// Wait for a Ctrl+C or terminate signal and then shut down the server behind `handle`.
pub async fn graceful_shutdown(handle: Handle<SocketAddr>) {
    let ctrl_c = async {
        if let Err(error) = signal::ctrl_c().await {
            tracing::error!("Could not listen for Ctrl+C: {error}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(error) => {
                tracing::error!("Could not install the terminate signal handler: {error}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::debug!("Received ctrl+c signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
        _ = terminate => {
            tracing::debug!("Received terminate signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
    }
}
