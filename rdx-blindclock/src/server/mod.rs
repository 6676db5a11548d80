//! The HTTP query and action surface.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use axum::Router;
use tokio::net::TcpListener;
use tracing::info;

use crate::access::StaffAuthorizer;
use crate::engine::ClockEngine;
use crate::time::Clock;

pub mod dto;
pub mod error;
pub mod logging;
pub mod routes;

pub use error::ApiError;
pub use routes::ServerContext;

const LOG_TARGET: &str = "server";

/// Axum server facade hosting the clock endpoints.
pub struct ClockServer {
    router: Router,
}

impl ClockServer {
    pub fn new(
        engine: ClockEngine,
        authorizer: Arc<dyn StaffAuthorizer>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let context = Arc::new(ServerContext {
            engine,
            authorizer,
            clock,
        });
        Self {
            router: routes::router(context),
        }
    }

    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Serves until a Ctrl+C signal is received.
    pub async fn serve(self, bind: SocketAddr) -> anyhow::Result<()> {
        let listener = TcpListener::bind(bind)
            .await
            .with_context(|| format!("failed to bind {bind}"))?;
        info!(target: LOG_TARGET, %bind, "clock server listening. Press Ctrl+C to shut down.");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async {
                tokio::signal::ctrl_c().await.ok();
                info!(target: LOG_TARGET, "shutdown signal received");
            })
            .await
            .context("clock server failed")?;

        info!(target: LOG_TARGET, "clock server has shut down");
        Ok(())
    }
}
