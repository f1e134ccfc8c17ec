//! teaser-oracle: HTTP front for the stateless verification-code oracle
//!
//! Two POST endpoints (`/get-vc`, `/get-messageID`) wrap
//! [`teaser_core::Oracle`]. Callers authenticate each request by presenting
//! the recipient's secret; a deployment-wide bearer token can additionally
//! gate the transport.

pub mod config;
pub mod routes;

pub use config::OracleConfig;
pub use routes::{router, OracleState};

use anyhow::Result;
use tokio::net::TcpListener;
use tracing::info;

/// Serve the oracle on an already-bound listener until `shutdown` resolves.
pub async fn serve<F>(listener: TcpListener, state: OracleState, shutdown: F) -> Result<()>
where
    F: std::future::Future<Output = ()> + Send + 'static,
{
    let addr = listener.local_addr()?;
    info!(%addr, code_length = state.code_length(), "oracle listening");
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown)
        .await?;
    Ok(())
}
