//! teaser-service: two-phase advisory delivery
//!
//! Phase one ([`delivery`]) sends a recipient a teaser: the advisory title
//! plus a verification code issued by the oracle. Phase two
//! ([`verification`]) runs when the recipient dials the code back over USSD
//! ([`ussd`]); the oracle reverses it and the full advisory goes out by SMS.
//!
//! Module layout:
//! - `config`: environment-driven settings
//! - `directory`: recipient and advisory lookups
//! - `oracle_client`: remote and in-process code oracles
//! - `sms`: outbound SMS gateways
//! - `outcome`: step-tagged attempt results
//! - `app`, `http`: wiring and the HTTP front

pub mod app;
pub mod config;
pub mod delivery;
pub mod directory;
pub mod http;
pub mod oracle_client;
pub mod outcome;
pub mod sms;
pub mod ussd;
pub mod verification;

pub use app::App;
pub use config::ServiceConfig;
pub use outcome::{FailureKind, Outcome, Step};

use anyhow::Result;
use tokio::net::TcpListener;
use tracing::info;

/// Serve the HTTP front on an already-bound listener until `shutdown` resolves.
pub async fn serve<F>(listener: TcpListener, app: &App, shutdown: F) -> Result<()>
where
    F: std::future::Future<Output = ()> + Send + 'static,
{
    let addr = listener.local_addr()?;
    info!(%addr, "teaser service listening");
    axum::serve(listener, http::router(http::AppState::from(app)))
        .with_graceful_shutdown(shutdown)
        .await?;
    Ok(())
}
