use anyhow::{anyhow, Result};
use clap::Parser;
use std::net::SocketAddr;
use teaser_oracle::{serve, OracleConfig, OracleState};
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about = "Stateless verification code oracle", long_about = None)]
struct Cli {
    /// Listen address (overrides ORACLE_BIND)
    #[arg(long)]
    bind: Option<SocketAddr>,
    /// Verification code width in digits (overrides ORACLE_CODE_LENGTH)
    #[arg(long)]
    code_length: Option<usize>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let mut config = OracleConfig::from_env()?;
    if let Some(bind) = cli.bind {
        config.bind = bind;
    }
    if let Some(len) = cli.code_length {
        config.code_length = len;
    }
    if config.api_token.is_none() {
        info!("ORACLE_API_TOKEN unset; transport authentication disabled");
    }

    let state = OracleState::new(&config).map_err(|e| anyhow!("oracle config: {e}"))?;
    let listener = TcpListener::bind(config.bind).await?;
    serve(listener, state, async {
        let _ = tokio::signal::ctrl_c().await;
        info!("shutdown requested");
    })
    .await
}
