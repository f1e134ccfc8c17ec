use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::net::SocketAddr;
use std::path::PathBuf;
use teaser_service::delivery::DeliveryRequest;
use teaser_service::verification::VerificationRequest;
use teaser_service::{serve, App, Outcome, ServiceConfig};
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about = "Two-phase advisory delivery service", long_about = None)]
struct Cli {
    /// Directory seed file (overrides TEASER_DIRECTORY_SEED)
    #[arg(long, global = true)]
    seed: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the HTTP front
    Serve {
        #[arg(long)]
        bind: Option<SocketAddr>,
    },
    /// Send one teaser and print the outcome
    Deliver { message_id: String, phone: String },
    /// Verify one dialled code and print the outcome
    Verify {
        phone: String,
        #[arg(long, default_value = "")]
        service_code: String,
        #[arg(long, default_value = "")]
        text: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let mut config = ServiceConfig::from_env()?;
    if cli.seed.is_some() {
        config.directory_seed = cli.seed;
    }

    match cli.command {
        Commands::Serve { bind } => {
            if let Some(bind) = bind {
                config.bind = bind;
            }
            let app = App::from_config(&config)?;
            let listener = TcpListener::bind(config.bind).await?;
            serve(listener, &app, async {
                let _ = tokio::signal::ctrl_c().await;
                info!("shutdown requested");
            })
            .await
        }
        Commands::Deliver { message_id, phone } => {
            let app = App::from_config(&config)?;
            let outcome = app
                .delivery
                .deliver(&DeliveryRequest {
                    message_id,
                    recipient: phone,
                })
                .await;
            report(&outcome, "delivery")
        }
        Commands::Verify {
            phone,
            service_code,
            text,
        } => {
            let app = App::from_config(&config)?;
            let outcome = app
                .verification
                .verify(&VerificationRequest {
                    recipient: phone,
                    service_code,
                    text,
                })
                .await;
            report(&outcome, "verification")
        }
    }
}

fn report<S: Serialize>(outcome: &Outcome<S>, what: &str) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(outcome)?);
    match outcome.step() {
        None => Ok(()),
        Some(step) => Err(anyhow!("{what} failed at {step}")),
    }
}
