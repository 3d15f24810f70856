//! Locator relay agent binary.
//!
//! Logs a user in against the Locator API, then relays periodic GPS
//! fixes from gpsd to it until interrupted.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use locator_agent::client::ApiClient;
use locator_agent::config::AgentConfig;
use locator_agent::location::GpsdSource;
use locator_agent::permissions::PermissionState;
use locator_agent::session::{self, UserSession};
use locator_agent::tracker::{Tracker, TrackerConfig, TrackerState};

#[derive(Parser)]
#[command(name = "locator-agent")]
#[command(version, about = "Locator relay agent", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Locator API username
    #[arg(long, env = "LOCATOR_USERNAME")]
    username: Option<String>,

    /// Locator API password
    #[arg(long, env = "LOCATOR_PASSWORD", hide_env_values = true)]
    password: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Log in and relay location fixes until interrupted (default)
    Run,
    /// Log in, print the session user id and exit
    Login,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,locator_agent=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load environment variables
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let config = AgentConfig::from_env()?;
    tracing::info!(
        api_url = %config.api_url,
        gpsd_addr = %config.gpsd_addr,
        poll_secs = config.poll_interval.as_secs(),
        "Agent configuration loaded"
    );

    let username = cli
        .username
        .context("informe o usuário (--username ou LOCATOR_USERNAME)")?;
    let password = cli
        .password
        .context("informe a senha (--password ou LOCATOR_PASSWORD)")?;

    let client = ApiClient::new(&config.api_url, config.http_timeout);

    let session = match session::login(&client, &username, &password).await {
        Ok(session) => session,
        Err(e) => {
            tracing::error!(error = %e, "Falha no login");
            anyhow::bail!("{e}");
        }
    };
    tracing::info!(user_id = session.user_id, "Login bem-sucedido!");
    println!("ID do usuário: {}", session.user_id);

    match cli.command {
        Some(Commands::Login) => Ok(()),
        Some(Commands::Run) | None => run_tracker(config, client, session).await,
    }
}

/// Gate on consent, then run the tracker until ctrl-c or self-termination.
async fn run_tracker(config: AgentConfig, client: ApiClient, session: UserSession) -> Result<()> {
    let permissions = PermissionState::from_env();
    if !permissions.fine_location {
        anyhow::bail!(
            "Permissão de localização negada. \
             Defina LOCATOR_ALLOW_LOCATION=true para permitir o rastreamento."
        );
    }
    if !permissions.background_location {
        tracing::warn!(
            "Permissão de segundo plano ausente. \
             Defina LOCATOR_ALLOW_BACKGROUND=true para rastrear o tempo todo."
        );
    }

    let source = Arc::new(GpsdSource::new(config.gpsd_addr.clone()));
    let (tracker, handle) = Tracker::new(
        TrackerConfig {
            poll_interval: config.poll_interval,
            min_interval: config.min_interval,
        },
        permissions,
        source,
        Arc::new(client),
    );

    let tracker_task = tokio::spawn(tracker.run());
    handle.start(session).await?;
    tracing::info!("Iniciando rastreamento em segundo plano...");

    let mut state = handle.state();
    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Shutdown signal received");
            let _ = handle.stop().await;
            handle.stopped().await;
        }
        _ = state.wait_for(|s| *s == TrackerState::Stopped) => {
            tracing::warn!("Rastreamento encerrado pelo próprio serviço");
        }
    }

    tracker_task.await??;
    tracing::info!("Rastreamento em segundo plano parado.");
    Ok(())
}
