use clap::Parser;
use impact_ledger::cli::{self, Cli, Commands};
use impact_ledger::config::{Config, LogFormat};
use impact_ledger::{create_app, middleware, AppState};
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = Config::from_env()?;

    // Setup logging
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into());
    match config.log_format {
        LogFormat::Json => tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init(),
        LogFormat::Text => tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init(),
    }

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => serve(config).await,
        Commands::Config => cli::handle_config_validate(&config),
        Commands::Split { amount, percentage } => cli::handle_split(&config, &amount, percentage),
        Commands::Verify { file } => cli::handle_verify(&config, &file),
    }
}

async fn serve(config: Config) -> anyhow::Result<()> {
    let state = AppState::from_config(&config);
    tracing::info!(
        environment = %config.ledger_environment,
        split_percentage = config.split_percentage,
        "Ledger initialized"
    );
    if state.payouts.is_some() {
        tracing::info!(mode = %config.paypal.mode, url = %config.paypal.base_url(), "PayPal client initialized");
    } else {
        tracing::warn!("PayPal credentials not set; payout endpoints disabled");
    }

    let app = create_app(state).layer(middleware::cors_layer(config.cors_allowed_origins.as_deref()));

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port));
    tracing::info!("listening on {}", addr);

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
