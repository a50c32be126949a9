use anyhow::Context;
use clap::{Parser, Subcommand};
use otpchat::{
    config,
    email::{EmailService, OtpMailer},
    relay::RelayClient,
    state::AppState,
    views::Views,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::info;

// ── CLI definition ─────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "otpchat", about = "Email OTP gated chat front-end", version)]
struct Cli {
    /// Path to TOML config file
    #[arg(short, long, default_value = "otpchat.toml")]
    config: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server
    Serve,
    /// Validate the configuration and print it with secrets masked
    CheckConfig,
}

// ── Entry point ────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialise structured logging from RUST_LOG (default: info)
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "otpchat=info,tower_http=info".into()),
        )
        .init();

    let cli = Cli::parse();
    let cfg = config::load(&cli.config)?;

    match cli.command {
        Commands::Serve => serve(cfg).await,
        Commands::CheckConfig => check_config(cfg),
    }
}

// ── Serve ──────────────────────────────────────────────────────────────────

async fn serve(cfg: config::AppConfig) -> anyhow::Result<()> {
    cfg.validate().context("invalid configuration")?;

    let mailer = build_mailer(&cfg);
    let relay = RelayClient::new(cfg.webhook_url.clone(), cfg.relay_timeout())
        .context("failed to build webhook client")?;
    info!(
        "Webhook relay: {} (timeout {}s)",
        relay.url(),
        cfg.relay_timeout_secs
    );
    let views = Views::new().context("failed to compile page templates")?;

    let addr: SocketAddr = format!("{}:{}", cfg.host, cfg.port)
        .parse()
        .context("invalid bind address")?;

    let state = AppState::new(cfg, views, mailer, relay);
    let app = otpchat::routes::app(state);

    info!("Listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("failed to bind TCP listener")?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    info!("Server stopped.");
    Ok(())
}

/// Email service, or the reason it is unavailable (codes then go on screen).
fn build_mailer(cfg: &config::AppConfig) -> Result<Arc<dyn OtpMailer>, String> {
    match EmailService::new(&cfg.smtp) {
        Ok(svc) => {
            info!(
                "Email service ready (SMTP: {}:{})",
                cfg.smtp.host, cfg.smtp.port
            );
            Ok(Arc::new(svc))
        }
        Err(e) => {
            tracing::warn!(
                "SMTP not available: {} — OTP codes will be shown on screen",
                e
            );
            Err(e.to_string())
        }
    }
}

// ── Check config ───────────────────────────────────────────────────────────

fn check_config(cfg: config::AppConfig) -> anyhow::Result<()> {
    let rendered = toml::to_string_pretty(&cfg.redacted()).context("failed to render config")?;
    println!("{rendered}");

    match EmailService::new(&cfg.smtp) {
        Ok(_) => println!("SMTP: ready ({}:{})", cfg.smtp.host, cfg.smtp.port),
        Err(e) => println!("SMTP: unavailable ({e}) — codes will be shown on screen"),
    }

    cfg.validate().context("invalid configuration")?;
    println!("Configuration OK");
    Ok(())
}

// ── Graceful shutdown ──────────────────────────────────────────────────────

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to install CTRL+C handler: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received, stopping server...");
}
