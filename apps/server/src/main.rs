//! SpotMux server binary
//!
//! Loads `.env`, initialises tracing on stderr, builds the broker from the
//! environment and serves the Spotify tools over MCP stdio.

mod cli;

use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::Parser;
use rmcp::ServiceExt;
use spotmux_core::BrokerConfig;
use spotmux_gateway::{
    cache, http_client, AuthStatus, BackendTokenClient, SessionManager, SpotifyMcpHandler,
    ToolDispatcher,
};
use tracing::{info, warn};

use cli::{Cli, Commands};

const LOG_PREFIX: &str = "spotmux";

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    let _guard = init_tracing()?;

    let config = Arc::new(BrokerConfig::from_env().context("Failed to load configuration")?);
    let http = http_client(&config)?;

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => serve(config, http).await,
        Commands::Status => {
            let session = SessionManager::new(&config, cache::from_config(&config, http.clone()), http);
            report_status(&session).await;
            Ok(())
        }
        Commands::ExchangeCode { code } => exchange_code(&config, http, &code).await,
    }
}

/// Tracing to stderr (stdout carries MCP frames), plus a daily file when
/// `SPOTMUX_LOG_DIR` is set
fn init_tracing() -> Result<Option<tracing_appender::non_blocking::WorkerGuard>> {
    use tracing_appender::rolling::{RollingFileAppender, Rotation};
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new("info,spotmux=debug,spotmux_core=debug,spotmux_gateway=debug")
    });

    let console_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .compact()
        .with_thread_names(false)
        .with_line_number(false)
        .with_file(false)
        .with_target(true);

    let (file_layer, guard) = match std::env::var("SPOTMUX_LOG_DIR").ok().filter(|d| !d.is_empty()) {
        Some(dir) => {
            let dir = Path::new(&dir);
            std::fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create log directory {}", dir.display()))?;
            let appender = RollingFileAppender::builder()
                .rotation(Rotation::DAILY)
                .filename_prefix(LOG_PREFIX)
                .filename_suffix("log")
                .build(dir)
                .context("Failed to create log file appender")?;
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_thread_ids(true)
                .with_line_number(true)
                .with_file(true)
                .with_target(true);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer)
        .with(file_layer)
        .init();

    Ok(guard)
}

async fn serve(config: Arc<BrokerConfig>, http: spotmux_gateway::transport::HttpClient) -> Result<()> {
    let cache = cache::from_config(&config, http.clone());
    let session = Arc::new(SessionManager::new(&config, cache, http.clone()));
    report_status(&session).await;

    let dispatcher = ToolDispatcher::new(session, http, config.api_base_url.clone());
    let handler = SpotifyMcpHandler::new(dispatcher);

    info!("[Server] Serving Spotify tools over stdio");
    let service = handler
        .serve(rmcp::transport::stdio())
        .await
        .context("Failed to start MCP stdio service")?;
    let reason = service.waiting().await.context("MCP service task failed")?;
    info!(reason = ?reason, "[Server] MCP session ended");
    Ok(())
}

async fn report_status(session: &SessionManager) {
    match session.status().await {
        AuthStatus::Valid { expires_at } => {
            info!(expires_at = %expires_at, "[Server] Spotify session is valid");
        }
        AuthStatus::Expired { refreshable: true } => {
            info!("[Server] Spotify token expired, it will be refreshed on first use");
        }
        AuthStatus::Expired { refreshable: false } => {
            warn!("[Server] Spotify token expired and cannot be refreshed, sign in again");
            log_authorization_url(session);
        }
        AuthStatus::NotAuthenticated => {
            warn!("[Server] Spotify is not authorized yet");
            log_authorization_url(session);
        }
        AuthStatus::Unavailable { cause } => {
            warn!(error = %cause, "[Server] Could not read the shared token");
        }
    }
}

fn log_authorization_url(session: &SessionManager) {
    match session.authorization_url() {
        Ok((url, _state)) => info!(url = %url, "[Server] Authorize access at this URL"),
        Err(e) => warn!(error = %e, "[Server] Could not build authorization URL"),
    }
}

async fn exchange_code(
    config: &BrokerConfig,
    http: spotmux_gateway::transport::HttpClient,
    code: &str,
) -> Result<()> {
    let Some(backend_url) = config.backend_url.as_deref() else {
        bail!("SPOTIFY_BACKEND_URL must be set to exchange an authorization code");
    };

    let record = BackendTokenClient::new(http, backend_url)
        .exchange_auth_code(code.trim())
        .await
        .context("Authorization code exchange failed")?;
    info!(
        expires_at = %record.expires_at,
        has_refresh_token = record.can_refresh(),
        "[Server] Authorization code exchanged, shared token stored by backend"
    );
    Ok(())
}
