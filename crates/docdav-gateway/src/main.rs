//! docdav - WebDAV gateway for the document API

use clap::Parser;
use docdav_gateway::{GatewayConfig, run_server_with_shutdown};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "docdav")]
#[command(about = "WebDAV gateway for a workspace-scoped document API")]
#[command(version)]
struct Args {
    /// Host to bind to
    #[arg(short = 'H', long, default_value = "0.0.0.0", env = "DOCDAV_HOST")]
    host: String,

    /// Port to listen on
    #[arg(short, long, default_value = "8082", env = "DOCDAV_PORT")]
    port: u16,

    /// Document API base URL
    #[arg(long, default_value = "http://localhost:8080", env = "DOCDAV_API_URL")]
    api_url: String,

    /// Identity service base URL
    #[arg(long, default_value = "http://localhost:8081", env = "DOCDAV_IDP_URL")]
    idp_url: String,

    /// Use in-memory storage (for testing, data will not persist)
    #[arg(long, env = "DOCDAV_MEMORY_STORE")]
    memory_store: bool,

    /// Enable debug logging
    #[arg(short, long, env = "DOCDAV_DEBUG")]
    debug: bool,

    /// Maximum number of cached tokens
    #[arg(long, default_value = "1024", env = "DOCDAV_TOKEN_CACHE_CAPACITY")]
    token_cache_capacity: usize,

    /// Seconds before expiry at which a cached token is renewed
    #[arg(long, default_value = "60", env = "DOCDAV_TOKEN_EXPIRY_SKEW")]
    token_expiry_skew_secs: u64,

    /// Requests per second allowed per user
    #[arg(long, default_value = "100", env = "DOCDAV_RATE_LIMIT")]
    rate_limit_rps: u32,

    /// Maximum PUT body size in bytes
    #[arg(long, default_value = "536870912", env = "DOCDAV_MAX_BODY_SIZE")]
    max_body_size: usize,

    /// Timeout for document API and identity service calls, in seconds
    #[arg(long, default_value = "30", env = "DOCDAV_REQUEST_TIMEOUT")]
    request_timeout_secs: u64,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let args = Args::parse();

    // Setup logging
    let log_level = if args.debug { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| format!("docdav_gateway={0},docdav_client={0},tower_http=debug", log_level).into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting docdav gateway on {}:{}", args.host, args.port);

    if args.memory_store {
        tracing::warn!("Using in-memory storage - data will NOT persist!");
    }

    let config = GatewayConfig {
        host: args.host,
        port: args.port,
        api_url: args.api_url,
        idp_url: args.idp_url,
        use_memory_store: args.memory_store,
        token_cache_capacity: args.token_cache_capacity,
        token_expiry_skew_secs: args.token_expiry_skew_secs,
        rate_limit_rps: args.rate_limit_rps,
        max_body_size: args.max_body_size,
        request_timeout_secs: args.request_timeout_secs,
    };

    run_server_with_shutdown(config, async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for shutdown signal: {}", e);
            std::future::pending::<()>().await;
        }
    })
    .await
}
