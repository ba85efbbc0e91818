//! Start command - launches the gateway server.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::Args;
use tracing::{info, warn};

use graphgate_config::GatewayConfig;
use graphgate_llm::{OpenAiBackend, OpenAiConfig, SharedBackend};
use graphgate_mcp::SharedInvoker;
use graphgate_server::{Server, ServerConfig};

use super::Context;

/// Arguments for the start command.
///
/// CLI arguments override config file values.
#[derive(Args, Debug, Default)]
pub struct StartArgs {
    /// Port to listen on (overrides config)
    #[arg(short, long, env = "GRAPHGATE_PORT")]
    pub port: Option<u16>,

    /// Address to bind to (overrides config)
    #[arg(short, long)]
    pub bind: Option<String>,

    /// MCP server URL (overrides config)
    #[arg(long, env = "GRAPHGATE_MCP_URL")]
    pub mcp_url: Option<String>,

    /// Model (overrides config)
    #[arg(long, env = "GRAPHGATE_MODEL")]
    pub model: Option<String>,

    /// OpenAI-compatible base URL (overrides config)
    #[arg(long)]
    pub base_url: Option<String>,

    /// API key (overrides config)
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Path to config file (overrides default discovery)
    #[arg(long)]
    pub config: Option<PathBuf>,
}

/// Run the start command.
pub async fn run(args: StartArgs, ctx: &Context) -> Result<()> {
    // ── Load configuration ──────────────────────────────────────────────

    let loaded = super::load_config(args.config.as_deref())?;

    if ctx.verbose {
        let sources = loaded.loaded_from();
        if sources.is_empty() {
            println!("No config files found, using defaults + CLI args");
        } else {
            for source in sources {
                println!("Loaded config: {}", source.display());
            }
        }
    }

    let config = apply_overrides(loaded.config, &args);

    // ── Text generation ─────────────────────────────────────────────────

    let llm_config = config.llm();
    let api_key = match args.api_key {
        Some(key) => Some(key),
        None => llm_config.require_api_key()?,
    };
    let openai = match api_key {
        Some(key) => OpenAiConfig::openai(key).with_base_url(&llm_config.base_url),
        None => OpenAiConfig::local(&llm_config.base_url),
    }
    .with_model(&llm_config.model)
    .with_timeout(Duration::from_secs(llm_config.timeout_secs));
    let llm: SharedBackend = Arc::new(OpenAiBackend::new(openai)?);

    // ── MCP client (refuse to start without it) ─────────────────────────

    let mcp_config = config.mcp();
    let client = Arc::new(super::connect_mcp(&mcp_config).await?);
    if let Some(info) = client.server_info() {
        info!(server = %info.name, version = %info.version, url = %mcp_config.url, "Connected to MCP server");
    }

    // ── Serve ───────────────────────────────────────────────────────────

    let server_config = ServerConfig::from_gateway(&config)?;
    let addr = server_config.bind_address;
    let invoker: SharedInvoker = client.clone();

    if !ctx.json_output {
        println!("graphgate listening on http://{}", addr);
        println!("  MCP:   {}", mcp_config.url);
        println!("  Model: {}", llm_config.model);
    }

    let result = Server::new(invoker, llm, server_config)
        .run_with_shutdown(addr, shutdown_signal())
        .await;

    client.shutdown().await;
    result?;
    Ok(())
}

/// Fold CLI flags into the loaded configuration.
fn apply_overrides(mut config: GatewayConfig, args: &StartArgs) -> GatewayConfig {
    let mut server = config.server();
    if let Some(port) = args.port {
        server.port = port;
    }
    if let Some(ref bind) = args.bind {
        server.bind = bind.clone();
    }
    config.server = Some(server);

    let mut llm = config.llm();
    if let Some(ref model) = args.model {
        llm.model = model.clone();
    }
    if let Some(ref base_url) = args.base_url {
        llm.base_url = base_url.clone();
    }
    config.llm = Some(llm);

    if let Some(ref url) = args.mcp_url {
        let mut mcp = config.mcp();
        mcp.url = url.clone();
        config.mcp = Some(mcp);
    }

    config
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
