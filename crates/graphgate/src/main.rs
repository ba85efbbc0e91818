//! graphgate: answers questions about a property graph by chaining a
//! language model with a remote Cypher tool server.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

mod commands;

use commands::{call, config, start, tools};

const CRATES: [&str; 5] = [
    "graphgate",
    "graphgate_server",
    "graphgate_mcp",
    "graphgate_llm",
    "graphgate_config",
];

#[derive(Parser)]
#[command(name = "graphgate", author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Debug-level logs and extra detail in command output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Machine-readable output
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Serve the HTTP gateway
    Start(start::StartArgs),
    /// List the tool server's tools
    Tools(tools::ToolsArgs),
    /// Call a single tool and print what the gateway would extract from it
    Call(call::CallArgs),
    /// Print the merged configuration
    Config(config::ConfigArgs),
}

/// `crate=level` for each workspace crate, then `rest` for dependencies.
fn directives(level: &str, rest: &str) -> String {
    CRATES
        .iter()
        .map(|c| format!("{c}={level}"))
        .chain(std::iter::once(rest.to_string()))
        .collect::<Vec<_>>()
        .join(",")
}

/// Human logs on stderr (RUST_LOG wins when set) and a daily JSON file with
/// everything down to trace. The guard must live until exit.
fn init_tracing(verbose: bool) -> WorkerGuard {
    let console = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if verbose {
            EnvFilter::new(directives("debug", "info"))
        } else {
            EnvFilter::new(directives("info", "warn"))
        }
    });

    let log_dir = graphgate_config::xdg_config_dir()
        .map(|d| d.join("logs"))
        .unwrap_or_else(|| PathBuf::from("logs"));
    let (file_writer, guard) =
        tracing_appender::non_blocking(tracing_appender::rolling::daily(log_dir, "graphgate.log"));

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_filter(console),
        )
        .with(
            fmt::layer()
                .json()
                .with_writer(file_writer)
                .with_filter(EnvFilter::new(directives("trace", "info"))),
        )
        .init();

    guard
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let _log_guard = init_tracing(cli.verbose);

    let ctx = commands::Context {
        json_output: cli.json,
        verbose: cli.verbose,
    };

    match cli.command {
        Commands::Start(args) => start::run(args, &ctx).await,
        Commands::Tools(args) => tools::run(args, &ctx).await,
        Commands::Call(args) => call::run(args, &ctx).await,
        Commands::Config(args) => config::run(args, &ctx).await,
    }
}
