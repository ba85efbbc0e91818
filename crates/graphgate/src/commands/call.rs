//! Call command - invokes a single tool and prints the normalized result.

use std::path::PathBuf;

use anyhow::{Context as _, Result, bail};
use clap::Args;
use serde_json::Value;

use graphgate_mcp::{ToolInvoker, ToolResult};
use graphgate_server::{GraphData, extract_table, normalize, reported_failure};

use super::Context;

/// Arguments for the call command.
#[derive(Args, Debug)]
pub struct CallArgs {
    /// Tool name, forwarded unchanged
    pub name: String,

    /// Tool arguments as a JSON object
    #[arg(long, default_value = "{}")]
    pub args: String,

    /// MCP server URL (overrides config)
    #[arg(long, env = "GRAPHGATE_MCP_URL")]
    pub mcp_url: Option<String>,

    /// Path to config file (overrides default discovery)
    #[arg(long)]
    pub config: Option<PathBuf>,
}

/// Run the call command.
pub async fn run(args: CallArgs, ctx: &Context) -> Result<()> {
    let arguments: Value =
        serde_json::from_str(&args.args).context("--args must be valid JSON")?;

    let loaded = super::load_config(args.config.as_deref())?;
    let mut mcp = loaded.config.mcp();
    if let Some(url) = args.mcp_url {
        mcp.url = url;
    }

    let client = super::connect_mcp(&mcp).await?;
    let result = client.invoke(&args.name, arguments).await;
    client.shutdown().await;
    let result = reject_reported_failure(result?)?;

    let data = normalize(&result);
    if ctx.json_output {
        println!("{}", serde_json::to_string_pretty(&data)?);
        return Ok(());
    }

    match data {
        GraphData::Empty => println!("(no data returned)"),
        GraphData::Value(Value::String(text)) => println!("{}", text),
        GraphData::Value(value) => println!("{}", serde_json::to_string_pretty(&value)?),
    }

    if ctx.verbose
        && let Some(table) = extract_table(&result)
    {
        println!();
        println!("{} row(s), columns: {}", table.rows.len(), table.columns.join(", "));
    }
    Ok(())
}

/// A tool that answers `{ok: false}` failed, even though the call succeeded.
fn reject_reported_failure(result: ToolResult) -> Result<ToolResult> {
    if let Some(error) = reported_failure(&result) {
        bail!("tool reported failure: {error}");
    }
    Ok(result)
}
