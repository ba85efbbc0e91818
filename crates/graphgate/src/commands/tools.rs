//! Tools command - lists the tools the MCP server exposes.

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;

use graphgate_mcp::{ToolInfo, ToolInvoker};

use super::Context;

/// Arguments for the tools command.
#[derive(Args, Debug)]
pub struct ToolsArgs {
    /// MCP server URL (overrides config)
    #[arg(long, env = "GRAPHGATE_MCP_URL")]
    pub mcp_url: Option<String>,

    /// Path to config file (overrides default discovery)
    #[arg(long)]
    pub config: Option<PathBuf>,
}

/// Run the tools command.
pub async fn run(args: ToolsArgs, ctx: &Context) -> Result<()> {
    let loaded = super::load_config(args.config.as_deref())?;
    let mut mcp = loaded.config.mcp();
    if let Some(url) = args.mcp_url {
        mcp.url = url;
    }

    let client = super::connect_mcp(&mcp).await?;
    let tools = client.list_tools().await;
    client.shutdown().await;
    let tools = tools?;

    if ctx.json_output {
        println!("{}", serde_json::to_string_pretty(&tools)?);
    } else {
        print_table(&tools, ctx.verbose);
    }
    Ok(())
}

fn print_table(tools: &[ToolInfo], verbose: bool) {
    if tools.is_empty() {
        println!("The MCP server exposes no tools.");
        return;
    }

    println!("{:<32} DESCRIPTION", "NAME");
    println!("{}", "-".repeat(80));
    for tool in tools {
        let description = tool.description.as_deref().unwrap_or("");
        let first_line = description.lines().next().unwrap_or("");
        println!("{:<32} {}", tool.name, first_line);
        if verbose && let Some(ref schema) = tool.input_schema {
            println!("  input: {}", schema);
        }
    }
}
