//! Config command - shows the resolved configuration and where it came from.

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;

use super::Context;

/// Arguments for the config command.
#[derive(Args, Debug)]
pub struct ConfigArgs {
    /// Path to config file (overrides default discovery)
    #[arg(long)]
    pub config: Option<PathBuf>,
}

/// Run the config command.
pub async fn run(args: ConfigArgs, ctx: &Context) -> Result<()> {
    let loaded = super::load_config(args.config.as_deref())?;
    let resolved = loaded.config.resolved();

    if ctx.json_output {
        let output = serde_json::json!({
            "sources": loaded
                .sources
                .iter()
                .map(|s| serde_json::json!({"path": s.path.display().to_string(), "loaded": s.loaded}))
                .collect::<Vec<_>>(),
            "config": resolved,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    println!("# graphgate configuration\n");
    println!("# Config file search order (later overrides earlier):");
    for source in &loaded.sources {
        let status = if source.loaded { "✓" } else { "·" };
        println!("#   {} {}", status, source.path.display());
    }
    println!();
    print!("{}", resolved.to_toml()?);
    Ok(())
}
