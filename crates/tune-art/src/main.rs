mod script;

use std::io::{Read, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tune_art_config::AppConfig;
use tune_art_core::AppContext;

/// Replays pixel-art edit scripts against the tune-art editing core.
#[derive(Parser, Debug)]
#[command(name = "tune-art", version, about)]
struct Cli {
    /// Script to run. Reads stdin when omitted.
    script: Option<PathBuf>,

    /// Config file to use instead of `tune-art.json` next to the executable.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Print the final stage as JSON.
    #[arg(long)]
    json: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_path = cli.config.unwrap_or_else(AppConfig::config_path);
    let config = AppConfig::load_or_create(&config_path);

    // Initialize logging
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log_filter)),
        )
        .init();

    tracing::info!("Starting tune-art with config {}", config_path.display());

    let text = match &cli.script {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read script {}", path.display()))?,
        None => {
            let mut text = String::new();
            std::io::stdin()
                .read_to_string(&mut text)
                .context("Failed to read script from stdin")?;
            text
        }
    };
    let commands = script::parse_script(&text)?;

    let ctx = AppContext::new(&config);
    ctx.bind_history();

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    let result = script::run(&ctx, &commands, &mut out);
    if result.is_ok() && cli.json {
        let stage = ctx.stage.get_state();
        serde_json::to_writer_pretty(&mut out, &*stage).context("Failed to encode stage")?;
        writeln!(out)?;
    }
    ctx.shutdown();
    result
}
