use anyhow::{Context, Result, anyhow};
use clap::Parser;
use console::Console;
use std::path::PathBuf;
use textease_actors::{HubSettings, SessionHub, UserId};
use textease_common::observability::{LogConfig, init_logging};
use textease_config::{TextEaseConfig, TextEaseConfigLoader, default_config_path};
use textease_pipeline::AssistantContext;

mod command;
mod console;
mod document;

/// Simplify, translate and fact-split text from the console.
#[derive(Debug, Parser)]
#[command(name = "textease", version)]
struct Args {
    /// YAML configuration file. Defaults to the per-user config location.
    #[arg(short, long, env = "TEXTEASE_CONFIG")]
    config: Option<PathBuf>,

    /// Session owner; each user id gets an independent session.
    #[arg(short, long, default_value = "console")]
    user: String,
}

fn load_config(args: &Args) -> Result<TextEaseConfig> {
    let loader = match (&args.config, default_config_path()) {
        (Some(path), _) => TextEaseConfigLoader::new().with_file(path),
        (None, Some(path)) => TextEaseConfigLoader::new().with_optional_file(path),
        (None, None) => TextEaseConfigLoader::new(),
    };
    loader.load().context("failed to load configuration")
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install().map_err(|e| anyhow!("failed to install error hooks: {e}"))?;
    let args = Args::parse();

    // 1) Config (env wins over file)
    let cfg = load_config(&args)?;

    // 2) Logging as configured
    let log_path = init_logging(LogConfig {
        app_name: "textease",
        log_dir: cfg.logging.dir.clone(),
        emit_stderr: cfg.logging.emit_stderr,
        format: cfg.logging.format,
        default_filter: cfg.logging.filter.clone(),
    })?;
    tracing::info!(log_dir = %log_path.display(), "starting textease");

    // 3) Models are connected once and shared by every session
    let ctx = AssistantContext::from_config(&cfg)
        .await
        .context("failed to initialise models")?;
    let hub = SessionHub::new(ctx, HubSettings::from(&cfg.session));

    Console::new(hub.clone(), UserId::from(args.user)).run().await?;
    hub.shutdown();
    Ok(())
}
