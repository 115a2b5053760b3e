mod runner;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use pilot_common::observability::init_logging;
use pilot_config::{PilotConfig, PilotConfigLoader};
use runner::{describe_plan, log_config, run};
use tracing::info;

/// Fill a web form through WebDriver, verifying focus before every edit.
#[derive(Debug, Parser)]
#[command(name = "pilot", version)]
struct Cli {
    /// Path to the run configuration.
    #[arg(long, env = "PILOT_CONFIG", default_value = "pilot.yaml")]
    config: PathBuf,

    /// Page to open; overrides `target_url` from the config.
    #[arg(long)]
    url: Option<String>,

    /// Run the browser without a window.
    #[arg(long)]
    headless: bool,

    /// Load and validate the config, print the steps, do not open a browser.
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // 1) Load config (env wins over the file)
    let mut cfg: PilotConfig = PilotConfigLoader::new()
        .with_file(&cli.config)
        .load()
        .with_context(|| format!("failed to load {}", cli.config.display()))?;

    // 2) Logging as configured
    let log_path = init_logging(log_config(&cfg.logging))?;
    info!(log = %log_path.display(), config = %cli.config.display(), "pilot starting");

    if cli.headless {
        cfg.webdriver.headless = true;
    }
    let target_url = cli
        .url
        .or_else(|| cfg.target_url.clone())
        .context("no target url: pass --url or set target_url in the config")?;

    if cli.dry_run {
        println!("{}", describe_plan(&cfg, &target_url));
        return Ok(());
    }

    let report = run(cfg, &target_url).await?;
    info!(filled = report.executed, skipped = report.skipped, "run complete");
    Ok(())
}
