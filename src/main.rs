pub mod types;
pub mod config;
pub mod data;
pub mod scale;
pub mod color;
pub mod hexbin;
pub mod processing;
pub mod render;
pub mod svg;

use clap::Parser;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Render the Greek youth population hexbin map to a static SVG.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// TOML config; defaults to ./config.toml when present, else built-in settings
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Output SVG path, overriding the config
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    let app_config = config::AppConfig::resolve(cli.config.as_deref())?;
    let output = cli.output.unwrap_or_else(|| app_config.output.svg.clone());

    info!(
        "Rendering {:?} + {:?} into {:?}",
        app_config.input.points_csv, app_config.input.boundaries, output
    );

    render::generate_map(&app_config, &output).await?;

    info!("Generation complete!");
    Ok(())
}
