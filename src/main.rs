mod app;
mod checksum;
mod color;
mod config;
mod data;
mod geo;
mod state;
mod ui;

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use app::DashboardApp;
use clap::{Parser, Subcommand};
use config::DashboardConfig;
use eframe::egui;

#[derive(Parser)]
#[command(name = "ghana-disease-dashboard")]
#[command(about = "Dashboard for the cleaned Ghana infectious disease dataset", long_about = None)]
struct Cli {
    /// TOML config file (defaults to ./dashboard.toml when present)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Dataset to load instead of the configured one
    #[arg(short, long)]
    data: Option<PathBuf>,

    /// Region boundaries GeoJSON instead of the configured one
    #[arg(short, long)]
    geojson: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Verify SHA-256 checksums of the published files
    Verify {
        /// Manifest in `sha256sum` format
        #[arg(short, long)]
        manifest: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    let mut config =
        DashboardConfig::resolve(cli.config.as_deref()).context("loading configuration")?;
    if let Some(data) = cli.data {
        config.data_path = data;
    }
    if let Some(geojson) = cli.geojson {
        config.geojson_path = geojson;
    }

    match cli.command {
        Some(Commands::Verify { manifest }) => {
            let manifest = manifest.unwrap_or_else(|| config.checksum_manifest.clone());
            verify(&manifest)
        }
        None => run_dashboard(config),
    }
}

fn verify(manifest: &std::path::Path) -> Result<()> {
    let reports = checksum::verify_manifest(manifest)
        .with_context(|| format!("verifying {}", manifest.display()))?;
    for report in &reports {
        println!("{report}");
    }
    let failed = reports.iter().filter(|r| !r.is_ok()).count();
    if failed > 0 {
        bail!("{failed} of {} files failed verification", reports.len());
    }
    Ok(())
}

fn run_dashboard(config: DashboardConfig) -> Result<()> {
    log::info!("Starting dashboard with {}", config.data_path.display());

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([config.window_width, config.window_height])
            .with_min_inner_size([800.0, 500.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Ghana Infectious Disease Trends Dashboard",
        options,
        Box::new(|_cc| Ok(Box::new(DashboardApp::new(config)))),
    )
    .map_err(|e| anyhow::anyhow!("running dashboard: {e}"))
}
