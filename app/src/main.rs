#![cfg_attr(target_os = "windows", windows_subsystem = "windows")]

use std::path::PathBuf;

use clap::Parser;
use clashboard_ui::storage::{CLASH_ID_KEY, FileStore};
use tracing_subscriber::EnvFilter;

mod config;

#[derive(Parser, Debug, Clone)]
#[command(name = "clashboard", about = "Live clash scoreboard")]
struct Cli {
    /// Config file path (default: ~/.config/clashboard/config.toml)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Backend base URL, e.g. http://localhost:3001
    #[arg(long)]
    backend_url: Option<String>,

    /// Channel URL (default: derived from the backend URL)
    #[arg(long)]
    websocket_url: Option<String>,
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() -> anyhow::Result<()> {
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        EnvFilter::new("clashboard=info")
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    tracing::debug!("debug logging enabled");

    let cli = Cli::parse();

    // Load (or create) config file
    let config_path = cli
        .config
        .clone()
        .unwrap_or_else(config::default_config_path);
    let persisted = config::load(&config_path);
    let settings = config::resolve(persisted, cli.backend_url, cli.websocket_url);

    // The current clash id survives restarts next to the config file
    let store = FileStore::new(config_path.with_file_name(CLASH_ID_KEY));

    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1100.0, 720.0])
            .with_title("Clashboard"),
        ..Default::default()
    };

    tracing::info!("launching dashboard against {}", settings.backend_url);
    eframe::run_native(
        "Clashboard",
        native_options,
        Box::new(move |cc| {
            Ok(Box::new(clashboard_ui::app::ClashboardApp::new(
                cc,
                settings,
                Box::new(store),
            )))
        }),
    )
    .map_err(|e| anyhow::anyhow!("{e}"))?;

    tracing::info!("shutting down...");
    Ok(())
}
