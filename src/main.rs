//*** START FILE: src/main.rs ***//
#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

use clap::Parser;
use eframe::{egui, NativeOptions};
use std::error::Error;
use std::path::PathBuf;
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};

use quotebook_rust_gui::config::{self, Config};
use quotebook_rust_gui::{QuotebookApp, Route, Services};

#[derive(Parser, Debug)]
#[command(name = "quotebook", about = "Random quotes, favorites and translations")]
struct Args {
    /// Optional TOML file overriding the built-in endpoints and settings.
    #[arg(long, default_value = "config.toml")]
    config: PathBuf,
    /// View to open first.
    #[arg(long, value_enum, default_value = "random")]
    route: Route,
    /// Directory for stored quote and favorites; overrides `data_dir` in the config.
    #[arg(long)]
    data_dir: Option<PathBuf>,
}

fn main() -> Result<(), Box<dyn Error>> {
    fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();
    let args = Args::parse();

    let (mut config, config_error) = match config::load_config_from_file(&args.config) {
        Ok(loaded) => (loaded, None),
        Err(e) => {
            error!("{}", e);
            (Config::default(), Some(e.to_string()))
        }
    };
    if let Some(dir) = args.data_dir {
        config.data_dir = Some(dir);
    }

    let services = Services::from_config(&config)?;
    info!(store = ?services.store.root(), "starting");

    let options = NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([760.0, 560.0])
            .with_min_inner_size([480.0, 360.0]),
        ..Default::default()
    };
    let route = args.route;
    eframe::run_native(
        "Quotebook",
        options,
        Box::new(move |_cc| Box::new(QuotebookApp::new(config, config_error, services, route))),
    )?;
    Ok(())
}
//*** END FILE: src/main.rs ***//
