//! Funding Rate History Dashboard
//!
//! Daily funding rates of OKX perpetual swaps, averaged per day or summed
//! over a trailing week, drawn as a bar chart in the terminal. Filters
//! persist across restarts.

pub mod app;
pub mod config;
pub mod data;
pub mod pipeline;
pub mod request;
pub mod store;
pub mod third_party;
pub mod ui;

use std::fs::OpenOptions;
use std::path::Path;

use crate::app::App;
use crate::config::Settings;
use color_eyre::Result;
use log::{LevelFilter, info};

#[tokio::main(flavor = "multi_thread", worker_threads = 4)]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let settings = Settings::from_env();
    init_logging(&settings.log_path);
    info!(
        "Starting with base url {}, state file {}",
        settings.base_url,
        settings.state_path.display()
    );

    let app = App::new(settings);
    app.run().await
}

/// The terminal belongs to the UI, so logs go to a file or nowhere.
fn init_logging(path: &Path) {
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    match OpenOptions::new().create(true).append(true).open(path) {
        Ok(file) => {
            builder.target(env_logger::Target::Pipe(Box::new(file)));
        }
        Err(_) => {
            builder.filter_level(LevelFilter::Off);
        }
    }
    let _ = builder.try_init();
}
