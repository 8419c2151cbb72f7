// Copyright 2025 Chris Custine
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

mod app;
mod config;
mod map;
mod replay;
mod ui;

use std::error::Error;
use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand};
use log::{info, warn};

use app::RestorationApp;
use config::AppConfig;

#[derive(Parser, Debug)]
#[command(name = "restoration-map", about = "Verification map for land-restoration projects")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    /// GeoJSON FeatureCollection with the project boundary
    #[arg(long, global = true)]
    boundary: Option<PathBuf>,

    /// GeoJSON FeatureCollection with the AI analysis zones
    #[arg(long, global = true)]
    analysis: Option<PathBuf>,

    /// Project identifier shown in the summary
    #[arg(long, global = true)]
    project_id: Option<String>,

    /// Debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Print the config file location and exit
    #[arg(long)]
    config_path: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Open the interactive map (default)
    View,
    /// Drive the compositor headless through a scripted session
    Replay {
        /// Length of the replay in seconds
        #[arg(long, default_value_t = 12)]
        seconds: u64,
    },
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(if cli.verbose { "debug" } else { "info" }),
    )
    .init();

    if cli.config_path {
        println!("{}", AppConfig::get_config_path()?.display());
        return Ok(());
    }

    let app_config = AppConfig::load()
        .unwrap_or_else(|e| {
            warn!("Failed to load config, using defaults: {e}");
            AppConfig::default()
        })
        .with_overrides(cli.project_id, cli.boundary, cli.analysis);
    let compositor_config = app_config.compositor_config()?;

    match cli.command.unwrap_or(Command::View) {
        Command::View => {
            info!("Starting Restoration Map...");
            let options = eframe::NativeOptions {
                viewport: egui::ViewportBuilder::default()
                    .with_inner_size([app_config.window_width, app_config.window_height])
                    .with_title(format!("Restoration Map · {}", app_config.project_id)),
                ..Default::default()
            };

            eframe::run_native(
                "Restoration Map",
                options,
                Box::new(move |_cc| Ok(Box::new(RestorationApp::new(compositor_config)?))),
            )?;
        }
        Command::Replay { seconds } => {
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()?;
            runtime.block_on(replay::run_replay(
                compositor_config,
                replay::default_script(),
                Duration::from_secs(seconds),
                replay::TICK,
            ))?;
        }
    }

    Ok(())
}
