//! quakemap CLI
//!
//! Polls the earthquake and tsunami feeds and renders through the console
//! or in-memory adapters.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use quakemap::{
    error::Result,
    models::Config,
    pipeline::{self, Adapters},
    render::console::{ConsoleNotifier, ConsolePresenter, ConsoleSurface},
    render::memory::{MemoryNotifier, MemoryPresenter, MemorySurface, PresenterState},
    render::{MapRenderState, SoundCue, TsunamiState},
    utils::http,
};
use serde::Serialize;

/// quakemap - live earthquake map client
#[derive(Parser, Debug)]
#[command(name = "quakemap", version, about = "Live earthquake and tsunami map client")]
struct Cli {
    /// Path to the configuration file
    #[arg(short, long, default_value = "config.toml")]
    config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Poll both feeds until interrupted
    Run,

    /// Poll each feed once and print the resulting render state
    Once,

    /// Validate the configuration file
    Validate,
}

/// Render state printed by `once`.
#[derive(Serialize)]
struct OnceReport<'a> {
    quake: &'a MapRenderState,
    tsunami: &'a TsunamiState,
    surface: serde_json::Value,
    presenter: PresenterState,
    sounds: Vec<SoundCue>,
}

/// Initialize logging based on verbosity flag.
fn init_logging(verbose: bool, default_level: &str) {
    let level = if verbose { "debug" } else { default_level };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let (config, load_error) = match Config::load(&cli.config) {
        Ok(config) => (config, None),
        Err(e) => (Config::default(), Some(e)),
    };
    init_logging(cli.verbose, &config.logging.level);
    if let Some(e) = &load_error {
        log::warn!(
            "Config load failed from {}: {}. Using defaults.",
            cli.config.display(),
            e
        );
    }

    match cli.command {
        Command::Run => {
            config.validate()?;
            let config = Arc::new(config);
            let client = http::create_async_client(&config.http)?;
            let adapters = Adapters {
                surface: Arc::new(ConsoleSurface),
                presenter: Arc::new(ConsolePresenter),
                notifier: Arc::new(ConsoleNotifier),
            };

            log::info!("quakemap starting, main feed {}", config.api.base_url);
            let handle = pipeline::run_polling(config, client, adapters).await;

            tokio::signal::ctrl_c().await?;
            log::info!("Shutting down...");
            handle.shutdown().await;
        }

        Command::Once => {
            config.validate()?;
            let config = Arc::new(config);
            let client = http::create_async_client(&config.http)?;
            let surface = Arc::new(MemorySurface::new());
            let presenter = Arc::new(MemoryPresenter::new());
            let notifier = Arc::new(MemoryNotifier::new());
            let adapters = Adapters {
                surface: surface.clone(),
                presenter: presenter.clone(),
                notifier: notifier.clone(),
            };

            let reference = pipeline::http_reference(&config, &client);
            let (mut main, mut tsunami) =
                pipeline::build_loops(Arc::clone(&config), client, reference, adapters);
            pipeline::run_once(&mut main, &mut tsunami).await;

            let report = OnceReport {
                quake: main.handler().router().state(),
                tsunami: tsunami.handler().router().state(),
                surface: surface.to_json()?,
                presenter: presenter.snapshot(),
                sounds: notifier.played(),
            };
            println!("{}", serde_json::to_string_pretty(&report)?);
        }

        Command::Validate => {
            log::info!("Validating {}...", cli.config.display());
            if let Some(e) = load_error {
                return Err(e);
            }
            if let Err(e) = config.validate() {
                log::error!("Config validation failed: {}", e);
                return Err(e);
            }
            log::info!("Config OK");
        }
    }

    Ok(())
}
