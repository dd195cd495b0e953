//! # conviz
//!
//! Command-line shell over the conviz crates: loads settings, wires the
//! event bus, the visualization store and the concept endpoint, then runs
//! one subcommand.

#![deny(unsafe_code)]

mod commands;
mod event_log;
mod pipeline;

use std::path::PathBuf;

use anyhow::{Context as _, Result};
use clap::Parser;
use conviz_events::EventBus;
use conviz_llm::HttpConceptClient;
use conviz_settings::{ConvizSettings, load_settings_from_path, settings_path};
use conviz_store::{VisualizationStore, open_database};
use tracing::debug;

use crate::commands::{Command, Context};

/// Concept breakdowns and a dashboard of saved visualizations.
#[derive(Parser, Debug)]
#[command(name = "conviz", version, about)]
struct Cli {
    /// Settings file (default: `~/.conviz/settings.json`).
    #[arg(long, global = true)]
    settings: Option<PathBuf>,

    /// Path to the `SQLite` database (overrides settings).
    #[arg(long, global = true)]
    db_path: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

impl Cli {
    /// Layer command-line overrides on top of file and env settings.
    fn apply_overrides(&self, settings: &mut ConvizSettings) {
        if let Some(path) = &self.db_path {
            settings.database.path = path.display().to_string();
        }
        if let Command::Import {
            on_conflict: Some(strategy),
            ..
        } = &self.command
        {
            settings.import.conflict_strategy = *strategy;
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let path = cli.settings.clone().unwrap_or_else(settings_path);
    let mut settings = load_settings_from_path(&path)
        .with_context(|| format!("failed to load settings from {}", path.display()))?;
    cli.apply_overrides(&mut settings);

    conviz_core::logging::init_subscriber(settings.logging.level.as_filter_str());
    debug!(settings = %path.display(), db = %settings.database.resolved_path().display(), "starting");

    let bus = EventBus::new();
    let _event_log = event_log::attach(&bus);

    let store = VisualizationStore::new(open_database(&settings.database))
        .with_event_bus(bus.clone())
        .with_import_strategy(settings.import.conflict_strategy);
    let processor = HttpConceptClient::new(&settings.endpoint)
        .context("failed to build endpoint client")?;

    let ctx = Context {
        settings: &settings,
        bus: &bus,
        store: &store,
        processor: &processor,
    };
    let mut stdout = std::io::stdout().lock();
    commands::run(cli.command, &ctx, &mut stdout).await
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
