//! Cache command implementation.
//!
//! Provides `packwise cache list`, `packwise cache clear` and
//! `packwise cache stats` over the module availability cache.

use clap::{Args, Subcommand};

use crate::cache::{format_duration, CacheStore};
use crate::config::PackwiseConfig;
use crate::error::Result;
use crate::ui::{Prompt, Table, UserInterface};

use super::dispatcher::{Command, CommandResult};

/// Arguments for the cache command.
#[derive(Debug, Clone, Args)]
pub struct CacheArgs {
    #[command(subcommand)]
    pub command: CacheSubcommand,
}

/// Cache subcommands.
#[derive(Debug, Clone, Subcommand)]
pub enum CacheSubcommand {
    /// List cached modules.
    List {
        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Remove every cached entry.
    Clear {
        /// Don't prompt for confirmation.
        #[arg(short, long)]
        force: bool,
    },
    /// Show cache statistics.
    Stats,
}

/// The cache command implementation.
pub struct CacheCommand {
    path: std::path::PathBuf,
    ttl: String,
    args: CacheArgs,
}

impl CacheCommand {
    /// Create a cache command for the cache file named by `config`.
    pub fn new(config: &PackwiseConfig, args: CacheArgs) -> Self {
        Self {
            path: config.settings.cache.resolved_path(),
            ttl: config.settings.cache.ttl.clone(),
            args,
        }
    }

    fn open(&self) -> Result<CacheStore> {
        let ttl = crate::cache::parse_ttl(&self.ttl)?;
        Ok(CacheStore::open(&self.path, ttl))
    }
}

impl Command for CacheCommand {
    fn execute(&self, ui: &mut dyn UserInterface) -> Result<CommandResult> {
        let mut store = self.open()?;

        match &self.args.command {
            CacheSubcommand::List { json } => list_cache(&store, *json, ui)?,
            CacheSubcommand::Clear { force } => clear_cache(&mut store, *force, ui)?,
            CacheSubcommand::Stats => show_stats(&store, ui),
        }

        Ok(CommandResult::success())
    }
}

fn list_cache(store: &CacheStore, json: bool, ui: &mut dyn UserInterface) -> Result<()> {
    let entries = store.entries();

    if json {
        let output = serde_json::to_string_pretty(&entries).map_err(anyhow::Error::from)?;
        ui.message(&output);
        return Ok(());
    }

    if entries.is_empty() {
        ui.message("Cache is empty");
        return Ok(());
    }

    let now = store.now();
    let mut table = Table::new([
        "Module",
        "Interpreter",
        "Available",
        "Version",
        "Age",
        "State",
    ]);
    for entry in &entries {
        table.add_row([
            entry.module.clone(),
            entry.interpreter.clone(),
            if entry.available { "yes" } else { "no" }.to_string(),
            entry.version.clone().unwrap_or_default(),
            format_duration(entry.age(now)),
            if store.is_fresh(entry) { "fresh" } else { "expired" }.to_string(),
        ]);
    }

    ui.message(&format!("{} cached modules:\n", entries.len()));
    ui.message(&table.render());
    Ok(())
}

fn clear_cache(store: &mut CacheStore, force: bool, ui: &mut dyn UserInterface) -> Result<()> {
    let count = store.len();
    if count == 0 {
        ui.message("Cache is already empty");
        return Ok(());
    }

    if !force && ui.is_interactive() {
        let prompt = Prompt::confirm(
            "clear_cache",
            format!("Clear {} cached entries?", count),
            false,
        );
        if !ui.prompt(&prompt)?.is_yes() {
            ui.message("Cancelled");
            return Ok(());
        }
    }

    let cleared = store.clear();
    ui.success(&format!("Cleared {} entries", cleared));
    Ok(())
}

fn show_stats(store: &CacheStore, ui: &mut dyn UserInterface) {
    let stats = store.stats();

    ui.message("Cache Statistics:\n");
    ui.message(&format!("  Total entries: {}", stats.total));
    ui.message(&format!("  Fresh: {}", stats.fresh));
    ui.message(&format!("  Expired: {}", stats.expired));
    ui.message(&format!("  Available: {}", stats.available));
    ui.message(&format!("  Missing: {}", stats.missing));
    ui.message(&format!("  TTL: {}", format_duration(store.ttl())));
    ui.message(&format!("  Location: {}", store.path().display()));
}
