//! Analyze command implementation.
//!
//! The `packwise analyze` command runs one full pass over a script and
//! prints the resolved modules, warnings and build directives.

use std::time::Duration;

use tracing::debug;

use crate::cache::CacheStore;
use crate::cli::args::AnalyzeArgs;
use crate::cli::interpreter::resolve_interpreter;
use crate::config::PackwiseConfig;
use crate::error::Result;
use crate::extract::SourceEncoding;
use crate::pipeline::{Analysis, Analyzer, AnalyzerOptions};
use crate::probe::{strategy_for, ModuleStatus, ProbeSettings, ProbeStrategy};
use crate::registry::Registry;
use crate::synth::SynthesisOptions;
use crate::ui::{PackwiseTheme, Table, UserInterface};

use super::dispatcher::{Command, CommandResult};

/// Exit code when the analysis succeeded but distributions are missing.
pub const EXIT_MISSING: i32 = 2;

/// The analyze command implementation.
pub struct AnalyzeCommand {
    config: PackwiseConfig,
    args: AnalyzeArgs,
    prober: Option<Box<dyn ProbeStrategy>>,
}

impl AnalyzeCommand {
    /// Create a new analyze command.
    pub fn new(config: PackwiseConfig, args: AnalyzeArgs) -> Self {
        Self {
            config,
            args,
            prober: None,
        }
    }

    /// Use `prober` instead of the configured strategy.
    pub fn with_prober(mut self, prober: Box<dyn ProbeStrategy>) -> Self {
        self.prober = Some(prober);
        self
    }

    /// Configured probe settings with command-line overrides applied.
    pub fn probe_settings(&self) -> ProbeSettings {
        let mut settings = self.config.settings.probe.to_settings();
        if let Some(strategy) = self.args.strategy {
            settings.strategy = strategy;
        }
        if let Some(secs) = self.args.timeout {
            settings.timeout = Duration::from_secs(secs);
        }
        settings
    }

    /// Configured synthesis options; flags can only switch groups on.
    pub fn synthesis_options(&self) -> SynthesisOptions {
        let mut options = self.config.settings.synthesis.to_options();
        options.compress |= self.args.compress;
        options.exclude_dev_tooling |= self.args.fast;
        options.safe_mode |= self.args.safe;
        options
    }

    fn open_cache(&self) -> Result<Option<CacheStore>> {
        let cache = &self.config.settings.cache;
        if self.args.no_cache || !cache.enabled {
            debug!("Availability cache disabled");
            return Ok(None);
        }
        Ok(Some(CacheStore::open(cache.resolved_path(), cache.ttl()?)))
    }

    fn machine_output(&self) -> bool {
        self.args.json || self.args.args
    }
}

impl Command for AnalyzeCommand {
    fn execute(&self, ui: &mut dyn UserInterface) -> Result<CommandResult> {
        let (interpreter, source) = resolve_interpreter(
            self.args.python.as_deref(),
            self.config.settings.python.as_deref(),
        )?;
        ui.detail(&format!(
            "Interpreter: {} (from {})",
            interpreter.display(),
            source
        ));

        let registry = Registry::builtin().with_overrides(&self.config.registry);
        let configured;
        let prober: &dyn ProbeStrategy = match &self.prober {
            Some(prober) => prober.as_ref(),
            None => {
                configured = strategy_for(&self.probe_settings());
                configured.as_ref()
            }
        };
        let mut cache = self.open_cache()?;
        if let Some(store) = &cache {
            ui.detail(&format!(
                "Cache: {} ({} entries)",
                store.path().display(),
                store.len()
            ));
        }

        let options = AnalyzerOptions::new(interpreter).with_synthesis(self.synthesis_options());
        let mut analyzer = Analyzer::new(&registry, prober, cache.as_mut(), options);

        let mut spinner = (!self.machine_output()).then(|| {
            ui.start_spinner(&format!("Analyzing {}", self.args.script.display()))
        });
        let analysis = match analyzer.analyze_file(&self.args.script) {
            Ok(analysis) => {
                if let Some(spinner) = spinner.as_mut() {
                    spinner.finish_success(&format!(
                        "Resolved {} modules",
                        analysis.resolution.modules.len()
                    ));
                }
                analysis
            }
            Err(e) => {
                if let Some(spinner) = spinner.as_mut() {
                    spinner.finish_error("Analysis failed");
                }
                return Err(e);
            }
        };

        if self.args.json {
            let json = serde_json::to_string_pretty(&analysis).map_err(anyhow::Error::from)?;
            ui.message(&json);
        } else if self.args.args {
            for arg in analysis.to_args() {
                ui.message(&arg);
            }
        } else {
            report(&analysis, ui);
        }

        Ok(if analysis.missing.is_empty() {
            CommandResult::success()
        } else {
            CommandResult::failure(EXIT_MISSING)
        })
    }
}

fn report(analysis: &Analysis, ui: &mut dyn UserInterface) {
    let theme = PackwiseTheme::detect();

    let title = analysis
        .script
        .as_ref()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "<source>".to_string());
    ui.show_header(&title);

    match analysis.encoding {
        Some(SourceEncoding::Gbk) => ui.detail("Decoded as GBK"),
        Some(SourceEncoding::Lossy) => {
            ui.warning("Script is neither UTF-8 nor GBK; undecodable bytes were replaced")
        }
        _ => {}
    }
    if let Some(err) = &analysis.syntax_error {
        ui.warning(&format!(
            "Syntax error on line {}: {}. Imports were found by line scan.",
            err.line, err.message
        ));
    }
    ui.detail(&format!(
        "{} import names, {} top-level modules",
        analysis.imports.len(),
        analysis.imports.top_level().len()
    ));
    if !analysis.data_files.is_empty() {
        ui.detail(&format!("{} referenced data files", analysis.data_files.len()));
    }

    if analysis.resolution.modules.is_empty() {
        ui.message("No imports found");
    } else {
        let mut table = Table::new(["Module", "Distribution", "Version", "Status"]);
        for (module, info) in &analysis.resolution.modules {
            table.add_row([
                module.clone(),
                info.distribution_name.clone(),
                info.version.clone().unwrap_or_default(),
                theme.format_status(info.status),
            ]);
        }
        ui.message(&table.render());
    }

    for (module, info) in &analysis.resolution.modules {
        match info.status {
            ModuleStatus::Timeout => ui.warning(&format!("Probe timed out for {}", module)),
            ModuleStatus::ProbeFailed => ui.warning(&format!("Could not probe {}", module)),
            _ => {}
        }
    }
    for rejected in &analysis.rejected {
        ui.warning(&format!("Rejected {:?}: {}", rejected.name, rejected.reason));
    }

    if analysis.directives.is_empty() {
        ui.message("\nNo directives needed");
    } else {
        ui.message(&format!("\n{}", theme.key.apply_to("Directives:")));
        for directive in &analysis.directives {
            ui.message(&format!(
                "  {} {}",
                theme.flag.apply_to(directive.flag.as_flag()),
                directive.value
            ));
        }
    }

    if analysis.missing.is_empty() {
        ui.success("All imports are available");
    } else {
        ui.warning(&format!(
            "Not installed in the target interpreter: {}",
            analysis.missing.join(", ")
        ));
        ui.show_hint(&format!("pip install {}", analysis.missing.join(" ")));
    }
}
