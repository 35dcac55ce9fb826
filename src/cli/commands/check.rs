//! Check command implementation.
//!
//! `packwise check [SCRIPT]` verifies that the target interpreter can
//! build a bundle before any analysis runs. The packaging backend and
//! tkinter must import, and the script, when given, must read and parse.
//! Pillow is optional and only produces a warning.

use std::path::Path;
use std::time::Duration;

use crate::cli::args::CheckArgs;
use crate::cli::interpreter::resolve_interpreter;
use crate::config::PackwiseConfig;
use crate::error::Result;
use crate::extract::{decode_source, extract, SourceEncoding};
use crate::probe::{strategy_for, ModuleInfo, ModuleStatus, ProbeRequest, ProbeStrategy};
use crate::ui::UserInterface;

use super::dispatcher::{Command, CommandResult};

/// Oldest packaging backend major version without known bundling problems.
pub const MIN_BACKEND_MAJOR: u64 = 5;

/// One module the build environment needs.
struct Requirement {
    module: &'static str,
    distribution: &'static str,
    /// A missing optional module is a warning, not a failure.
    required: bool,
    /// What is lost without it.
    impact: &'static str,
}

const BACKEND: Requirement = Requirement {
    module: "PyInstaller",
    distribution: "pyinstaller",
    required: true,
    impact: "nothing can be bundled",
};

const REQUIREMENTS: &[Requirement] = &[
    BACKEND,
    Requirement {
        module: "PIL",
        distribution: "Pillow",
        required: false,
        impact: "icon conversion is limited",
    },
    Requirement {
        module: "tkinter",
        distribution: "tkinter",
        required: true,
        impact: "GUI scripts cannot be bundled",
    },
];

/// The check command implementation.
pub struct CheckCommand {
    config: PackwiseConfig,
    args: CheckArgs,
    prober: Option<Box<dyn ProbeStrategy>>,
}

impl CheckCommand {
    /// Create a new check command.
    pub fn new(config: PackwiseConfig, args: CheckArgs) -> Self {
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

    fn check_script(&self, script: &Path, ui: &mut dyn UserInterface) -> bool {
        ui.show_header("Script");

        let bytes = match std::fs::read(script) {
            Ok(bytes) => bytes,
            Err(e) => {
                ui.error(&format!("Cannot read {}: {}", script.display(), e));
                return false;
            }
        };
        let decoded = decode_source(&bytes);
        ui.success(&format!(
            "{} is readable ({} characters)",
            script.display(),
            decoded.text.chars().count()
        ));
        match decoded.encoding {
            SourceEncoding::Gbk => ui.detail("Decoded as GBK"),
            SourceEncoding::Lossy => {
                ui.warning("Script is neither UTF-8 nor GBK; undecodable bytes were replaced")
            }
            SourceEncoding::Utf8 => {}
        }

        match extract(&decoded.text).syntax_error {
            Some(err) => {
                ui.error(&format!("Syntax error on line {}: {}", err.line, err.message));
                false
            }
            None => {
                ui.success("Syntax is valid");
                true
            }
        }
    }
}

impl Command for CheckCommand {
    fn execute(&self, ui: &mut dyn UserInterface) -> Result<CommandResult> {
        let (interpreter, source) = resolve_interpreter(
            self.args.python.as_deref(),
            self.config.settings.python.as_deref(),
        )?;
        ui.show_header("Interpreter");
        ui.message(&format!("{} (from {})", interpreter.display(), source));

        let mut ok = true;
        if let Some(script) = &self.args.script {
            ok &= self.check_script(script, ui);
        }

        let mut settings = self.config.settings.probe.to_settings();
        if let Some(secs) = self.args.timeout {
            settings.timeout = Duration::from_secs(secs);
        }
        let configured;
        let prober: &dyn ProbeStrategy = match &self.prober {
            Some(prober) => prober.as_ref(),
            None => {
                configured = strategy_for(&settings);
                configured.as_ref()
            }
        };

        let request = ProbeRequest::new(
            interpreter.clone(),
            REQUIREMENTS
                .iter()
                .map(|r| (r.module.to_string(), r.distribution.to_string())),
        );
        let mut spinner = ui.start_spinner("Probing build dependencies");
        let results = prober.probe(&request);
        spinner.finish_success("Probed build dependencies");

        ui.show_header("Build dependencies");
        for requirement in REQUIREMENTS {
            let info = results
                .get(requirement.module)
                .cloned()
                .unwrap_or_else(|| ModuleInfo::probe_failed(requirement.distribution));
            ok &= report_requirement(requirement, &info, ui);
        }

        if ok {
            ui.success("Environment is ready to bundle");
            return Ok(CommandResult::success());
        }

        ui.error("Environment check failed");
        if !results.get(BACKEND.module).is_some_and(|info| info.available) {
            ui.show_hint(&format!(
                "{} -m pip install {}",
                interpreter.display(),
                BACKEND.distribution
            ));
        }
        Ok(CommandResult::failure(1))
    }
}

/// Report one requirement; returns false when it fails the check.
fn report_requirement(
    requirement: &Requirement,
    info: &ModuleInfo,
    ui: &mut dyn UserInterface,
) -> bool {
    let name = requirement.distribution;

    if info.available {
        match &info.version {
            Some(version) => ui.success(&format!("{} {}", name, version)),
            None => ui.success(name),
        }
        if requirement.module == BACKEND.module {
            check_backend_version(info.version.as_deref(), ui);
        }
        return true;
    }

    let reason = match info.status {
        ModuleStatus::Timeout => "probe timed out",
        ModuleStatus::ProbeFailed => "could not be imported",
        _ => "not installed",
    };
    let message = format!("{} {} ({})", name, reason, requirement.impact);
    if requirement.required {
        ui.error(&message);
        false
    } else {
        ui.warning(&message);
        true
    }
}

fn check_backend_version(version: Option<&str>, ui: &mut dyn UserInterface) {
    let Some(major) = version.and_then(major_version) else {
        return;
    };
    if major < MIN_BACKEND_MAJOR {
        ui.warning(&format!(
            "{} {} is older than {}.0; upgrading is recommended",
            BACKEND.distribution,
            version.unwrap_or_default(),
            MIN_BACKEND_MAJOR
        ));
    }
}

/// Leading numeric component of a version string.
fn major_version(version: &str) -> Option<u64> {
    version.split('.').next()?.trim().parse().ok()
}
