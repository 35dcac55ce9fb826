//! CLI argument definitions.
//!
//! This module defines all CLI arguments using clap's derive macros.
//! The main entry point is the [`Cli`] struct.

use clap::{Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

use crate::probe::{ProbeStrategyKind, MAX_TIMEOUT_SECS};

use super::commands::cache::CacheArgs;

/// Packwise - find what a Python script needs bundled.
#[derive(Debug, Parser)]
#[command(name = "packwise")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to an extra config file, applied over the discovered ones
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Show verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Minimal output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Analyze a script and print the packaging directives it needs
    Analyze(AnalyzeArgs),

    /// Check that the target interpreter can build a bundle
    Check(CheckArgs),

    /// Inspect or clear the module availability cache
    Cache(CacheArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

/// Arguments for the `analyze` command.
#[derive(Debug, Clone, Default, clap::Args)]
pub struct AnalyzeArgs {
    /// Python script to analyze
    pub script: PathBuf,

    /// Target interpreter (defaults to config, $PACKWISE_PYTHON, then PATH)
    #[arg(long, value_name = "PATH")]
    pub python: Option<PathBuf>,

    /// How modules are probed
    #[arg(long, value_name = "batch|pool")]
    pub strategy: Option<ProbeStrategyKind>,

    /// Budget for the whole probing phase, in seconds
    #[arg(
        long,
        value_name = "SECS",
        value_parser = clap::value_parser!(u64).range(1..=MAX_TIMEOUT_SECS)
    )]
    pub timeout: Option<u64>,

    /// Emit UPX exclusions for binaries that break when compressed
    #[arg(long)]
    pub compress: bool,

    /// Exclude dev tooling and test packages from the bundle
    #[arg(long)]
    pub fast: bool,

    /// Collect pkg_resources and tkinter whole
    #[arg(long)]
    pub safe: bool,

    /// Skip the availability cache for this run
    #[arg(long)]
    pub no_cache: bool,

    /// Output the full analysis as JSON
    #[arg(long, conflicts_with = "args")]
    pub json: bool,

    /// Output only the directive arguments, one per line
    #[arg(long)]
    pub args: bool,
}

/// Arguments for the `check` command.
#[derive(Debug, Clone, Default, clap::Args)]
pub struct CheckArgs {
    /// Script to check for readability and syntax
    pub script: Option<PathBuf>,

    /// Target interpreter (defaults to config, $PACKWISE_PYTHON, then PATH)
    #[arg(long, value_name = "PATH")]
    pub python: Option<PathBuf>,

    /// Budget for probing the interpreter, in seconds
    #[arg(
        long,
        value_name = "SECS",
        value_parser = clap::value_parser!(u64).range(1..=MAX_TIMEOUT_SECS)
    )]
    pub timeout: Option<u64>,
}

/// Arguments for the `completions` command.
#[derive(Debug, Clone, clap::Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: Shell,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_analyze_flags() {
        let cli = Cli::try_parse_from([
            "packwise",
            "--quiet",
            "analyze",
            "main.py",
            "--python",
            "/usr/bin/python3",
            "--strategy",
            "pool",
            "--timeout",
            "5",
            "--compress",
            "--fast",
            "--safe",
            "--no-cache",
        ])
        .unwrap();

        assert!(cli.quiet);
        let Commands::Analyze(args) = cli.command else {
            panic!("expected analyze");
        };
        assert_eq!(args.script, PathBuf::from("main.py"));
        assert_eq!(args.python, Some(PathBuf::from("/usr/bin/python3")));
        assert_eq!(args.strategy, Some(ProbeStrategyKind::Pool));
        assert_eq!(args.timeout, Some(5));
        assert!(args.compress && args.fast && args.safe && args.no_cache);
    }

    #[test]
    fn rejects_unknown_strategy() {
        let result = Cli::try_parse_from(["packwise", "analyze", "main.py", "--strategy", "serial"]);
        assert!(result.is_err());
    }

    #[test]
    fn rejects_zero_timeout() {
        let result = Cli::try_parse_from(["packwise", "analyze", "main.py", "--timeout", "0"]);
        assert!(result.is_err());
    }

    #[test]
    fn rejects_timeout_beyond_one_day() {
        let too_long = (MAX_TIMEOUT_SECS + 1).to_string();
        let result = Cli::try_parse_from(["packwise", "analyze", "main.py", "--timeout", &too_long]);
        assert!(result.is_err());

        let huge = Cli::try_parse_from([
            "packwise",
            "analyze",
            "main.py",
            "--timeout",
            "18446744073709551615",
        ]);
        assert!(huge.is_err());
    }

    #[test]
    fn parses_check_with_optional_script() {
        let cli = Cli::try_parse_from(["packwise", "check", "--python", "/usr/bin/python3"]).unwrap();
        let Commands::Check(args) = cli.command else {
            panic!("expected check");
        };
        assert!(args.script.is_none());
        assert_eq!(args.python, Some(PathBuf::from("/usr/bin/python3")));

        let cli = Cli::try_parse_from(["packwise", "check", "game.py", "--timeout", "9"]).unwrap();
        let Commands::Check(args) = cli.command else {
            panic!("expected check");
        };
        assert_eq!(args.script, Some(PathBuf::from("game.py")));
        assert_eq!(args.timeout, Some(9));
    }

    #[test]
    fn json_and_args_conflict() {
        let result = Cli::try_parse_from(["packwise", "analyze", "main.py", "--json", "--args"]);
        assert!(result.is_err());
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["packwise", "analyze", "main.py", "--debug", "-c", "ci.yml"])
            .unwrap();
        assert!(cli.debug);
        assert_eq!(cli.config, Some(PathBuf::from("ci.yml")));
    }
}
