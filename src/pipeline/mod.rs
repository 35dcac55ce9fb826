//! End-to-end analysis pass.
//!
//! A pass runs four stages strictly in order, each consuming only the
//! previous stage's output:
//!
//! ```text
//! source ──extract──► ImportSet ──expand──► ExpandedImports
//!        ──resolve──► Resolution ──synthesize──► Synthesis
//! ```
//!
//! [`Analyzer`] wires the stages to a registry, a probe strategy and an
//! optional cache. Every stage is also public for callers that need only
//! part of the pass. File passes also bundle the data files the script
//! names by literal path.

mod expand;
mod resolve;

pub use expand::{expand, ExpandedImports};
pub use resolve::{resolve, RejectReason, RejectedName, Resolution};

use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::cache::CacheStore;
use crate::error::{PackwiseError, Result};
use crate::extract::{
    asset_references, decode_source, extract, locate_assets, ImportSet, SourceEncoding,
    SyntaxError,
};
use crate::probe::ProbeStrategy;
use crate::registry::Registry;
use crate::synth::{synthesize_with_data, Directive, SynthesisOptions};

/// Per-pass settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalyzerOptions {
    /// Target interpreter the bundle will be built from.
    pub interpreter: PathBuf,
    pub synthesis: SynthesisOptions,
}

impl AnalyzerOptions {
    pub fn new(interpreter: impl Into<PathBuf>) -> Self {
        Self {
            interpreter: interpreter.into(),
            synthesis: SynthesisOptions::default(),
        }
    }

    pub fn with_synthesis(mut self, synthesis: SynthesisOptions) -> Self {
        self.synthesis = synthesis;
        self
    }
}

/// Everything one pass produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Analysis {
    /// Script path, when analyzing a file.
    pub script: Option<PathBuf>,
    /// Encoding the script was decoded from, when analyzing a file.
    pub encoding: Option<SourceEncoding>,
    pub imports: ImportSet,
    /// Set when the source did not parse and imports were found by line scan.
    pub syntax_error: Option<SyntaxError>,
    pub resolution: Resolution,
    /// Existing files the script refers to, bundled with `--add-data`.
    pub data_files: Vec<PathBuf>,
    pub directives: Vec<Directive>,
    pub rejected: Vec<RejectedName>,
    /// Distributions to install before packaging.
    pub missing: Vec<String>,
}

impl Analysis {
    /// Flattened directive arguments for the packaging backend.
    pub fn to_args(&self) -> Vec<String> {
        self.directives.iter().flat_map(Directive::to_args).collect()
    }
}

/// Runs analysis passes against one registry, probe strategy and cache.
pub struct Analyzer<'a> {
    registry: &'a Registry,
    prober: &'a dyn ProbeStrategy,
    cache: Option<&'a mut CacheStore>,
    options: AnalyzerOptions,
}

impl<'a> Analyzer<'a> {
    pub fn new(
        registry: &'a Registry,
        prober: &'a dyn ProbeStrategy,
        cache: Option<&'a mut CacheStore>,
        options: AnalyzerOptions,
    ) -> Self {
        Self {
            registry,
            prober,
            cache,
            options,
        }
    }

    pub fn options(&self) -> &AnalyzerOptions {
        &self.options
    }

    /// Analyze Python source text.
    ///
    /// Without a script location no data files are collected.
    pub fn analyze_source(&mut self, source: &str) -> Analysis {
        self.run(source, Vec::new())
    }

    fn run(&mut self, source: &str, data_files: Vec<PathBuf>) -> Analysis {
        let extraction = extract(source);
        debug!(
            "Extracted {} names ({} top-level)",
            extraction.imports.len(),
            extraction.imports.top_level().len()
        );

        let expanded = expand(&extraction.imports, self.registry);
        debug!(
            "Expanded to {} modules, {} submodules",
            expanded.modules.len(),
            expanded.submodules.len()
        );

        let resolution = resolve(
            &expanded,
            self.registry,
            self.prober,
            &self.options.interpreter,
            self.cache.as_deref_mut(),
        );

        let synthesis = synthesize_with_data(
            &resolution,
            self.registry,
            &self.options.synthesis,
            &data_files,
        );
        info!(
            "Analysis complete: {} modules, {} directives, {} missing",
            resolution.modules.len(),
            synthesis.directives.len(),
            synthesis.missing.len()
        );

        Analysis {
            script: None,
            encoding: None,
            imports: extraction.imports,
            syntax_error: extraction.syntax_error,
            resolution,
            data_files,
            directives: synthesis.directives,
            rejected: synthesis.rejected,
            missing: synthesis.missing,
        }
    }

    /// Read, decode and analyze a script file.
    pub fn analyze_file(&mut self, path: &Path) -> Result<Analysis> {
        let bytes = std::fs::read(path).map_err(|source| PackwiseError::ScriptRead {
            path: path.to_path_buf(),
            source,
        })?;
        let decoded = decode_source(&bytes);

        let script_dir = match path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let cwd = std::env::current_dir().unwrap_or_else(|_| script_dir.clone());
        let data_files = locate_assets(&asset_references(&decoded.text), &script_dir, &cwd);
        debug!("Found {} referenced data files", data_files.len());

        let mut analysis = self.run(&decoded.text, data_files);
        analysis.script = Some(path.to_path_buf());
        analysis.encoding = Some(decoded.encoding);
        Ok(analysis)
    }
}
