//! Import extraction from Python source text.
//!
//! Syntactically valid sources are tokenized and walked statement by
//! statement. Sources that fail to tokenize fall back to a line-oriented
//! regex scan whose results are all filed under
//! [`ImportKind::Conditional`].
//!
//! Only literal-string dynamic imports are recognized; module names built
//! at runtime (formatting, concatenation, variables) cannot be detected.
//!
//! # Example
//!
//! ```
//! use packwise::extract::{extract, ImportKind};
//!
//! let extraction = extract("import os.path\nfrom PIL import Image\n");
//! assert!(extraction.syntax_error.is_none());
//! assert!(extraction.imports.get(ImportKind::Direct).contains("os.path"));
//! assert!(extraction.imports.top_level().contains("PIL"));
//! ```

mod assets;
mod fallback;
mod lexer;
mod walker;

pub use assets::{asset_references, locate_assets};

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::Path;
use thiserror::Error;
use tracing::{debug, warn};

use crate::error::Result;
use crate::registry::{dotted_prefixes, top_level};

/// How an import was discovered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImportKind {
    /// `import x`
    Direct,
    /// `from x import y`
    From,
    /// `__import__("x")` or `import_module("x")`
    Dynamic,
    /// Found by the regex fallback in a source that does not parse.
    Conditional,
}

impl ImportKind {
    pub const ALL: [ImportKind; 4] = [
        ImportKind::Direct,
        ImportKind::From,
        ImportKind::Dynamic,
        ImportKind::Conditional,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ImportKind::Direct => "direct",
            ImportKind::From => "from",
            ImportKind::Dynamic => "dynamic",
            ImportKind::Conditional => "conditional",
        }
    }
}

impl std::fmt::Display for ImportKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Categorized module names found in one source.
///
/// Every dotted name is stored together with each of its prefixes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportSet {
    pub direct: BTreeSet<String>,
    pub from: BTreeSet<String>,
    pub dynamic: BTreeSet<String>,
    pub conditional: BTreeSet<String>,
}

impl ImportSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `name` and all of its dotted prefixes under `kind`.
    pub fn insert(&mut self, kind: ImportKind, name: &str) {
        let set = self.get_mut(kind);
        for prefix in dotted_prefixes(name) {
            set.insert(prefix);
        }
    }

    pub fn get(&self, kind: ImportKind) -> &BTreeSet<String> {
        match kind {
            ImportKind::Direct => &self.direct,
            ImportKind::From => &self.from,
            ImportKind::Dynamic => &self.dynamic,
            ImportKind::Conditional => &self.conditional,
        }
    }

    fn get_mut(&mut self, kind: ImportKind) -> &mut BTreeSet<String> {
        match kind {
            ImportKind::Direct => &mut self.direct,
            ImportKind::From => &mut self.from,
            ImportKind::Dynamic => &mut self.dynamic,
            ImportKind::Conditional => &mut self.conditional,
        }
    }

    /// Union of every category.
    pub fn all(&self) -> BTreeSet<String> {
        ImportKind::ALL
            .iter()
            .flat_map(|kind| self.get(*kind).iter().cloned())
            .collect()
    }

    /// First segments of every recorded name.
    pub fn top_level(&self) -> BTreeSet<String> {
        ImportKind::ALL
            .iter()
            .flat_map(|kind| self.get(*kind).iter())
            .map(|name| top_level(name).to_string())
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        ImportKind::ALL.iter().all(|kind| self.get(*kind).is_empty())
    }

    pub fn len(&self) -> usize {
        ImportKind::ALL.iter().map(|kind| self.get(*kind).len()).sum()
    }
}

/// Position and reason of the first tokenizer or statement error.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("line {line}: {message}")]
pub struct SyntaxError {
    pub line: usize,
    pub message: String,
}

/// Result of extracting one source.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Extraction {
    pub imports: ImportSet,
    /// Set when the source did not parse and the regex fallback was used.
    pub syntax_error: Option<SyntaxError>,
}

/// Extract imports from Python source text.
///
/// Never fails: unparseable sources are scanned with the regex fallback
/// and the parse error is reported in [`Extraction::syntax_error`].
pub fn extract(source: &str) -> Extraction {
    let parsed = lexer::tokenize(source).and_then(|tokens| walker::walk(&tokens));

    let mut imports = ImportSet::new();
    match parsed {
        Ok(found) => {
            for (kind, name) in found {
                imports.insert(kind, &name);
            }
            debug!("Extracted {} import names", imports.len());
            Extraction {
                imports,
                syntax_error: None,
            }
        }
        Err(error) => {
            warn!("Source does not parse ({}), using line scan", error);
            for name in fallback::scan(source) {
                imports.insert(ImportKind::Conditional, &name);
            }
            Extraction {
                imports,
                syntax_error: Some(error),
            }
        }
    }
}

/// Text encoding a source was decoded from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceEncoding {
    Utf8,
    Gbk,
    /// Neither decoder accepted the bytes; invalid sequences were replaced.
    Lossy,
}

/// Decoded source text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedSource {
    pub text: String,
    pub encoding: SourceEncoding,
}

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Decode script bytes: UTF-8 (BOM stripped), then GBK, then lossy UTF-8.
pub fn decode_source(bytes: &[u8]) -> DecodedSource {
    let bytes = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);

    if let Ok(text) = std::str::from_utf8(bytes) {
        return DecodedSource {
            text: text.to_string(),
            encoding: SourceEncoding::Utf8,
        };
    }

    let (text, had_errors) = encoding_rs::GBK.decode_without_bom_handling(bytes);
    if !had_errors {
        debug!("Source decoded as GBK");
        return DecodedSource {
            text: text.into_owned(),
            encoding: SourceEncoding::Gbk,
        };
    }

    warn!("Source is neither UTF-8 nor GBK, decoding lossily");
    DecodedSource {
        text: String::from_utf8_lossy(bytes).into_owned(),
        encoding: SourceEncoding::Lossy,
    }
}

/// Read, decode and extract a script file.
pub fn extract_file(path: &Path) -> Result<Extraction> {
    let bytes = std::fs::read(path)?;
    Ok(extract(&decode_source(&bytes).text))
}
