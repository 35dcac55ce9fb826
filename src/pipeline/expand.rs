//! Registry expansion of an extracted import set.

use serde::Serialize;
use std::collections::BTreeSet;

use crate::extract::ImportSet;
use crate::registry::{dotted_prefixes, top_level, Registry};

/// Top-level names that never refer to an installable module.
const PSEUDO_MODULES: &[&str] = &["__future__", "__main__", "builtins"];

/// Import names after implicit dependencies and baseline imports are merged in.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExpandedImports {
    /// Top-level module names.
    pub modules: BTreeSet<String>,
    /// Every dotted (non top-level) name.
    pub submodules: BTreeSet<String>,
}

/// Add implicit dependencies and baseline imports, then split by depth.
pub fn expand(imports: &ImportSet, registry: &Registry) -> ExpandedImports {
    let mut names: BTreeSet<String> = imports
        .all()
        .into_iter()
        .chain(registry.baseline_hidden_imports().iter().cloned())
        .filter(|name| !PSEUDO_MODULES.contains(&top_level(name)))
        .collect();

    // Implicit dependencies may name new top-level packages with
    // dependencies of their own.
    let mut pending: Vec<String> = names.iter().map(|n| top_level(n).to_string()).collect();
    let mut visited = BTreeSet::new();
    while let Some(module) = pending.pop() {
        if !visited.insert(module.clone()) {
            continue;
        }
        for dependency in registry.implicit_dependencies(&module) {
            for prefix in dotted_prefixes(&dependency) {
                names.insert(prefix);
            }
            pending.push(top_level(&dependency).to_string());
        }
    }

    let mut expanded = ExpandedImports::default();
    for name in names {
        if name.contains('.') {
            expanded.modules.insert(top_level(&name).to_string());
            expanded.submodules.insert(name);
        } else {
            expanded.modules.insert(name);
        }
    }
    expanded
}
