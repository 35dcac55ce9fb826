//! The probe program run inside the target interpreter, and its output format.
//!
//! The interpreter receives a JSON array of `[import, distribution]` pairs
//! on stdin and prints a single line starting with [`RESULT_MARKER`]
//! followed by a JSON object keyed by import name. Anything the imported
//! modules print is captured and discarded before the result line.

use serde::Deserialize;
use std::collections::BTreeMap;
use tracing::{debug, warn};

use super::ModuleInfo;

/// Prefix of the result line on stdout.
pub const RESULT_MARKER: &str = "__PACKWISE_PROBE__";

/// Python program passed with `-c`.
pub const PROBE_SCRIPT: &str = r#"
import contextlib, importlib, io, json, sys
try:
    from importlib import metadata as _metadata
except ImportError:
    _metadata = None

def _version(module, distribution):
    if _metadata is not None:
        try:
            return _metadata.version(distribution)
        except Exception:
            pass
    value = getattr(module, "__version__", None)
    return value if isinstance(value, str) else None

def _is_requested(exc, name):
    missing = getattr(exc, "name", None)
    return missing is None or missing == name or name.startswith(missing + ".")

def _main():
    pairs = json.loads(sys.stdin.read() or "[]")
    results = {}
    for name, distribution in pairs:
        sink = io.StringIO()
        try:
            with contextlib.redirect_stdout(sink), contextlib.redirect_stderr(sink):
                module = importlib.import_module(name)
            results[name] = {"status": "installed", "version": _version(module, distribution)}
        except ImportError as exc:
            if _is_requested(exc, name):
                results[name] = {"status": "missing"}
            else:
                results[name] = {"status": "error", "error": repr(exc)[:300]}
        except BaseException as exc:
            results[name] = {"status": "error", "error": repr(exc)[:300]}
    sys.stdout.write("__PACKWISE_PROBE__" + json.dumps(results) + "\n")
    sys.stdout.flush()

_main()
"#;

/// Serialize `(import, distribution)` pairs for the script's stdin.
pub fn encode_request(modules: &[(String, String)]) -> String {
    let pairs: Vec<[&str; 2]> = modules
        .iter()
        .map(|(import, dist)| [import.as_str(), dist.as_str()])
        .collect();
    serde_json::to_string(&pairs).unwrap_or_else(|_| "[]".to_string())
}

#[derive(Debug, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
enum ProbeOutcome {
    Installed {
        #[serde(default)]
        version: Option<String>,
    },
    Missing,
    Error {
        #[serde(default)]
        error: Option<String>,
    },
}

/// Parse script stdout into per-module results.
///
/// Returns `None` when no well-formed result line is present. Modules
/// requested but absent from the result are marked `ProbeFailed`.
pub fn parse_output(
    stdout: &str,
    modules: &[(String, String)],
) -> Option<BTreeMap<String, ModuleInfo>> {
    let payload = stdout
        .lines()
        .rev()
        .find_map(|line| line.trim_end().strip_prefix(RESULT_MARKER))?;

    let outcomes: BTreeMap<String, ProbeOutcome> = match serde_json::from_str(payload) {
        Ok(outcomes) => outcomes,
        Err(e) => {
            warn!("Unparseable probe result line: {}", e);
            return None;
        }
    };

    let results = modules
        .iter()
        .map(|(import, dist)| {
            let info = match outcomes.get(import) {
                Some(ProbeOutcome::Installed { version }) => {
                    ModuleInfo::installed(dist.clone(), version.clone())
                }
                Some(ProbeOutcome::Missing) => ModuleInfo::missing(dist.clone()),
                Some(ProbeOutcome::Error { error }) => {
                    warn!(
                        "Importing {} raised: {}",
                        import,
                        error.as_deref().unwrap_or("unknown error")
                    );
                    ModuleInfo::probe_failed(dist.clone())
                }
                None => {
                    debug!("Probe output has no result for {}", import);
                    ModuleInfo::probe_failed(dist.clone())
                }
            };
            (import.clone(), info)
        })
        .collect();

    Some(results)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::probe::ModuleStatus;

    fn modules(names: &[(&str, &str)]) -> Vec<(String, String)> {
        names
            .iter()
            .map(|(i, d)| (i.to_string(), d.to_string()))
            .collect()
    }

    #[test]
    fn script_uses_marker() {
        assert!(PROBE_SCRIPT.contains(RESULT_MARKER));
    }

    #[test]
    fn encodes_pairs() {
        let json = encode_request(&modules(&[("PIL", "Pillow")]));
        assert_eq!(json, r#"[["PIL","Pillow"]]"#);
    }

    #[test]
    fn parses_all_outcomes() {
        let stdout = format!(
            "noise from import\n{}{}\n",
            RESULT_MARKER,
            r#"{"numpy": {"status": "installed", "version": "1.26.0"}, "foo": {"status": "missing"}, "bad": {"status": "error", "error": "RuntimeError()"}}"#
        );
        let requested = modules(&[("numpy", "numpy"), ("foo", "foo"), ("bad", "bad"), ("gone", "gone")]);
        let results = parse_output(&stdout, &requested).unwrap();

        assert_eq!(results["numpy"].status, ModuleStatus::Installed);
        assert_eq!(results["numpy"].version.as_deref(), Some("1.26.0"));
        assert_eq!(results["foo"].status, ModuleStatus::Missing);
        assert_eq!(results["bad"].status, ModuleStatus::ProbeFailed);
        assert_eq!(results["gone"].status, ModuleStatus::ProbeFailed);
    }

    #[test]
    fn missing_marker_is_none() {
        assert!(parse_output("Traceback...\n", &modules(&[("a", "a")])).is_none());
    }

    #[test]
    fn malformed_payload_is_none() {
        let stdout = format!("{}{{not json\n", RESULT_MARKER);
        assert!(parse_output(&stdout, &modules(&[("a", "a")])).is_none());
    }

    #[test]
    fn distribution_name_is_carried() {
        let stdout = format!("{}{}", RESULT_MARKER, r#"{"PIL": {"status": "installed"}}"#);
        let results = parse_output(&stdout, &modules(&[("PIL", "Pillow")])).unwrap();
        assert_eq!(results["PIL"].distribution_name, "Pillow");
        assert!(results["PIL"].version.is_none());
    }
}
