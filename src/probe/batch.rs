//! One interpreter spawn per chunk of modules.

use std::collections::BTreeMap;
use std::path::Path;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

use super::process::{run_with_input, RunOutcome};
use super::script::{encode_request, parse_output, PROBE_SCRIPT};
use super::{deadline_after, ModuleInfo, ProbeRequest, ProbeStrategy};

/// Probes modules in chunks, one interpreter process per chunk.
#[derive(Debug, Clone)]
pub struct BatchProbe {
    timeout: Duration,
    chunk_size: usize,
}

impl BatchProbe {
    pub fn new(timeout: Duration, chunk_size: usize) -> Self {
        Self {
            timeout,
            chunk_size: chunk_size.max(1),
        }
    }
}

impl ProbeStrategy for BatchProbe {
    fn name(&self) -> &'static str {
        "batch"
    }

    fn probe(&self, request: &ProbeRequest) -> BTreeMap<String, ModuleInfo> {
        let deadline = deadline_after(self.timeout);
        let mut results = BTreeMap::new();

        for chunk in request.modules.chunks(self.chunk_size) {
            let remaining = deadline.saturating_duration_since(Instant::now());
            let chunk_results = if remaining.is_zero() {
                debug!("Probe deadline passed, skipping {} modules", chunk.len());
                mark_all(chunk, |d| ModuleInfo::timed_out(d))
            } else {
                probe_chunk(&request.interpreter, chunk, remaining)
            };
            results.extend(chunk_results);
        }

        results
    }
}

/// Run the probe script once for `modules`.
pub(super) fn probe_chunk(
    interpreter: &Path,
    modules: &[(String, String)],
    timeout: Duration,
) -> BTreeMap<String, ModuleInfo> {
    debug!(
        "Probing {} modules with {}",
        modules.len(),
        interpreter.display()
    );

    let input = encode_request(modules);
    match run_with_input(interpreter, &["-c", PROBE_SCRIPT], &input, timeout) {
        Ok(RunOutcome::Finished {
            status,
            stdout,
            stderr,
            duration,
        }) => match parse_output(&stdout, modules) {
            Some(results) => {
                debug!("Probe finished in {:?}", duration);
                results
            }
            None => {
                warn!(
                    "Probe produced no result (exit {:?}): {}",
                    status.code(),
                    stderr.lines().last().unwrap_or_default()
                );
                mark_all(modules, |d| ModuleInfo::probe_failed(d))
            }
        },
        Ok(RunOutcome::TimedOut) => {
            warn!("Probe of {} modules timed out", modules.len());
            mark_all(modules, |d| ModuleInfo::timed_out(d))
        }
        Err(e) => {
            warn!("Failed to run {}: {}", interpreter.display(), e);
            mark_all(modules, |d| ModuleInfo::probe_failed(d))
        }
    }
}

pub(super) fn mark_all(
    modules: &[(String, String)],
    status: fn(String) -> ModuleInfo,
) -> BTreeMap<String, ModuleInfo> {
    modules
        .iter()
        .map(|(import, dist)| (import.clone(), status(dist.clone())))
        .collect()
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::probe::ModuleStatus;
    use std::fs;
    use std::os::unix::fs::PermissionsExt;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn fake_python(dir: &Path, body: &str) -> PathBuf {
        let path = dir.join("python");
        fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    fn request(interpreter: &Path, names: &[&str]) -> ProbeRequest {
        ProbeRequest::new(
            interpreter,
            names.iter().map(|n| (n.to_string(), n.to_string())),
        )
    }

    #[test]
    fn batch_reads_results() {
        let temp = TempDir::new().unwrap();
        let python = fake_python(
            temp.path(),
            r#"cat > /dev/null
echo 'import noise'
echo '__PACKWISE_PROBE__{"numpy": {"status": "installed", "version": "1.26.0"}, "foo_bar": {"status": "missing"}}'"#,
        );

        let probe = BatchProbe::new(Duration::from_secs(10), 64);
        let results = probe.probe(&request(&python, &["numpy", "foo_bar"]));

        assert_eq!(results["numpy"].status, ModuleStatus::Installed);
        assert_eq!(results["numpy"].version.as_deref(), Some("1.26.0"));
        assert_eq!(results["foo_bar"].status, ModuleStatus::Missing);
        assert!(!results["foo_bar"].available);
    }

    #[test]
    fn batch_survives_unbounded_timeout() {
        let temp = TempDir::new().unwrap();
        let python = fake_python(
            temp.path(),
            r#"cat > /dev/null
echo '__PACKWISE_PROBE__{"numpy": {"status": "missing"}}'"#,
        );

        let probe = BatchProbe::new(Duration::from_secs(u64::MAX), 64);
        let results = probe.probe(&request(&python, &["numpy"]));
        assert_eq!(results["numpy"].status, ModuleStatus::Missing);
    }

    #[test]
    fn batch_spawns_once_per_chunk() {
        let temp = TempDir::new().unwrap();
        let log = temp.path().join("spawns");
        let python = fake_python(
            temp.path(),
            &format!(
                "cat > /dev/null\necho run >> '{}'\necho '__PACKWISE_PROBE__{{}}'",
                log.display()
            ),
        );

        let probe = BatchProbe::new(Duration::from_secs(10), 2);
        let results = probe.probe(&request(&python, &["a", "b", "c", "d", "e"]));

        assert_eq!(results.len(), 5);
        let spawns = fs::read_to_string(&log).unwrap();
        assert_eq!(spawns.lines().count(), 3);
    }

    #[test]
    fn batch_timeout_marks_chunk() {
        let temp = TempDir::new().unwrap();
        let python = fake_python(temp.path(), "exec sleep 30");

        let probe = BatchProbe::new(Duration::from_millis(300), 64);
        let results = probe.probe(&request(&python, &["torch", "tensorflow"]));

        assert!(results
            .values()
            .all(|info| info.status == ModuleStatus::Timeout));
    }

    #[test]
    fn batch_garbage_output_is_probe_failed() {
        let temp = TempDir::new().unwrap();
        let python = fake_python(temp.path(), "cat > /dev/null\necho Traceback >&2\nexit 1");

        let probe = BatchProbe::new(Duration::from_secs(10), 64);
        let results = probe.probe(&request(&python, &["numpy"]));
        assert_eq!(results["numpy"].status, ModuleStatus::ProbeFailed);
    }

    #[test]
    fn batch_missing_interpreter_is_probe_failed() {
        let probe = BatchProbe::new(Duration::from_secs(1), 64);
        let results = probe.probe(&request(Path::new("/nonexistent/python3"), &["numpy"]));
        assert_eq!(results["numpy"].status, ModuleStatus::ProbeFailed);
    }

    #[test]
    fn empty_request_spawns_nothing() {
        let probe = BatchProbe::new(Duration::from_secs(1), 64);
        let results = probe.probe(&request(Path::new("/nonexistent/python3"), &[]));
        assert!(results.is_empty());
    }
}
