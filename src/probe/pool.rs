//! Bounded worker pool, one interpreter spawn per module.

use std::collections::{BTreeMap, VecDeque};
use std::path::PathBuf;
use std::sync::{mpsc, Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

use super::batch::probe_chunk;
use super::{deadline_after, ModuleInfo, ProbeRequest, ProbeStrategy};

type Job = (String, String);

/// Probes each module in its own interpreter, several at a time.
#[derive(Debug, Clone)]
pub struct PoolProbe {
    timeout: Duration,
    workers: usize,
}

impl PoolProbe {
    pub fn new(timeout: Duration, workers: usize) -> Self {
        Self { timeout, workers }
    }

    /// Worker count for `jobs` modules: at least one, at most four per core.
    fn pool_size(&self, jobs: usize) -> usize {
        let cores = thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);
        self.workers.clamp(1, cores * 4).min(jobs.max(1))
    }
}

struct Shared {
    interpreter: PathBuf,
    queue: Mutex<VecDeque<Job>>,
    deadline: Instant,
}

impl Shared {
    fn next_job(&self) -> Option<Job> {
        // Lock only long enough to pop.
        self.queue
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .pop_front()
    }

    fn run(&self, results: &mpsc::Sender<(String, ModuleInfo)>) {
        while let Some((import, dist)) = self.next_job() {
            let remaining = self.deadline.saturating_duration_since(Instant::now());
            let outcome = if remaining.is_zero() {
                Some((import.clone(), ModuleInfo::timed_out(dist.clone())))
            } else {
                probe_chunk(&self.interpreter, &[(import.clone(), dist.clone())], remaining)
                    .remove(&import)
                    .map(|info| (import.clone(), info))
            };
            let message = outcome.unwrap_or_else(|| (import, ModuleInfo::probe_failed(dist)));
            if results.send(message).is_err() {
                return;
            }
        }
    }
}

impl ProbeStrategy for PoolProbe {
    fn name(&self) -> &'static str {
        "pool"
    }

    fn probe(&self, request: &ProbeRequest) -> BTreeMap<String, ModuleInfo> {
        if request.is_empty() {
            return BTreeMap::new();
        }

        let shared = Arc::new(Shared {
            interpreter: request.interpreter.clone(),
            queue: Mutex::new(request.modules.iter().cloned().collect()),
            deadline: deadline_after(self.timeout),
        });
        let (tx, rx) = mpsc::channel();

        let size = self.pool_size(request.modules.len());
        let mut handles = Vec::with_capacity(size);
        for idx in 0..size {
            let shared = Arc::clone(&shared);
            let tx = tx.clone();
            match thread::Builder::new()
                .name(format!("packwise-probe-{}", idx))
                .spawn(move || shared.run(&tx))
            {
                Ok(handle) => handles.push(handle),
                Err(e) => {
                    warn!("Could not start probe worker {}: {}", idx, e);
                    break;
                }
            }
        }

        if handles.is_empty() {
            debug!("No probe workers started, probing on the calling thread");
            shared.run(&tx);
        }
        drop(tx);

        debug!(
            "Probing {} modules with {} workers",
            request.modules.len(),
            handles.len().max(1)
        );

        let mut results: BTreeMap<String, ModuleInfo> = rx.into_iter().collect();
        for handle in handles {
            let _ = handle.join();
        }

        // A worker that panicked leaves its jobs unanswered.
        for (import, dist) in &request.modules {
            results
                .entry(import.clone())
                .or_insert_with(|| ModuleInfo::timed_out(dist.clone()));
        }
        results
    }
}


#[cfg(all(test, unix))]
mod process_tests {
    use super::*;
    use crate::probe::ModuleStatus;
    use std::fs;
    use std::os::unix::fs::PermissionsExt;
    use std::path::Path;
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
    fn pool_probes_each_module() {
        let temp = TempDir::new().unwrap();
        // Report whatever single module was requested as installed.
        let python = fake_python(
            temp.path(),
            r#"name=$(cat | sed 's/^\[\["\([^"]*\)".*/\1/')
echo "__PACKWISE_PROBE__{\"$name\": {\"status\": \"installed\", \"version\": \"1.0\"}}""#,
        );

        let probe = PoolProbe::new(Duration::from_secs(20), 3);
        let results = probe.probe(&request(&python, &["a", "b", "c", "d"]));

        assert_eq!(results.len(), 4);
        for info in results.values() {
            assert_eq!(info.status, ModuleStatus::Installed);
            assert_eq!(info.version.as_deref(), Some("1.0"));
        }
    }

    #[test]
    fn pool_shares_one_deadline() {
        let temp = TempDir::new().unwrap();
        let python = fake_python(temp.path(), "exec sleep 30");

        let start = Instant::now();
        let probe = PoolProbe::new(Duration::from_millis(300), 2);
        let results = probe.probe(&request(&python, &["a", "b", "c", "d", "e", "f"]));

        assert_eq!(results.len(), 6);
        assert!(results
            .values()
            .all(|info| info.status == ModuleStatus::Timeout));
        assert!(start.elapsed() < Duration::from_secs(10));
    }

    #[test]
    fn one_failure_does_not_block_others() {
        let temp = TempDir::new().unwrap();
        let python = fake_python(
            temp.path(),
            r#"input=$(cat)
case "$input" in
  *broken*) exit 1 ;;
  *) echo '__PACKWISE_PROBE__{"ok": {"status": "installed"}}' ;;
esac"#,
        );

        let probe = PoolProbe::new(Duration::from_secs(20), 2);
        let results = probe.probe(&request(&python, &["broken", "ok"]));

        assert_eq!(results["broken"].status, ModuleStatus::ProbeFailed);
        assert_eq!(results["ok"].status, ModuleStatus::Installed);
    }
}
