//! Time-bounded interpreter execution.

use std::io::{Read, Write};
use std::path::Path;
use std::process::{Command, ExitStatus, Stdio};
use std::thread;
use std::time::{Duration, Instant};
use tracing::debug;
use wait_timeout::ChildExt;

/// Outcome of one interpreter run.
#[derive(Debug)]
pub enum RunOutcome {
    /// The process exited within the time limit.
    Finished {
        status: ExitStatus,
        stdout: String,
        stderr: String,
        duration: Duration,
    },
    /// The process was killed at the time limit.
    TimedOut,
}

/// Run `program args..` feeding `input` on stdin, killing it after `timeout`.
///
/// The program is executed directly, never through a shell. Output is
/// drained by reader threads so a chatty child cannot block on a full pipe.
pub fn run_with_input(
    program: &Path,
    args: &[&str],
    input: &str,
    timeout: Duration,
) -> std::io::Result<RunOutcome> {
    let start = Instant::now();

    let mut command = Command::new(program);
    command
        .args(args)
        .env("PYTHONIOENCODING", "utf-8")
        .env("PYTHONDONTWRITEBYTECODE", "1")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());
    let mut child = spawn(&mut command)?;

    let stdin = child.stdin.take();
    let input = input.to_owned();
    let writer = thread::spawn(move || {
        if let Some(mut stdin) = stdin {
            // The child may exit without reading; a broken pipe is not an error here.
            let _ = stdin.write_all(input.as_bytes());
        }
    });

    let stdout_handle = child.stdout.take().map(|mut out| {
        thread::spawn(move || {
            let mut buf = Vec::new();
            let _ = out.read_to_end(&mut buf);
            String::from_utf8_lossy(&buf).into_owned()
        })
    });
    let stderr_handle = child.stderr.take().map(|mut err| {
        thread::spawn(move || {
            let mut buf = Vec::new();
            let _ = err.read_to_end(&mut buf);
            String::from_utf8_lossy(&buf).into_owned()
        })
    });

    match child.wait_timeout(timeout)? {
        Some(status) => {
            let _ = writer.join();
            let stdout = stdout_handle
                .and_then(|h| h.join().ok())
                .unwrap_or_default();
            let stderr = stderr_handle
                .and_then(|h| h.join().ok())
                .unwrap_or_default();
            Ok(RunOutcome::Finished {
                status,
                stdout,
                stderr,
                duration: start.elapsed(),
            })
        }
        None => {
            debug!("{} exceeded {:?}, killing", program.display(), timeout);
            let _ = child.kill();
            let _ = child.wait();
            // Reader threads finish on their own once every pipe holder exits.
            Ok(RunOutcome::TimedOut)
        }
    }
}

/// Spawn, retrying briefly while a freshly written executable is still busy.
fn spawn(command: &mut Command) -> std::io::Result<std::process::Child> {
    let mut attempts = 0;
    loop {
        match command.spawn() {
            Err(e) if e.kind() == std::io::ErrorKind::ExecutableFileBusy && attempts < 5 => {
                attempts += 1;
                thread::sleep(Duration::from_millis(20 * attempts));
            }
            result => return result,
        }
    }
}
