//! Process-backed endpoint.
//!
//! Runs each command as `<launcher...> sh -c "exec 2>&1; <command>"`. The
//! launcher is an argv prefix selecting the execution context of the
//! endpoint, with `{name}` replaced by the endpoint name:
//!
//! - `["ip", "netns", "exec", "{name}"]` for named network namespaces
//! - `["docker", "exec", "{name}"]` for containers
//! - `[]` for the local host
//!
//! # Graceful Degradation
//!
//! - Spawn failure (launcher missing): logged, empty output returned
//! - Timeout: the whole process group killed, partial output returned
//! - Descendants holding the pipes open: readers abandoned after a grace period
//! - Oversized output: capture capped at `max_capture` bytes
//!
//! No function in this module will panic or return an error upward.

use crate::platform::endpoint::{Endpoint, EndpointRole};
use std::io::Read;
use std::process::{Child, Command, Stdio};
use std::sync::mpsc::{self, Sender};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, warn};
use wait_timeout::ChildExt;

/// Maximum number of bytes captured from a single command (1 MiB).
pub const DEFAULT_MAX_CAPTURE: usize = 1024 * 1024;

/// How long to wait for output readers once the process is gone.
const READER_GRACE: Duration = Duration::from_millis(300);

/// Endpoint executing commands through a local process launcher.
#[derive(Debug, Clone)]
pub struct ShellEndpoint {
    name: String,
    role: EndpointRole,
    launcher: Vec<String>,
    max_capture: usize,
}

impl ShellEndpoint {
    pub fn new(name: impl Into<String>, role: EndpointRole, launcher: Vec<String>) -> Self {
        ShellEndpoint {
            name: name.into(),
            role,
            launcher,
            max_capture: DEFAULT_MAX_CAPTURE,
        }
    }

    /// Endpoint running commands directly on the local host
    pub fn local(name: impl Into<String>, role: EndpointRole) -> Self {
        Self::new(name, role, Vec::new())
    }

    #[cfg(test)]
    fn with_max_capture(mut self, bytes: usize) -> Self {
        self.max_capture = bytes;
        self
    }

    /// Launcher argv with `{name}` substituted
    pub fn launcher_argv(&self) -> Vec<String> {
        self.launcher
            .iter()
            .map(|arg| arg.replace("{name}", &self.name))
            .collect()
    }

    fn build_command(&self, command: &str) -> Command {
        let script = format!("exec 2>&1; {}", command);
        let argv = self.launcher_argv();

        let mut cmd = match argv.split_first() {
            Some((program, rest)) => {
                let mut cmd = Command::new(program);
                cmd.args(rest).arg("sh");
                cmd
            }
            None => Command::new("sh"),
        };
        cmd.args(["-c", &script])
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        // Pipelines and forked probes share the group and die with it on timeout
        #[cfg(unix)]
        {
            use std::os::unix::process::CommandExt;
            cmd.process_group(0);
        }
        cmd
    }
}

impl Endpoint for ShellEndpoint {
    fn name(&self) -> &str {
        &self.name
    }

    fn role(&self) -> EndpointRole {
        self.role
    }

    fn execute(&self, command: &str, timeout: Duration) -> String {
        debug!(endpoint = %self.name, %command, timeout_ms = timeout.as_millis() as u64, "dispatching command");

        let mut child = match self.build_command(command).spawn() {
            Ok(child) => child,
            Err(e) => {
                warn!(endpoint = %self.name, error = %e, "failed to spawn command");
                return String::new();
            }
        };

        let captured = Arc::new(Mutex::new(Vec::new()));
        let (done_tx, done_rx) = mpsc::channel();
        let mut readers = 0;

        if let Some(stdout) = child.stdout.take() {
            spawn_reader(stdout, Arc::clone(&captured), done_tx.clone(), self.max_capture);
            readers += 1;
        }
        // Launcher diagnostics (e.g. unknown namespace) arrive on the outer stderr
        if let Some(stderr) = child.stderr.take() {
            spawn_reader(stderr, Arc::clone(&captured), done_tx.clone(), self.max_capture);
            readers += 1;
        }
        drop(done_tx);

        match child.wait_timeout(timeout) {
            Ok(Some(status)) => {
                debug!(endpoint = %self.name, code = ?status.code(), "command finished");
            }
            Ok(None) => {
                warn!(endpoint = %self.name, %command, timeout_ms = timeout.as_millis() as u64, "command timed out, keeping partial output");
                terminate(&mut child);
            }
            Err(e) => {
                warn!(endpoint = %self.name, error = %e, "failed waiting for command");
                terminate(&mut child);
            }
        }

        let deadline = Instant::now() + READER_GRACE;
        for _ in 0..readers {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if done_rx.recv_timeout(remaining).is_err() {
                debug!(endpoint = %self.name, "output reader still attached, abandoning it");
                break;
            }
        }

        let bytes = match captured.lock() {
            Ok(buf) => buf.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        };
        String::from_utf8_lossy(&bytes).into_owned()
    }
}

/// Kill the process group led by `child`, then reap the child itself.
fn terminate(child: &mut Child) {
    #[cfg(unix)]
    {
        use nix::sys::signal::{killpg, Signal};
        use nix::unistd::Pid;

        #[allow(clippy::cast_possible_wrap)]
        let group = Pid::from_raw(child.id() as i32);
        if let Err(e) = killpg(group, Signal::SIGKILL) {
            debug!(pgid = child.id(), error = %e, "process group already gone");
        }
    }
    let _ = child.kill();
    let _ = child.wait();
}

/// Drain a pipe into the shared buffer until EOF, then signal completion.
fn spawn_reader<R>(mut pipe: R, sink: Arc<Mutex<Vec<u8>>>, done: Sender<()>, cap: usize)
where
    R: Read + Send + 'static,
{
    thread::spawn(move || {
        let mut chunk = [0u8; 4096];
        loop {
            match pipe.read(&mut chunk) {
                Ok(0) | Err(_) => break,
                Ok(n) => {
                    if let Ok(mut buf) = sink.lock() {
                        let room = cap.saturating_sub(buf.len());
                        buf.extend_from_slice(&chunk[..n.min(room)]);
                    }
                }
            }
        }
        let _ = done.send(());
    });
}
