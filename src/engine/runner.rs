use crate::engine::{io_error, CommandSpec, EngineError};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::sync::{mpsc, Arc, Mutex, MutexGuard, PoisonError};
use std::thread;
use std::time::{Duration, Instant};

/// How long to wait for the output reader after the child has been killed.
const DRAIN_GRACE: Duration = Duration::from_millis(200);

#[derive(Debug, Clone)]
pub struct RunOptions {
    pub cwd: PathBuf,
    pub timeout: Duration,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionResult {
    pub exit_code: i32,
    /// Combined stdout and stderr in write order.
    pub output: String,
    pub command_form: String,
    pub duration_ms: u64,
}

impl ExecutionResult {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

/// Runs `spec` without a shell and waits for it to exit or time out.
///
/// stdout and stderr share one pipe, so the captured text keeps the order the
/// child wrote it in. A non-zero exit is a normal result; only spawn failures,
/// timeouts and local I/O errors are errors. On timeout the child's whole
/// process group is killed.
pub fn run_command(
    spec: &CommandSpec,
    options: &RunOptions,
) -> Result<ExecutionResult, EngineError> {
    let command_form = spec.command_form();
    if !options.cwd.is_dir() {
        return Err(io_error(
            &options.cwd,
            std::io::Error::new(
                std::io::ErrorKind::NotFound,
                "working directory does not exist",
            ),
        ));
    }

    let (mut reader, stdout_writer) = std::io::pipe().map_err(|e| io_error(&options.cwd, e))?;
    let stderr_writer = stdout_writer
        .try_clone()
        .map_err(|e| io_error(&options.cwd, e))?;

    let mut command = Command::new(&spec.program);
    command
        .current_dir(&options.cwd)
        .args(&spec.args)
        .stdin(Stdio::null())
        .stdout(stdout_writer)
        .stderr(stderr_writer);
    #[cfg(unix)]
    {
        use std::os::unix::process::CommandExt;
        command.process_group(0);
    }

    let spawned = command.spawn();
    // `command` still owns the parent's write ends; the reader only sees EOF once they are gone.
    drop(command);
    let mut child = match spawned {
        Ok(child) => child,
        Err(err)
            if matches!(
                err.kind(),
                std::io::ErrorKind::NotFound | std::io::ErrorKind::PermissionDenied
            ) =>
        {
            return Err(EngineError::Spawn {
                program: spec.program.clone(),
                source: Some(err),
            })
        }
        Err(err) => return Err(io_error(Path::new(&spec.program), err)),
    };

    let captured = Arc::new(Mutex::new(Vec::new()));
    let (done_tx, done_rx) = mpsc::channel::<()>();
    let sink = Arc::clone(&captured);
    thread::spawn(move || {
        let mut chunk = [0u8; 8192];
        loop {
            match reader.read(&mut chunk) {
                Ok(0) => break,
                Ok(n) => lock_output(&sink).extend_from_slice(&chunk[..n]),
                Err(err) if err.kind() == std::io::ErrorKind::Interrupted => continue,
                Err(_) => break,
            }
        }
        let _ = done_tx.send(());
    });

    let start = Instant::now();
    let exit_status = loop {
        match child.try_wait() {
            Ok(Some(status)) => break status,
            Ok(None) => {
                if start.elapsed() > options.timeout {
                    terminate(&mut child);
                    let _ = child.wait();
                    let _ = done_rx.recv_timeout(DRAIN_GRACE);
                    return Err(EngineError::Timeout {
                        timeout_ms: options.timeout.as_millis() as u64,
                        partial_output: snapshot(&captured),
                        command_form,
                    });
                }
                thread::sleep(Duration::from_millis(10));
            }
            Err(err) => {
                terminate(&mut child);
                return Err(io_error(&options.cwd, err));
            }
        }
    };

    // Descendants that outlive the child can hold the pipe open; they get the
    // rest of the timeout budget and are then killed. One that left the process
    // group keeps the reader blocked, so the output read so far is returned.
    let remaining = options.timeout.saturating_sub(start.elapsed());
    if done_rx.recv_timeout(remaining).is_err() {
        terminate(&mut child);
        let _ = done_rx.recv_timeout(DRAIN_GRACE);
    }

    Ok(ExecutionResult {
        exit_code: exit_status.code().unwrap_or(-1),
        output: snapshot(&captured),
        command_form,
        duration_ms: start.elapsed().as_millis() as u64,
    })
}

fn lock_output(output: &Mutex<Vec<u8>>) -> MutexGuard<'_, Vec<u8>> {
    output.lock().unwrap_or_else(PoisonError::into_inner)
}

fn snapshot(output: &Mutex<Vec<u8>>) -> String {
    String::from_utf8_lossy(&lock_output(output)).into_owned()
}

#[cfg(unix)]
fn terminate(child: &mut Child) {
    use nix::sys::signal::{killpg, Signal};
    use nix::unistd::Pid;

    let _ = killpg(Pid::from_raw(child.id() as i32), Signal::SIGKILL);
    let _ = child.kill();
}

#[cfg(not(unix))]
fn terminate(child: &mut Child) {
    let _ = child.kill();
}
