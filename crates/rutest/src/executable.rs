//! Test executables driven as child processes
//!
//! Speaks the suite command-line protocol:
//! - `<exe> -ln` lists `Group.Case` names
//! - `<exe> -ll` lists `Group.Case.file.line` locations
//! - `<exe> -sg <group> -sn <case> -v` runs one case with verbose output

use crate::error::{HarnessError, HarnessResult};
use crate::output_parser::{parse_location_list, parse_test_list, TestLocation};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::sync::{mpsc, Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// How long pipes may stay open after the child itself has exited
const DRAIN_GRACE: Duration = Duration::from_millis(250);

/// How a child run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChildExit {
    Completed(ExitStatus),
    /// Killed after exceeding the timeout
    TimedOut,
}

/// Captured output of a child run
#[derive(Debug, Clone)]
pub struct ChildOutput {
    pub exit: ChildExit,
    pub stdout: String,
    pub stderr: String,
    pub duration: Duration,
}

impl ChildOutput {
    pub fn success(&self) -> bool {
        matches!(self.exit, ChildExit::Completed(status) if status.success())
    }

    /// Human-readable end state, e.g. `exit status: 1` or `signal: 6 (SIGABRT)`
    pub fn describe_exit(&self) -> String {
        match self.exit {
            ChildExit::Completed(status) => status.to_string(),
            ChildExit::TimedOut => "timed out".to_string(),
        }
    }
}

/// A test executable and the directory it runs in
#[derive(Debug, Clone)]
pub struct ExecutableRunner {
    command: PathBuf,
    working_dir: Option<PathBuf>,
    extra_args: Vec<String>,
    name: String,
}

impl ExecutableRunner {
    /// Runs in the executable's own directory unless `with_working_dir` says otherwise
    pub fn new(command: impl Into<PathBuf>) -> Self {
        let command = command.into();
        let name = command
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| command.display().to_string());

        // A bare name is looked up on PATH and keeps the caller's directory.
        let has_parent = command
            .parent()
            .is_some_and(|parent| !parent.as_os_str().is_empty());
        let command = if has_parent {
            std::fs::canonicalize(&command).unwrap_or(command)
        } else {
            command
        };
        let working_dir = if has_parent {
            command.parent().map(Path::to_path_buf)
        } else {
            None
        };

        Self {
            command,
            working_dir,
            extra_args: Vec::new(),
            name,
        }
    }

    /// The running executable, re-invoked for process-isolated cases in the caller's directory
    pub fn current() -> HarnessResult<Self> {
        Ok(Self::new(std::env::current_exe()?).with_working_dir(std::env::current_dir()?))
    }

    pub fn with_working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    /// Arguments appended to every case invocation
    pub fn with_extra_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.extra_args.extend(args.into_iter().map(Into::into));
        self
    }

    /// File name of the executable
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn command(&self) -> &Path {
        &self.command
    }

    pub fn working_dir(&self) -> Option<&Path> {
        self.working_dir.as_deref()
    }

    fn base_command(&self) -> Command {
        let mut cmd = Command::new(&self.command);
        if let Some(dir) = &self.working_dir {
            cmd.current_dir(dir);
        }
        cmd.stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        cmd
    }

    /// List the executable's cases via `-ln`, in the order it reports them
    pub fn list_tests(&self) -> HarnessResult<Vec<(String, String)>> {
        let mut cmd = self.base_command();
        cmd.arg("-ln");
        tracing::debug!(command = %self.command.display(), "listing tests");

        let output = cmd
            .output()
            .map_err(|e| HarnessError::spawn(&self.command, e))?;

        if !output.status.success() {
            return Err(HarnessError::ListFailed {
                command: self.command.clone(),
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(parse_test_list(&String::from_utf8_lossy(&output.stdout)))
    }

    /// Source locations of the executable's cases via `-ll`
    pub fn list_locations(&self) -> HarnessResult<Vec<TestLocation>> {
        let mut cmd = self.base_command();
        cmd.arg("-ll");
        tracing::debug!(command = %self.command.display(), "listing locations");

        let output = cmd
            .output()
            .map_err(|e| HarnessError::spawn(&self.command, e))?;

        if !output.status.success() {
            return Err(HarnessError::ListFailed {
                command: self.command.clone(),
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(parse_location_list(&String::from_utf8_lossy(&output.stdout)))
    }

    /// Run one case via `-sg <group> -sn <case> -v`, killing it after `timeout`
    pub fn run_test(
        &self,
        group: &str,
        case: &str,
        timeout: Option<Duration>,
    ) -> HarnessResult<ChildOutput> {
        let mut cmd = self.base_command();
        cmd.args(["-sg", group, "-sn", case, "-v"]);
        cmd.args(&self.extra_args);

        tracing::debug!(command = %self.command.display(), group, case, "spawning case");
        let start = Instant::now();
        let child = cmd
            .spawn()
            .map_err(|e| HarnessError::spawn(&self.command, e))?;

        let output = wait_with_timeout(child, timeout)?;
        let duration = start.elapsed();

        if output.exit == ChildExit::TimedOut {
            tracing::warn!(group, case, ?timeout, "case timed out, child killed");
        }

        Ok(ChildOutput { duration, ..output })
    }
}

/// Wait for `child`, draining its pipes, and kill it once `timeout` elapses
///
/// Pipes inherited by a grandchild can outlive the child. They get
/// [`DRAIN_GRACE`] after the child exits, then whatever was read so far is kept.
pub fn wait_with_timeout(mut child: Child, timeout: Option<Duration>) -> HarnessResult<ChildOutput> {
    let start = Instant::now();
    let stdout = Drain::start(child.stdout.take());
    let stderr = Drain::start(child.stderr.take());

    let exit = loop {
        if let Some(status) = child.try_wait()? {
            break ChildExit::Completed(status);
        }
        if timeout.is_some_and(|limit| start.elapsed() >= limit) {
            // The child may exit between try_wait and kill.
            let _ = child.kill();
            child.wait()?;
            break ChildExit::TimedOut;
        }
        thread::sleep(POLL_INTERVAL);
    };

    let deadline = Instant::now() + DRAIN_GRACE;
    Ok(ChildOutput {
        exit,
        stdout: stdout.collect(deadline),
        stderr: stderr.collect(deadline),
        duration: start.elapsed(),
    })
}

/// A pipe read on a helper thread into a shared buffer
struct Drain {
    bytes: Arc<Mutex<Vec<u8>>>,
    done: mpsc::Receiver<()>,
}

impl Drain {
    fn start<R: Read + Send + 'static>(pipe: Option<R>) -> Self {
        let bytes = Arc::new(Mutex::new(Vec::new()));
        let (tx, done) = mpsc::channel();
        let sink = Arc::clone(&bytes);
        thread::spawn(move || {
            if let Some(mut pipe) = pipe {
                let mut chunk = [0u8; 8192];
                loop {
                    match pipe.read(&mut chunk) {
                        Ok(0) | Err(_) => break,
                        Ok(n) => match sink.lock() {
                            Ok(mut buf) => buf.extend_from_slice(&chunk[..n]),
                            Err(_) => break,
                        },
                    }
                }
            }
            let _ = tx.send(());
        });
        Self { bytes, done }
    }

    /// Wait for end of stream until `deadline`, then take what was read
    fn collect(self, deadline: Instant) -> String {
        let remaining = deadline.saturating_duration_since(Instant::now());
        if self.done.recv_timeout(remaining).is_err() {
            tracing::debug!("pipe still open after child exit, detaching reader");
        }
        match self.bytes.lock() {
            Ok(buf) => String::from_utf8_lossy(&buf).into_owned(),
            Err(_) => String::new(),
        }
    }
}
