//! FS-UAE process lifecycle: path validation, command line, launch, stop.

mod interrupt;
mod process;

pub use process::ProcessHandle;

use crate::locator::{self, LocatorError};
use crate::pty::{PtyChannel, PtyError};
use interrupt::InterruptScope;
use process::{status_code, ChildProcess};
use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::Duration;
use thiserror::Error;
use tracing::Span;

/// Extension FS-UAE uses for its configuration files.
pub const CONFIG_EXTENSION: &str = ".fs-uae";

/// Flag that makes FS-UAE log to stdout.
pub const STDOUT_FLAG: &str = "--stdout";

/// Subdirectory of the data directory holding named configurations.
const CONFIGURATIONS_DIR: &str = "Configurations";

/// How long a terminated process gets to exit before it is killed.
const TERMINATE_GRACE: Duration = Duration::from_secs(3);

const WAIT_POLL: Duration = Duration::from_millis(50);

#[derive(Debug, Error)]
pub enum RunnerError {
    #[error("FS-UAE data directory not found: {path}")]
    MissingDataDirectory { path: PathBuf },

    #[error("FS-UAE binary directory not found: {path}")]
    MissingBinaryDirectory { path: PathBuf },

    #[error("FS-UAE binary not found or not executable: {path}")]
    MissingExecutable { path: PathBuf },

    #[error("Can't find config file: {path}")]
    MissingConfigFile { path: PathBuf },

    #[error("Runner used before setup()")]
    NotSetUp,

    #[error("Failed to launch '{command}': {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to attach '{command}' to the pseudoterminal: {source}")]
    Attach {
        command: String,
        #[source]
        source: PtyError,
    },

    #[error("'{command}' was started without a process id")]
    MissingPid { command: String },

    #[error(transparent)]
    Locator(#[from] LocatorError),

    #[error("Process control failed: {0}")]
    Io(#[from] std::io::Error),
}

/// Result of a blocking run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// The process exited on its own with this code.
    Exited(i32),
    /// The operator interrupted the run; the process was stopped.
    Aborted,
}

struct Paths {
    data_dir: PathBuf,
    binary: PathBuf,
}

/// Launches and supervises one FS-UAE process at a time.
pub struct Runner {
    span: Span,
    paths: Option<Paths>,
    proc: Option<ProcessHandle>,
}

impl Runner {
    pub fn new(span: Span) -> Self {
        Self {
            span,
            paths: None,
            proc: None,
        }
    }

    /// Validate and cache the data directory and binary path.
    ///
    /// Checks run in order and stop at the first failure. No process is
    /// started.
    pub fn setup(
        &mut self,
        bin_dir: &Path,
        data_dir: &Path,
        bin_name: Option<&str>,
    ) -> Result<(), RunnerError> {
        tracing::info!(parent: &self.span, "data directory: '{}'", data_dir.display());
        if !data_dir.is_dir() {
            tracing::error!(parent: &self.span, "FS-UAE data directory not found: {}", data_dir.display());
            return Err(RunnerError::MissingDataDirectory {
                path: data_dir.to_path_buf(),
            });
        }

        tracing::info!(parent: &self.span, "binary directory: '{}'", bin_dir.display());
        if !bin_dir.is_dir() {
            tracing::error!(parent: &self.span, "FS-UAE binary directory not found: {}", bin_dir.display());
            return Err(RunnerError::MissingBinaryDirectory {
                path: bin_dir.to_path_buf(),
            });
        }

        let bin_name = match bin_name {
            Some(name) => name,
            None => locator::default_binary_name()
                .ok_or(LocatorError::Detection { what: "platform" })?,
        };
        let binary = bin_dir.join(bin_name);
        tracing::info!(parent: &self.span, "FS-UAE binary: '{}'", binary.display());
        if !is_executable(&binary) {
            tracing::error!(parent: &self.span, "FS-UAE binary not found: {}", binary.display());
            return Err(RunnerError::MissingExecutable { path: binary });
        }

        self.paths = Some(Paths {
            data_dir: data_dir.to_path_buf(),
            binary,
        });
        Ok(())
    }

    pub fn binary(&self) -> Option<&Path> {
        self.paths.as_ref().map(|p| p.binary.as_path())
    }

    pub fn data_dir(&self) -> Option<&Path> {
        self.paths.as_ref().map(|p| p.data_dir.as_path())
    }

    /// Resolve a configuration name to an existing file.
    ///
    /// The `.fs-uae` extension is added when missing. Anything that is not
    /// an existing absolute path is looked up in `<data_dir>/Configurations`.
    pub fn resolve_config_path(&self, name: Option<&str>) -> Result<Option<PathBuf>, RunnerError> {
        let Some(name) = name else {
            return Ok(None);
        };
        let paths = self.paths.as_ref().ok_or(RunnerError::NotSetUp)?;

        let mut file = name.to_string();
        if !file.ends_with(CONFIG_EXTENSION) {
            file.push_str(CONFIG_EXTENSION);
        }
        let mut path = PathBuf::from(file);
        if !path.is_absolute() || !path.exists() {
            path = paths.data_dir.join(CONFIGURATIONS_DIR).join(path);
        }

        tracing::info!(parent: &self.span, "config file: '{}'", path.display());
        if !path.is_file() {
            tracing::error!(parent: &self.span, "Can't find config file: '{}'", path.display());
            return Err(RunnerError::MissingConfigFile { path });
        }
        Ok(Some(path))
    }

    /// Assemble `[binary, --stdout?, extra_args..., config?]`.
    pub fn build_command_line(
        &self,
        extra_args: &[String],
        config: Option<&str>,
        stream_to_stdout: bool,
    ) -> Result<Vec<String>, RunnerError> {
        let paths = self.paths.as_ref().ok_or(RunnerError::NotSetUp)?;
        let mut cmd = vec![paths.binary.display().to_string()];
        if stream_to_stdout {
            cmd.push(STDOUT_FLAG.to_string());
        }
        cmd.extend(extra_args.iter().cloned());
        if let Some(path) = self.resolve_config_path(config)? {
            cmd.push(path.display().to_string());
        }
        Ok(cmd)
    }

    /// Run FS-UAE in the foreground and wait for it.
    ///
    /// Ctrl-C while waiting stops the process and yields
    /// `RunOutcome::Aborted` instead of an error.
    pub fn run_blocking(
        &mut self,
        extra_args: &[String],
        config: Option<&str>,
        stream_to_stdout: bool,
    ) -> Result<RunOutcome, RunnerError> {
        let cmd = self.build_command_line(extra_args, config, stream_to_stdout)?;
        tracing::info!(parent: &self.span, "run cmd: {:?}", cmd);

        let scope = InterruptScope::enter()?;
        self.wait_foreground(&cmd, &scope)
    }

    fn wait_foreground(
        &self,
        cmd: &[String],
        scope: &InterruptScope,
    ) -> Result<RunOutcome, RunnerError> {
        let mut child = spawn_plain(cmd)?;
        loop {
            let status = child.try_wait()?;
            // Ctrl-C reaches the whole foreground group, so the child has
            // often exited from it already.
            if scope.interrupted() {
                tracing::warn!(parent: &self.span, "*** Abort");
                if status.is_none() {
                    let mut handle =
                        ProcessHandle::new(cmd, child.id(), ChildProcess::Plain(child));
                    stop(&self.span, &mut handle)?;
                }
                return Ok(RunOutcome::Aborted);
            }
            if let Some(status) = status {
                let code = status_code(status);
                tracing::info!(parent: &self.span, code, "process exited");
                return Ok(RunOutcome::Exited(code));
            }
            std::thread::sleep(WAIT_POLL);
        }
    }

    /// Start FS-UAE in the background, sharing this process's stdio.
    pub fn run_detached(
        &mut self,
        extra_args: &[String],
        config: Option<&str>,
        stream_to_stdout: bool,
    ) -> Result<&ProcessHandle, RunnerError> {
        let cmd = self.build_command_line(extra_args, config, stream_to_stdout)?;
        tracing::info!(parent: &self.span, "start cmd: {:?}", cmd);
        let child = spawn_plain(&cmd)?;
        let pid = child.id();
        Ok(self.retain(ProcessHandle::new(&cmd, pid, ChildProcess::Plain(child))))
    }

    /// Start FS-UAE in the background with `channel`'s slave side as its
    /// controlling terminal.
    pub fn run_attached(
        &mut self,
        channel: &PtyChannel,
        extra_args: &[String],
        config: Option<&str>,
        stream_to_stdout: bool,
    ) -> Result<&ProcessHandle, RunnerError> {
        let cmd = self.build_command_line(extra_args, config, stream_to_stdout)?;
        tracing::info!(parent: &self.span, "start cmd on {}: {:?}", channel.slave_path().display(), cmd);
        let mut child = channel.spawn(&cmd).map_err(|source| RunnerError::Attach {
            command: cmd[0].clone(),
            source,
        })?;
        let Some(pid) = child.process_id() else {
            if let Err(err) = child.kill() {
                tracing::warn!(parent: &self.span, "failed to kill unidentified child: {}", err);
            }
            return Err(RunnerError::MissingPid {
                command: cmd[0].clone(),
            });
        };
        Ok(self.retain(ProcessHandle::new(&cmd, pid, ChildProcess::Pty(child))))
    }

    fn retain(&mut self, handle: ProcessHandle) -> &ProcessHandle {
        if self.proc.is_some() {
            tracing::warn!(parent: &self.span, "replacing handle of a previously started process");
        }
        self.proc.insert(handle)
    }

    pub fn process(&self) -> Option<&ProcessHandle> {
        self.proc.as_ref()
    }

    /// Whether a detached process exists and has not exited. Never blocks.
    pub fn is_running(&mut self) -> bool {
        let span = &self.span;
        let Some(proc) = self.proc.as_mut() else {
            return false;
        };
        match proc.try_wait() {
            Ok(None) => true,
            Ok(Some(_)) => false,
            Err(err) => {
                tracing::warn!(parent: span, "failed to poll process {}: {}", proc.pid(), err);
                false
            }
        }
    }

    /// Stop the detached process if it is still running and forget it.
    ///
    /// Returns `true` if a termination request was sent. Calling this again,
    /// or after the process exited on its own, sends nothing.
    pub fn terminate(&mut self) -> Result<bool, RunnerError> {
        let Some(mut proc) = self.proc.take() else {
            return Ok(false);
        };
        tracing::info!(parent: &self.span, "stop proc");
        if proc.try_wait()?.is_some() {
            return Ok(false);
        }
        stop(&self.span, &mut proc)?;
        Ok(true)
    }
}

fn stop(span: &Span, proc: &mut ProcessHandle) -> Result<(), RunnerError> {
    tracing::info!(parent: span, pid = proc.pid(), "terminate proc");
    proc.request_termination()?;
    if proc.wait_timeout(TERMINATE_GRACE)?.is_none() {
        tracing::warn!(parent: span, pid = proc.pid(), "process ignored SIGTERM, killing");
        proc.kill()?;
    }
    Ok(())
}

fn spawn_plain(cmd: &[String]) -> Result<std::process::Child, RunnerError> {
    let Some((program, args)) = cmd.split_first() else {
        return Err(RunnerError::NotSetUp);
    };
    Command::new(program)
        .args(args)
        .spawn()
        .map_err(|source| RunnerError::Spawn {
            command: program.clone(),
            source,
        })
}

fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    match std::fs::metadata(path) {
        Ok(meta) => meta.is_file() && meta.permissions().mode() & 0o111 != 0,
        Err(_) => false,
    }
}
