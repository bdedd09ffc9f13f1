//! Wiring of config, locator, runner, work dir and relay for the CLI.

use crate::config::ConfigStore;
use crate::locator::{self, Locator, LocatorError};
use crate::pty::{PtyChannel, PtyError};
use crate::relay::{RelayConfig, RelayError, RelayOutcome, TerminalRelay};
use crate::runner::{RunOutcome, Runner, RunnerError};
use crate::workdir::{WorkDir, WorkDirError};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::Span;

/// Subdirectories of the staged root volume.
const ROOT_DIRS: &[&str] = &["C", "Devs", "L", "Libs", "S"];

/// Workbench files the serial shell needs.
const WB_FILES: &[&str] = &["C/Mount", "C/NewShell", "C/EndCLI", "L/Aux-Handler"];

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Locator(#[from] LocatorError),

    #[error(transparent)]
    Runner(#[from] RunnerError),

    #[error(transparent)]
    Pty(#[from] PtyError),

    #[error(transparent)]
    Relay(#[from] RelayError),

    #[error(transparent)]
    WorkDir(#[from] WorkDirError),

    #[error("No FS-UAE build found in '{base}'")]
    BinaryNotFound { base: PathBuf },

    #[error("No standard FS-UAE install location known for this platform")]
    NoSystemBinary,
}

/// Which FS-UAE installation to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinarySource {
    /// The platform's standard install location.
    System,
    /// Newest matching build below the development directory.
    Dev,
    /// Newest matching build below the release directory.
    Release,
}

/// Resolve the binary directory for `source`.
pub fn resolve_binary_dir(
    store: &ConfigStore,
    source: BinarySource,
    version: Option<&str>,
    locator: &Locator,
) -> Result<PathBuf, AppError> {
    let base = match source {
        BinarySource::System => {
            return locator::default_binary_directory().ok_or(AppError::NoSystemBinary)
        }
        BinarySource::Dev => store.bin_dev_dir(),
        BinarySource::Release => store.bin_rel_dir(),
    };
    locator
        .find_binary_directory(&base, version)?
        .ok_or(AppError::BinaryNotFound { base })
}

/// Validate paths and return a ready runner.
pub fn prepare_runner(
    store: &ConfigStore,
    source: BinarySource,
    version: Option<&str>,
    span: &Span,
) -> Result<Runner, AppError> {
    let locator = Locator::new(span.clone());
    let bin_dir = resolve_binary_dir(store, source, version, &locator)?;
    let mut runner = Runner::new(span.clone());
    runner.setup(&bin_dir, &store.data_dir(), store.bin_name())?;
    Ok(runner)
}

/// Options of the interactive shell session.
#[derive(Debug, Clone, Default)]
pub struct ShellOptions {
    pub work_dir: PathBuf,
    pub wb_dir: Option<PathBuf>,
    pub reveal_banner: bool,
    pub stream_to_stdout: bool,
    pub extra_args: Vec<String>,
}

/// Lines of the mount list declaring the serial `AUX:` device.
pub fn aux_mountlist() -> Vec<String> {
    [
        "AUX:",
        "    Handler   = L:Aux-Handler",
        "    Stacksize = 1000",
        "    Priority  = 5",
        "#",
    ]
    .iter()
    .map(|l| l.to_string())
    .collect()
}

/// Emulator configuration pointing the serial port at `slave` and the
/// first hard drive at `fs_root`.
pub fn fsuae_config_lines(fs_root: &Path, slave: &Path) -> Vec<String> {
    vec![
        format!("hard_drive_0 = {}", fs_root.display()),
        format!("serial_port = {}", slave.display()),
    ]
}

/// Stage the work dir, start FS-UAE on a fresh pty and relay the serial
/// shell until it ends or the emulator quits. Returns the exit code.
pub fn run_shell(runner: &mut Runner, options: &ShellOptions, span: &Span) -> Result<i32, AppError> {
    let channel = PtyChannel::open(span.clone())?;

    let work_dir = WorkDir::new(&options.work_dir, span.clone())?;
    work_dir.create_dirs(ROOT_DIRS)?;
    if let Some(wb_dir) = &options.wb_dir {
        work_dir.copy_files(wb_dir, WB_FILES, false)?;
    }
    work_dir.create_mountlist(&aux_mountlist())?;
    work_dir.create_startup_sequence(&["Mount AUX:", "NewShell AUX:"])?;
    work_dir.create_shell_startup(&["Prompt \"%N.%S> \""])?;
    let cfg_file =
        work_dir.create_fsuae_config(&fsuae_config_lines(work_dir.fs_root(), channel.slave_path()))?;
    let cfg_file = cfg_file.display().to_string();

    runner.run_detached(&options.extra_args, Some(&cfg_file), options.stream_to_stdout)?;

    let reveal = options.reveal_banner;
    let outcome = {
        let config = RelayConfig::new(|| !runner.is_running()).with_first_line(move || reveal);
        let mut relay = TerminalRelay::new(channel, config, span.clone());
        relay.run()
    };

    let exit_code = runner.process().and_then(|p| p.exit_code());
    runner.terminate()?;

    match outcome? {
        RelayOutcome::SessionEnded { session_id } => {
            tracing::info!(parent: span, session_id, "shell session ended");
            Ok(0)
        }
        RelayOutcome::ExitRequested => {
            tracing::info!(parent: span, ?exit_code, "emulator exited");
            Ok(exit_code.unwrap_or(0))
        }
    }
}

/// Run FS-UAE in the foreground and map the result to an exit code.
pub fn run_foreground(
    runner: &mut Runner,
    config: Option<&str>,
    extra_args: &[String],
    stream_to_stdout: bool,
) -> Result<i32, AppError> {
    match runner.run_blocking(extra_args, config, stream_to_stdout)? {
        RunOutcome::Exited(code) => Ok(code),
        RunOutcome::Aborted => Ok(130),
    }
}
