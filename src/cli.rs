use crate::app::BinarySource;
use crate::config::Overrides;
use crate::logging::LogOptions;
use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;

/// Run FS-UAE and talk to its Amiga shell from this terminal.
#[derive(Debug, Parser)]
#[command(name = "uae-shell")]
pub struct Cli {
    /// Be more verbose (repeat for more)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Be totally quiet
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Write tool output to a log file
    #[arg(short = 'L', long, global = true)]
    pub log_file: Option<PathBuf>,

    /// Path of the configuration file
    #[arg(short = 'C', long)]
    pub config_file: Option<PathBuf>,

    /// Use the development binary (otherwise release)
    #[arg(short = 'd', long, conflicts_with = "sys_binary")]
    pub dev_binary: bool,

    /// Use the system-wide binary
    #[arg(short = 's', long)]
    pub sys_binary: bool,

    /// Select the FS-UAE version to run
    #[arg(short = 'V', long)]
    pub fs_uae_version: Option<String>,

    /// FS-UAE data directory, e.g. ~/Documents/FS-UAE
    #[arg(short = 'F', long)]
    pub data_dir: Option<String>,

    /// FS-UAE binary directory of development builds
    #[arg(short = 'D', long)]
    pub bin_dev_dir: Option<String>,

    /// FS-UAE binary directory of release builds
    #[arg(short = 'R', long)]
    pub bin_rel_dir: Option<String>,

    /// FS-UAE executable name inside the binary directory
    #[arg(short = 'B', long)]
    pub bin_name: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run FS-UAE in the foreground and exit with its exit code
    Run {
        /// Configuration name or path (".fs-uae" is optional)
        config: Option<String>,

        /// Let FS-UAE log to stdout
        #[arg(long)]
        stdout: bool,

        /// Extra arguments passed to FS-UAE
        #[arg(last = true)]
        extra: Vec<String>,
    },

    /// Start FS-UAE with a serial shell and relay it to this terminal
    Shell {
        /// Working directory for the staged root volume and config
        #[arg(short = 'w', long)]
        work_dir: PathBuf,

        /// Workbench directory to copy shell commands from
        #[arg(long)]
        wb_dir: Option<PathBuf>,

        /// Show the first line printed on the serial port
        #[arg(long)]
        reveal_banner: bool,

        /// Let FS-UAE log to stdout
        #[arg(long)]
        stdout: bool,

        /// Extra arguments passed to FS-UAE
        #[arg(last = true)]
        extra: Vec<String>,
    },

    /// Print the resolved FS-UAE binary directory
    Locate,
}

impl Cli {
    pub fn log_options(&self) -> LogOptions {
        LogOptions {
            verbose: self.verbose,
            quiet: self.quiet,
            log_file: self.log_file.clone(),
        }
    }

    pub fn overrides(&self) -> Overrides {
        Overrides {
            data_dir: self.data_dir.clone(),
            bin_dev_dir: self.bin_dev_dir.clone(),
            bin_rel_dir: self.bin_rel_dir.clone(),
            bin_name: self.bin_name.clone(),
        }
    }

    pub fn binary_source(&self) -> BinarySource {
        if self.sys_binary {
            BinarySource::System
        } else if self.dev_binary {
            BinarySource::Dev
        } else {
            BinarySource::Release
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Cli, Command};
    use crate::app::BinarySource;
    use clap::Parser;

    #[test]
    fn run_collects_extra_args_after_separator() {
        let cli = Cli::try_parse_from([
            "uae-shell", "-vv", "run", "a500", "--stdout", "--", "--fullscreen", "-x",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 2);
        match cli.command {
            Command::Run {
                config,
                stdout,
                extra,
            } => {
                assert_eq!(config.as_deref(), Some("a500"));
                assert!(stdout);
                assert_eq!(extra, vec!["--fullscreen", "-x"]);
            }
            other => panic!("expected run, got {other:?}"),
        }
    }

    #[test]
    fn version_flag_selects_fs_uae_version() {
        let cli = Cli::try_parse_from(["uae-shell", "-d", "-V", "2.1", "locate"]).unwrap();
        assert_eq!(cli.fs_uae_version.as_deref(), Some("2.1"));
        assert_eq!(cli.binary_source(), BinarySource::Dev);
    }

    #[test]
    fn dev_and_sys_binary_conflict() {
        assert!(Cli::try_parse_from(["uae-shell", "-d", "-s", "locate"]).is_err());
    }

    #[test]
    fn release_is_the_default_source() {
        let cli = Cli::try_parse_from(["uae-shell", "locate"]).unwrap();
        assert_eq!(cli.binary_source(), BinarySource::Release);
    }

    #[test]
    fn shell_requires_work_dir() {
        assert!(Cli::try_parse_from(["uae-shell", "shell"]).is_err());
        let cli = Cli::try_parse_from(["uae-shell", "shell", "-w", "/tmp/wd", "-q"]).unwrap();
        assert!(cli.quiet);
        assert!(matches!(cli.command, Command::Shell { .. }));
    }
}
