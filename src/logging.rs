use std::path::PathBuf;
use std::sync::Mutex;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Environment variable holding an `EnvFilter` directive that overrides
/// the level chosen from the command line.
pub const LOG_ENV: &str = "UAE_SHELL_LOG";

/// Logging choices from the command line.
#[derive(Debug, Clone, Default)]
pub struct LogOptions {
    pub verbose: u8,
    pub quiet: bool,
    pub log_file: Option<PathBuf>,
}

impl LogOptions {
    /// Quiet silences everything, a log file gets full debug output,
    /// otherwise each `-v` raises the level from `warn`.
    pub fn level(&self) -> LevelFilter {
        if self.quiet {
            LevelFilter::OFF
        } else if self.log_file.is_some() {
            LevelFilter::DEBUG
        } else {
            match self.verbose {
                0 => LevelFilter::WARN,
                1 => LevelFilter::INFO,
                _ => LevelFilter::DEBUG,
            }
        }
    }
}

/// Initialize tracing for the process.
///
/// Events go to the log file when one is given, else to stderr. Nothing is
/// installed in quiet mode.
pub fn init_tracing(options: &LogOptions) -> std::io::Result<()> {
    let level = options.level();
    if level == LevelFilter::OFF {
        return Ok(());
    }

    let filter = EnvFilter::try_from_env(LOG_ENV)
        .unwrap_or_else(|_| EnvFilter::new(level.to_string().to_lowercase()));

    let file_layer = match &options.log_file {
        Some(path) => {
            let file = std::fs::File::create(path)?;
            Some(
                fmt::layer()
                    .with_writer(Mutex::new(file))
                    .with_ansi(false)
                    .with_target(true)
                    .with_level(true)
                    .with_timer(fmt::time::UtcTime::rfc_3339()),
            )
        }
        None => None,
    };
    let stderr_layer = if file_layer.is_none() {
        Some(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_timer(fmt::time::UtcTime::rfc_3339()),
        )
    } else {
        None
    };

    // A subscriber may already be installed (tests); keep it.
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(file_layer)
        .with(stderr_layer)
        .try_init();
    Ok(())
}
