use anyhow::Context;
use clap::Parser;
use uae_shell::app::{self, ShellOptions};
use uae_shell::cli::{Cli, Command};
use uae_shell::config::ConfigStore;
use uae_shell::locator::Locator;
use uae_shell::logging::init_tracing;

fn main() {
    let cli = Cli::parse();
    match run(cli) {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("Error: {:#}", err);
            std::process::exit(1);
        }
    }
}

fn run(cli: Cli) -> anyhow::Result<i32> {
    init_tracing(&cli.log_options()).context("failed to set up logging")?;
    let span = tracing::info_span!("uae-shell");

    let mut store = ConfigStore::open(cli.config_file.as_deref())?;
    tracing::info!(parent: &span, "config: '{}'", store.path().display());
    store.apply(cli.overrides());
    let source = cli.binary_source();
    let version = cli.fs_uae_version.as_deref();

    match cli.command {
        Command::Locate => {
            let locator = Locator::new(span.clone());
            let dir = app::resolve_binary_dir(&store, source, version, &locator)?;
            println!("{}", dir.display());
            Ok(0)
        }
        Command::Run {
            config,
            stdout,
            extra,
        } => {
            let mut runner = app::prepare_runner(&store, source, version, &span)?;
            let code = app::run_foreground(&mut runner, config.as_deref(), &extra, stdout)?;
            Ok(code)
        }
        Command::Shell {
            work_dir,
            wb_dir,
            reveal_banner,
            stdout,
            extra,
        } => {
            let mut runner = app::prepare_runner(&store, source, version, &span)?;
            let options = ShellOptions {
                work_dir,
                wb_dir,
                reveal_banner,
                stream_to_stdout: stdout,
                extra_args: extra,
            };
            let code = app::run_shell(&mut runner, &options, &span)
                .context("shell session failed")?;
            Ok(code)
        }
    }
}
