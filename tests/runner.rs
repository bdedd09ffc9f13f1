mod common;

use common::Fixture;
use std::path::Path;
use tracing::Span;
use uae_shell::pty::PtyChannel;
use uae_shell::runner::{RunOutcome, Runner, RunnerError};

fn sh_runner(fixture: &Fixture) -> Runner {
    let mut runner = Runner::new(Span::none());
    runner
        .setup(Path::new("/bin"), &fixture.data_dir(), Some("sh"))
        .expect("/bin/sh should pass setup");
    runner
}

fn args(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

#[test]
fn missing_data_dir_is_reported_first() {
    let fixture = Fixture::new();
    let mut runner = Runner::new(Span::none());
    let data = fixture.dir.path().join("no-data");
    let bin = fixture.dir.path().join("no-bin");

    let err = runner.setup(&bin, &data, Some("fs-uae")).unwrap_err();
    assert!(matches!(err, RunnerError::MissingDataDirectory { path } if path == data));
    assert!(runner.binary().is_none());
}

#[test]
fn missing_bin_dir_is_reported() {
    let fixture = Fixture::new();
    let mut runner = Runner::new(Span::none());
    let bin = fixture.dir.path().join("no-bin");

    let err = runner
        .setup(&bin, &fixture.data_dir(), Some("fs-uae"))
        .unwrap_err();
    assert!(matches!(err, RunnerError::MissingBinaryDirectory { path } if path == bin));
}

#[test]
fn non_executable_binary_is_rejected() {
    let fixture = Fixture::new();
    let binary = fixture.binary("fs-uae", 0o644);
    let mut runner = Runner::new(Span::none());

    let err = runner
        .setup(&fixture.bin_dir(), &fixture.data_dir(), Some("fs-uae"))
        .unwrap_err();
    assert!(matches!(err, RunnerError::MissingExecutable { path } if path == binary));
}

#[test]
fn setup_caches_paths() {
    let fixture = Fixture::new();
    let binary = fixture.binary("fs-uae", 0o755);
    let mut runner = Runner::new(Span::none());

    runner
        .setup(&fixture.bin_dir(), &fixture.data_dir(), Some("fs-uae"))
        .unwrap();
    assert_eq!(runner.binary(), Some(binary.as_path()));
    assert_eq!(runner.data_dir(), Some(fixture.data_dir().as_path()));
}

#[cfg(target_os = "linux")]
#[test]
fn binary_name_defaults_per_platform() {
    let fixture = Fixture::new();
    let binary = fixture.binary("fs-uae", 0o755);
    let mut runner = Runner::new(Span::none());

    runner
        .setup(&fixture.bin_dir(), &fixture.data_dir(), None)
        .unwrap();
    assert_eq!(runner.binary(), Some(binary.as_path()));
}

#[test]
fn config_name_gets_extension_and_lookup_dir() {
    let fixture = Fixture::new();
    let expected = fixture.configuration("A500.fs-uae");
    let runner = sh_runner(&fixture);

    assert_eq!(runner.resolve_config_path(Some("A500")).unwrap(), Some(expected.clone()));
    assert_eq!(
        runner.resolve_config_path(Some("A500.fs-uae")).unwrap(),
        Some(expected)
    );
}

#[test]
fn absolute_config_path_is_used_as_is() {
    let fixture = Fixture::new();
    let config = fixture.dir.path().join("custom.fs-uae");
    std::fs::write(&config, "[config]\n").unwrap();
    let runner = sh_runner(&fixture);

    let name = config.display().to_string();
    assert_eq!(runner.resolve_config_path(Some(&name)).unwrap(), Some(config));
}

#[test]
fn missing_config_is_an_error() {
    let fixture = Fixture::new();
    let runner = sh_runner(&fixture);

    let err = runner.resolve_config_path(Some("nope")).unwrap_err();
    let expected = fixture
        .data_dir()
        .join("Configurations")
        .join("nope.fs-uae");
    assert!(matches!(err, RunnerError::MissingConfigFile { path } if path == expected));
}

#[test]
fn no_config_resolves_to_none() {
    let fixture = Fixture::new();
    let runner = sh_runner(&fixture);
    assert_eq!(runner.resolve_config_path(None).unwrap(), None);
}

#[test]
fn command_line_order() {
    let fixture = Fixture::new();
    let config = fixture.configuration("A1200.fs-uae");
    let runner = sh_runner(&fixture);

    let cmd = runner
        .build_command_line(&args(&["--fullscreen", "-x"]), Some("A1200"), true)
        .unwrap();
    assert_eq!(
        cmd,
        vec![
            "/bin/sh".to_string(),
            "--stdout".to_string(),
            "--fullscreen".to_string(),
            "-x".to_string(),
            config.display().to_string(),
        ]
    );

    let bare = runner.build_command_line(&[], None, false).unwrap();
    assert_eq!(bare, vec!["/bin/sh".to_string()]);
}

#[test]
fn unconfigured_runner_refuses_to_build_commands() {
    let runner = Runner::new(Span::none());
    assert!(matches!(
        runner.build_command_line(&[], None, false),
        Err(RunnerError::NotSetUp)
    ));
}

#[test]
fn blocking_run_reports_exit_code() {
    let fixture = Fixture::new();
    let mut runner = sh_runner(&fixture);

    let outcome = runner
        .run_blocking(&args(&["-c", "exit 3"]), None, false)
        .unwrap();
    assert_eq!(outcome, RunOutcome::Exited(3));
}

#[test]
fn terminate_without_process_is_a_noop() {
    let mut runner = Runner::new(Span::none());
    assert!(!runner.is_running());
    assert!(!runner.terminate().unwrap());
}

#[test]
fn detached_process_can_be_terminated_once() {
    let fixture = Fixture::new();
    let mut runner = sh_runner(&fixture);

    let pid = runner
        .run_detached(&args(&["-c", "exec sleep 30"]), None, false)
        .unwrap()
        .pid();
    assert!(pid > 0);
    assert!(runner.is_running());

    assert!(runner.terminate().unwrap());
    assert!(!runner.is_running());
    assert!(!runner.terminate().unwrap());
}

#[test]
fn exited_process_is_not_terminated() {
    let fixture = Fixture::new();
    let mut runner = sh_runner(&fixture);

    runner
        .run_detached(&args(&["-c", "exit 0"]), None, false)
        .unwrap();
    let deadline = std::time::Instant::now() + std::time::Duration::from_secs(10);
    while runner.is_running() && std::time::Instant::now() < deadline {
        std::thread::sleep(std::time::Duration::from_millis(20));
    }
    assert!(!runner.is_running());
    assert_eq!(runner.process().and_then(|p| p.exit_code()), Some(0));
    assert!(!runner.terminate().unwrap());
}

#[test]
fn attached_process_writes_to_the_channel() {
    let fixture = Fixture::new();
    let mut runner = sh_runner(&fixture);
    let mut channel = PtyChannel::open(Span::none()).unwrap();

    runner
        .run_attached(&channel, &args(&["-c", "printf ready"]), None, false)
        .unwrap();

    let mut received = String::new();
    while !received.contains("ready") {
        let chunk = channel.read(64).unwrap();
        assert!(!chunk.is_empty(), "channel closed before output arrived");
        received.push_str(&chunk);
    }
    runner.terminate().unwrap();
}
