//! Ctrl-C handling of blocking runs.
//!
//! Kept in its own test binary: SIGINT is process-wide and would leak into
//! other blocking runs executing in parallel.

use std::path::Path;
use tempfile::TempDir;
use tracing::Span;
use uae_shell::runner::{RunOutcome, Runner};

fn args(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

#[test]
fn interrupt_is_reported_as_abort_even_if_the_child_already_died() {
    let data = TempDir::new().unwrap();
    let mut runner = Runner::new(Span::none());
    runner
        .setup(Path::new("/bin"), data.path(), Some("sh"))
        .unwrap();

    // The child interrupts us and exits like a process killed by Ctrl-C.
    let outcome = runner
        .run_blocking(
            &args(&["-c", "sleep 0.2; kill -INT $PPID; exit 130"]),
            None,
            false,
        )
        .unwrap();
    assert_eq!(outcome, RunOutcome::Aborted);

    // A still running child is stopped.
    let outcome = runner
        .run_blocking(&args(&["-c", "kill -INT $PPID; exec sleep 30"]), None, false)
        .unwrap();
    assert_eq!(outcome, RunOutcome::Aborted);

    // The flag does not carry over into the next run.
    let outcome = runner
        .run_blocking(&args(&["-c", "exit 2"]), None, false)
        .unwrap();
    assert_eq!(outcome, RunOutcome::Exited(2));
}
