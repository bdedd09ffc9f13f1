mod common;

use common::Fixture;
use std::process::Command;

fn uae_shell() -> Command {
    Command::new(env!("CARGO_BIN_EXE_uae-shell"))
}

#[test]
fn help_lists_subcommands() {
    let output = uae_shell().arg("--help").output().unwrap();
    assert!(output.status.success());
    let text = String::from_utf8_lossy(&output.stdout);
    for name in ["run", "shell", "locate"] {
        assert!(text.contains(name), "help does not mention '{name}'");
    }
}

#[test]
fn missing_data_dir_fails_with_message() {
    let fixture = Fixture::new();
    let config = fixture.dir.path().join("none.toml");
    let output = uae_shell()
        .args(["-q", "-s", "-F"])
        .arg(fixture.dir.path().join("no-data"))
        .arg("-C")
        .arg(&config)
        .arg("run")
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("data directory not found"), "stderr: {stderr}");
}

#[test]
fn locate_prints_newest_build() {
    let fixture = Fixture::new();
    let config = fixture.dir.path().join("none.toml");
    let arch = uae_shell::locator::Arch::current();
    let platform = uae_shell::locator::Platform::current();
    let (Some(arch), Some(platform)) = (arch, platform) else {
        return;
    };
    let name = format!("fs-uae_9.9.9_{}_{}", platform.as_str(), arch.as_str());
    let build = fixture.bin_dir().join(&name);
    std::fs::create_dir_all(&build).unwrap();

    let output = uae_shell()
        .args(["-q", "-C"])
        .arg(&config)
        .arg("-R")
        .arg(fixture.bin_dir())
        .arg("locate")
        .output()
        .unwrap();

    assert!(output.status.success());
    assert_eq!(
        String::from_utf8_lossy(&output.stdout).trim(),
        build.display().to_string()
    );
}

#[test]
fn locate_without_builds_fails() {
    let fixture = Fixture::new();
    let config = fixture.dir.path().join("none.toml");
    let output = uae_shell()
        .args(["-q", "-C"])
        .arg(&config)
        .arg("-D")
        .arg(fixture.bin_dir())
        .args(["-d", "locate"])
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("No FS-UAE build found"));
}

#[test]
fn run_exits_with_the_emulator_code() {
    let fixture = Fixture::new();
    let config = fixture.dir.path().join("none.toml");
    let sh_build = fixture.dir.path().join("sh-build");
    std::fs::create_dir_all(&sh_build).unwrap();
    let arch = uae_shell::locator::Arch::current();
    let platform = uae_shell::locator::Platform::current();
    let (Some(arch), Some(platform)) = (arch, platform) else {
        return;
    };
    let build = sh_build.join(format!("fs-uae_1.0_{}_{}", platform.as_str(), arch.as_str()));
    std::fs::create_dir_all(&build).unwrap();
    std::os::unix::fs::symlink("/bin/sh", build.join("sh")).unwrap();

    let output = uae_shell()
        .args(["-q", "-C"])
        .arg(&config)
        .arg("-F")
        .arg(fixture.data_dir())
        .arg("-R")
        .arg(&sh_build)
        .args(["-B", "sh", "run", "--", "-c", "exit 4"])
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(4));
}
