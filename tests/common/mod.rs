//! Shared test utilities.

#![allow(dead_code)]

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::os::unix::fs::PermissionsExt;
use std::os::unix::io::FromRawFd;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant, SystemTime};
use tempfile::TempDir;

/// Directory layout for runner tests: `data/Configurations` and `bin/`.
pub struct Fixture {
    pub dir: TempDir,
}

impl Fixture {
    pub fn new() -> Self {
        let dir = TempDir::new().expect("Failed to create temp dir");
        std::fs::create_dir_all(dir.path().join("data").join("Configurations")).unwrap();
        std::fs::create_dir_all(dir.path().join("bin")).unwrap();
        Self { dir }
    }

    pub fn data_dir(&self) -> PathBuf {
        self.dir.path().join("data")
    }

    pub fn bin_dir(&self) -> PathBuf {
        self.dir.path().join("bin")
    }

    /// Create `bin/<name>` with the given mode.
    pub fn binary(&self, name: &str, mode: u32) -> PathBuf {
        let path = self.bin_dir().join(name);
        std::fs::write(&path, "#!/bin/sh\nexit 0\n").unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(mode)).unwrap();
        path
    }

    /// Create `data/Configurations/<file>`.
    pub fn configuration(&self, file: &str) -> PathBuf {
        let path = self.data_dir().join("Configurations").join(file);
        std::fs::write(&path, "[config]\n").unwrap();
        path
    }
}

/// Create a build directory and set its modification time.
pub fn make_build(dir: &Path, name: &str, modified: SystemTime) -> PathBuf {
    let path = dir.join(name);
    std::fs::create_dir_all(&path).unwrap();
    File::open(&path).unwrap().set_modified(modified).unwrap();
    path
}

/// Open the slave side of a channel for writing, as the emulator would.
pub fn open_slave(path: &Path) -> File {
    OpenOptions::new()
        .read(true)
        .write(true)
        .open(path)
        .expect("Failed to open pty slave")
}

/// An anonymous pipe as `(reader, writer)`.
pub fn pipe() -> (File, File) {
    let mut fds = [0; 2];
    assert_eq!(unsafe { libc::pipe(fds.as_mut_ptr()) }, 0);
    unsafe { (File::from_raw_fd(fds[0]), File::from_raw_fd(fds[1])) }
}

/// Exit predicate that fires after `polls` calls, with a hard deadline so a
/// broken relay cannot hang the test run.
pub fn exit_after(polls: usize) -> impl FnMut() -> bool {
    let deadline = Instant::now() + Duration::from_secs(10);
    let mut seen = 0;
    move || {
        seen += 1;
        seen > polls || Instant::now() > deadline
    }
}

/// Exit predicate that only fires at the hard deadline.
pub fn never_exit() -> impl FnMut() -> bool {
    let deadline = Instant::now() + Duration::from_secs(10);
    move || Instant::now() > deadline
}

pub fn write_all(file: &mut File, bytes: &[u8]) {
    file.write_all(bytes).unwrap();
    file.flush().unwrap();
}
