use std::io;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

/// A launched FS-UAE process.
pub struct ProcessHandle {
    executable: PathBuf,
    args: Vec<String>,
    pid: u32,
    child: ChildProcess,
    exit_code: Option<i32>,
}

/// Either a plain child sharing our stdio or one attached to a pty slave.
pub(crate) enum ChildProcess {
    Plain(std::process::Child),
    Pty(Box<dyn portable_pty::Child + Send + Sync>),
}

impl ProcessHandle {
    pub(crate) fn new(command_line: &[String], pid: u32, child: ChildProcess) -> Self {
        let (executable, args) = match command_line.split_first() {
            Some((exe, args)) => (PathBuf::from(exe), args.to_vec()),
            None => (PathBuf::new(), Vec::new()),
        };
        Self {
            executable,
            args,
            pid,
            child,
            exit_code: None,
        }
    }

    pub fn executable(&self) -> &Path {
        &self.executable
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }

    pub fn pid(&self) -> u32 {
        self.pid
    }

    /// Exit code, once the process has been observed to exit.
    pub fn exit_code(&self) -> Option<i32> {
        self.exit_code
    }

    /// Non-blocking check whether the process has exited.
    pub fn try_wait(&mut self) -> io::Result<Option<i32>> {
        if self.exit_code.is_some() {
            return Ok(self.exit_code);
        }
        let code = match &mut self.child {
            ChildProcess::Plain(child) => child.try_wait()?.map(status_code),
            ChildProcess::Pty(child) => child.try_wait()?.map(|s| s.exit_code() as i32),
        };
        self.exit_code = code;
        Ok(code)
    }

    /// Ask the process to exit with SIGTERM.
    ///
    /// Pid 0 would address our own process group and is refused.
    pub fn request_termination(&self) -> io::Result<()> {
        let pid = libc::pid_t::try_from(self.pid)
            .ok()
            .filter(|pid| *pid > 0)
            .ok_or_else(|| {
                io::Error::new(
                    io::ErrorKind::InvalidInput,
                    format!("refusing to signal pid {}", self.pid),
                )
            })?;
        if unsafe { libc::kill(pid, libc::SIGTERM) } != 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(())
    }

    /// Poll until the process exits or `grace` elapses.
    pub fn wait_timeout(&mut self, grace: Duration) -> io::Result<Option<i32>> {
        let deadline = Instant::now() + grace;
        loop {
            if let Some(code) = self.try_wait()? {
                return Ok(Some(code));
            }
            if Instant::now() >= deadline {
                return Ok(None);
            }
            std::thread::sleep(Duration::from_millis(20));
        }
    }

    /// Kill the process outright and reap it.
    pub fn kill(&mut self) -> io::Result<()> {
        match &mut self.child {
            ChildProcess::Plain(child) => {
                child.kill()?;
                let status = child.wait()?;
                self.exit_code = Some(status_code(status));
            }
            ChildProcess::Pty(child) => {
                child.kill()?;
                let status = child.wait()?;
                self.exit_code = Some(status.exit_code() as i32);
            }
        }
        Ok(())
    }
}

/// Exit code of a plain child; signals map to the shell convention 128+N.
pub(crate) fn status_code(status: std::process::ExitStatus) -> i32 {
    use std::os::unix::process::ExitStatusExt;
    status
        .code()
        .or_else(|| status.signal().map(|sig| 128 + sig))
        .unwrap_or(1)
}
