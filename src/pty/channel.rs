use crate::pty::codec;
use crate::pty::error::PtyError;
use crate::pty::termios;
use portable_pty::{native_pty_system, Child, CommandBuilder, MasterPty, PtySize, SlavePty};
use std::fs::{File, OpenOptions};
use std::io::{Read, Write};
use std::os::unix::fs::OpenOptionsExt;
use std::os::unix::io::{AsRawFd, RawFd};
use std::path::{Path, PathBuf};
use tracing::Span;

/// One master/slave pseudoterminal pair for a single session.
///
/// The relay reads and writes the master side. The slave side is either
/// handed to a child as its controlling terminal (`spawn`) or passed to the
/// controlled program by path (`slave_path`). The slave is kept open for the
/// channel's lifetime so the master never reports EOF while the program
/// reopens the device.
pub struct PtyChannel {
    span: Span,
    master_fd: RawFd,
    slave_path: PathBuf,
    endpoints: Option<Endpoints>,
}

struct Endpoints {
    // Held only to keep the master descriptor alive.
    _master: Box<dyn MasterPty + Send>,
    reader: Box<dyn Read + Send>,
    writer: Box<dyn Write + Send>,
    slave: Box<dyn SlavePty + Send>,
    // Held only to keep the slave device open.
    _slave_file: File,
}

impl PtyChannel {
    /// Allocate a new pair and put its slave side into raw mode.
    pub fn open(span: Span) -> Result<Self, PtyError> {
        let pty_system = native_pty_system();
        let pair = pty_system
            .openpty(PtySize {
                rows: 24,
                cols: 80,
                pixel_width: 0,
                pixel_height: 0,
            })
            .map_err(|err| PtyError::Allocation {
                reason: err.to_string(),
            })?;

        let master_fd = pair.master.as_raw_fd().ok_or_else(|| PtyError::Allocation {
            reason: "master side has no file descriptor".to_string(),
        })?;
        let slave_path = pair.master.tty_name().ok_or_else(|| PtyError::Allocation {
            reason: "slave side has no device path".to_string(),
        })?;

        let slave_file = OpenOptions::new()
            .read(true)
            .write(true)
            .custom_flags(libc::O_NOCTTY)
            .open(&slave_path)
            .map_err(|source| PtyError::RawMode {
                path: slave_path.clone(),
                source,
            })?;
        termios::set_raw(slave_file.as_raw_fd()).map_err(|source| PtyError::RawMode {
            path: slave_path.clone(),
            source,
        })?;

        let reader = pair
            .master
            .try_clone_reader()
            .map_err(|err| PtyError::Allocation {
                reason: err.to_string(),
            })?;
        let writer = pair.master.take_writer().map_err(|err| PtyError::Allocation {
            reason: err.to_string(),
        })?;

        tracing::debug!(parent: &span, slave = %slave_path.display(), master_fd, "pty opened");

        Ok(Self {
            span,
            master_fd,
            slave_path,
            endpoints: Some(Endpoints {
                _master: pair.master,
                reader,
                writer,
                slave: pair.slave,
                _slave_file: slave_file,
            }),
        })
    }

    /// Device path of the slave side, e.g. `/dev/pts/3`.
    pub fn slave_path(&self) -> &Path {
        &self.slave_path
    }

    /// Master descriptor, for use in a readiness wait.
    pub fn descriptor(&self) -> RawFd {
        self.master_fd
    }

    pub fn is_closed(&self) -> bool {
        self.endpoints.is_none()
    }

    /// Read up to `max_bytes` from the master side.
    ///
    /// Blocks until at least one byte is available, so only call this after
    /// a readiness wait reported the descriptor as readable. An empty string
    /// means the slave side reported EOF.
    pub fn read(&mut self, max_bytes: usize) -> Result<String, PtyError> {
        let endpoints = self.endpoints.as_mut().ok_or(PtyError::Closed)?;
        let mut buf = vec![0u8; max_bytes.max(1)];
        let count = endpoints.reader.read(&mut buf)?;
        Ok(codec::decode(&buf[..count]))
    }

    /// Write `text` to the master side, retrying partial writes until every
    /// byte is flushed.
    pub fn write(&mut self, text: &str) -> Result<(), PtyError> {
        let endpoints = self.endpoints.as_mut().ok_or(PtyError::Closed)?;
        let bytes = codec::encode(text)?;
        endpoints.writer.write_all(&bytes)?;
        endpoints.writer.flush()?;
        Ok(())
    }

    /// Launch `argv` with the slave side as its controlling terminal.
    pub fn spawn(&self, argv: &[String]) -> Result<Box<dyn Child + Send + Sync>, PtyError> {
        let endpoints = self.endpoints.as_ref().ok_or(PtyError::Closed)?;
        let Some((program, args)) = argv.split_first() else {
            return Err(PtyError::Spawn {
                command: String::new(),
                reason: "empty command line".to_string(),
            });
        };

        let mut cmd = CommandBuilder::new(program);
        cmd.args(args);
        cmd.cwd(std::env::current_dir()?);

        let child = endpoints
            .slave
            .spawn_command(cmd)
            .map_err(|err| PtyError::Spawn {
                command: program.clone(),
                reason: err.to_string(),
            })?;
        tracing::debug!(parent: &self.span, command = %program, pid = ?child.process_id(), "spawned on pty");
        Ok(child)
    }

    /// Release both descriptors.
    ///
    /// Returns `false` if the channel was already closed.
    pub fn close(&mut self) -> bool {
        match self.endpoints.take() {
            Some(endpoints) => {
                drop(endpoints);
                tracing::debug!(parent: &self.span, slave = %self.slave_path.display(), "pty closed");
                true
            }
            None => {
                tracing::trace!(parent: &self.span, "pty already closed");
                false
            }
        }
    }
}

impl Drop for PtyChannel {
    fn drop(&mut self) {
        self.close();
    }
}
