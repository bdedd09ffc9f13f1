//! Terminal relay between the operator's terminal and the emulated shell.
//!
//! A single-threaded loop waits on two sources, the local input and the
//! pty master, with a bounded timeout. Channel output runs through the
//! [`SessionDetector`]; local keystrokes are forwarded unbuffered.

mod detector;
mod poll;

pub use detector::{SessionDetector, SessionMarkers, Step, BACKSPACE, DELETE};
pub use poll::{Poller, Readiness};

use crate::pty::{codec, PtyChannel, PtyError};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use std::fs::File;
use std::io::{self, Read, Write};
use std::os::unix::io::{AsRawFd, FromRawFd};
use std::time::Duration;
use thiserror::Error;
use tracing::Span;

/// Default bound on a single readiness wait.
pub const POLL_TIMEOUT: Duration = Duration::from_millis(500);

/// Upper bound on bytes taken from one source per wake-up.
const READ_CHUNK: usize = 1024;

#[derive(Debug, Error)]
pub enum RelayError {
    #[error("Failed to switch the local terminal to raw mode: {0}")]
    RawMode(#[source] io::Error),

    #[error("Readiness wait failed: {0}")]
    Poll(#[source] io::Error),

    #[error("Failed to read local input: {0}")]
    LocalRead(#[source] io::Error),

    #[error("Failed to write to the local terminal: {0}")]
    LocalWrite(#[source] io::Error),

    #[error("Failed to read from the shell: {0}")]
    ChannelRead(#[source] PtyError),

    #[error("Failed to write to the shell: {0}")]
    ChannelWrite(#[source] PtyError),
}

/// How a relay session finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayOutcome {
    /// The shell printed the footer for this session.
    SessionEnded { session_id: u32 },
    /// The exit predicate fired, e.g. because the emulator quit.
    ExitRequested,
}

/// Relay settings and callbacks.
pub struct RelayConfig<'a> {
    pub markers: SessionMarkers,
    /// Runs once at the first completed line; `true` reveals that line.
    pub first_line: Option<Box<dyn FnMut() -> bool + 'a>>,
    /// Polled every cycle; `true` stops the relay.
    pub should_exit: Box<dyn FnMut() -> bool + 'a>,
    /// Mirror channel output before the session header is seen.
    pub mirror_from_start: bool,
    pub poll_timeout: Duration,
}

impl<'a> RelayConfig<'a> {
    pub fn new(should_exit: impl FnMut() -> bool + 'a) -> Self {
        Self {
            markers: SessionMarkers::default(),
            first_line: None,
            should_exit: Box::new(should_exit),
            mirror_from_start: false,
            poll_timeout: POLL_TIMEOUT,
        }
    }

    pub fn with_first_line(mut self, first_line: impl FnMut() -> bool + 'a) -> Self {
        self.first_line = Some(Box::new(first_line));
        self
    }

    pub fn with_markers(mut self, markers: SessionMarkers) -> Self {
        self.markers = markers;
        self
    }

    pub fn with_poll_timeout(mut self, timeout: Duration) -> Self {
        self.poll_timeout = timeout;
        self
    }

    pub fn mirror_from_start(mut self, mirror: bool) -> Self {
        self.mirror_from_start = mirror;
        self
    }
}

/// Owns the channel and the local terminal for one shell session.
pub struct TerminalRelay<'a> {
    span: Span,
    channel: PtyChannel,
    detector: SessionDetector,
    first_line: Option<Box<dyn FnMut() -> bool + 'a>>,
    should_exit: Box<dyn FnMut() -> bool + 'a>,
    poller: Poller,
}

impl<'a> TerminalRelay<'a> {
    pub fn new(channel: PtyChannel, config: RelayConfig<'a>, span: Span) -> Self {
        Self {
            span,
            channel,
            detector: SessionDetector::new(config.markers, config.mirror_from_start),
            first_line: config.first_line,
            should_exit: config.should_exit,
            poller: Poller::new(config.poll_timeout),
        }
    }

    pub fn session_id(&self) -> Option<u32> {
        self.detector.session_id()
    }

    /// Relay between this process's stdin/stdout and the channel.
    ///
    /// The local terminal is in raw mode for the duration of the call and
    /// restored on every return path.
    pub fn run(&mut self) -> Result<RelayOutcome, RelayError> {
        let mut local = dup_stdin().map_err(RelayError::LocalRead)?;
        let _raw = RawModeGuard::new().map_err(RelayError::RawMode)?;
        let mut out = io::stdout().lock();
        let outcome = self.run_with(Some(&mut local), &mut out);
        // Leave the cursor at the start of a fresh line after raw output.
        let _ = out.write_all(b"\r\n");
        let _ = out.flush();
        outcome
    }

    /// Relay between `local`/`out` and the channel.
    ///
    /// `local` is read only after the poller reported it readable; pass
    /// `None` to relay channel output only.
    pub fn run_with<R, W>(
        &mut self,
        mut local: Option<&mut R>,
        out: &mut W,
    ) -> Result<RelayOutcome, RelayError>
    where
        R: Read + AsRawFd,
        W: Write,
    {
        tracing::info!(parent: &self.span, slave = %self.channel.slave_path().display(), "relay started");
        self.detector.reset();
        let mut buf = [0u8; READ_CHUNK];
        loop {
            if (self.should_exit)() {
                tracing::info!(parent: &self.span, "exit requested, stopping relay");
                return Ok(RelayOutcome::ExitRequested);
            }

            let local_fd = local.as_ref().map(|r| r.as_raw_fd());
            let ready = self
                .poller
                .wait(local_fd, self.channel.descriptor())
                .map_err(RelayError::Poll)?;

            if ready.channel {
                if let Some(outcome) = self.pump_channel(out)? {
                    return Ok(outcome);
                }
            }

            if ready.local {
                if let Some(reader) = local.as_mut() {
                    let count = reader.read(&mut buf).map_err(RelayError::LocalRead)?;
                    if count == 0 {
                        tracing::debug!(parent: &self.span, "local input closed");
                        local = None;
                    } else {
                        self.forward_local(&buf[..count])?;
                    }
                }
            }
        }
    }

    fn pump_channel<W: Write>(&mut self, out: &mut W) -> Result<Option<RelayOutcome>, RelayError> {
        let text = match self.channel.read(READ_CHUNK) {
            Ok(text) => text,
            Err(PtyError::Io(err)) if err.raw_os_error() == Some(libc::EIO) => String::new(),
            Err(err) => return Err(RelayError::ChannelRead(err)),
        };
        if text.is_empty() {
            // EOF may be transient while the emulator (re)opens its serial
            // device; keep waiting on the exit predicate instead.
            tracing::debug!(parent: &self.span, "channel reported EOF");
            std::thread::sleep(self.poller.timeout());
            return Ok(None);
        }

        let first_line = &mut self.first_line;
        let mut on_first_line = || first_line.as_mut().is_some_and(|cb| cb());
        for c in text.chars() {
            let step = self.detector.feed(c, &mut on_first_line);
            if step.echo {
                let mut utf8 = [0u8; 4];
                let byte = codec::encode(c.encode_utf8(&mut utf8)).map_err(RelayError::LocalWrite)?;
                out.write_all(&byte).map_err(RelayError::LocalWrite)?;
                out.flush().map_err(RelayError::LocalWrite)?;
            }
            if let Some(line) = step.reveal {
                let mut bytes = codec::encode(&line).map_err(RelayError::LocalWrite)?;
                bytes.push(b'\n');
                out.write_all(&bytes).map_err(RelayError::LocalWrite)?;
                out.flush().map_err(RelayError::LocalWrite)?;
            }
            if step.ended {
                let session_id = self.detector.session_id().unwrap_or_default();
                tracing::info!(parent: &self.span, session_id, "session footer seen");
                return Ok(Some(RelayOutcome::SessionEnded { session_id }));
            }
        }
        Ok(None)
    }

    fn forward_local(&mut self, bytes: &[u8]) -> Result<(), RelayError> {
        let text: String = codec::decode(bytes)
            .chars()
            .map(|c| if c == DELETE { BACKSPACE } else { c })
            .collect();
        self.channel.write(&text).map_err(RelayError::ChannelWrite)
    }
}

/// Restores the local terminal mode on drop.
struct RawModeGuard;

impl RawModeGuard {
    fn new() -> io::Result<Self> {
        enable_raw_mode()?;
        Ok(Self)
    }
}

impl Drop for RawModeGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
    }
}

/// Private handle on stdin that bypasses the std buffered reader, so data
/// the poller sees is never stuck in a userspace buffer.
fn dup_stdin() -> io::Result<File> {
    let fd = unsafe { libc::dup(libc::STDIN_FILENO) };
    if fd < 0 {
        return Err(io::Error::last_os_error());
    }
    unsafe {
        libc::fcntl(fd, libc::F_SETFD, libc::FD_CLOEXEC);
    }
    Ok(unsafe { File::from_raw_fd(fd) })
}
