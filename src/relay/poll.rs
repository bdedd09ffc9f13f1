use std::io;
use std::os::unix::io::RawFd;
use std::time::Duration;

/// Which of the two relay sources have data.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Readiness {
    pub local: bool,
    pub channel: bool,
}

/// Bounded readiness wait over the local input and the channel master.
///
/// Uses `select()`, which behaves the same for ttys on Linux and macOS.
pub struct Poller {
    timeout: Duration,
}

impl Poller {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Wait up to the timeout for either descriptor to become readable.
    ///
    /// `local` is `None` once the local input reached EOF. A signal
    /// interrupting the wait is reported as a timeout so the caller gets a
    /// chance to re-check its exit condition.
    ///
    /// Descriptors outside `0..FD_SETSIZE` cannot be watched and are an
    /// `InvalidInput` error.
    pub fn wait(&self, local: Option<RawFd>, channel: RawFd) -> io::Result<Readiness> {
        for fd in local.into_iter().chain([channel]) {
            if fd < 0 || fd as usize >= libc::FD_SETSIZE as usize {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidInput,
                    format!("descriptor {} is out of range for select()", fd),
                ));
            }
        }
        let nfds = local.map_or(channel, |fd| fd.max(channel)) + 1;
        unsafe {
            let mut read_fds: libc::fd_set = std::mem::zeroed();
            libc::FD_ZERO(&mut read_fds);
            libc::FD_SET(channel, &mut read_fds);
            if let Some(fd) = local {
                libc::FD_SET(fd, &mut read_fds);
            }

            let mut tv = libc::timeval {
                tv_sec: self.timeout.as_secs() as libc::time_t,
                tv_usec: self.timeout.subsec_micros() as libc::suseconds_t,
            };

            let ret = libc::select(
                nfds,
                &mut read_fds,
                std::ptr::null_mut(),
                std::ptr::null_mut(),
                &mut tv,
            );
            if ret < 0 {
                let err = io::Error::last_os_error();
                if err.kind() == io::ErrorKind::Interrupted {
                    return Ok(Readiness::default());
                }
                return Err(err);
            }
            if ret == 0 {
                return Ok(Readiness::default());
            }
            Ok(Readiness {
                local: local.is_some_and(|fd| libc::FD_ISSET(fd, &read_fds)),
                channel: libc::FD_ISSET(channel, &read_fds),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Poller, Readiness};
    use std::os::unix::io::RawFd;
    use std::time::{Duration, Instant};

    fn pipe() -> (libc::c_int, libc::c_int) {
        let mut fds = [0; 2];
        assert_eq!(unsafe { libc::pipe(fds.as_mut_ptr()) }, 0);
        (fds[0], fds[1])
    }

    #[test]
    fn idle_wait_returns_after_timeout() {
        let (rd, wr) = pipe();
        let poller = Poller::new(Duration::from_millis(30));
        let start = Instant::now();
        assert_eq!(poller.wait(None, rd).unwrap(), Readiness::default());
        assert!(start.elapsed() >= Duration::from_millis(25));
        unsafe {
            libc::close(rd);
            libc::close(wr);
        }
    }

    #[test]
    fn descriptors_beyond_fd_setsize_are_rejected() {
        let poller = Poller::new(Duration::from_millis(10));
        let too_big = libc::FD_SETSIZE as RawFd;
        assert_eq!(
            poller.wait(None, too_big).unwrap_err().kind(),
            std::io::ErrorKind::InvalidInput
        );
        assert_eq!(
            poller.wait(Some(too_big), 0).unwrap_err().kind(),
            std::io::ErrorKind::InvalidInput
        );
        assert!(poller.wait(None, -1).is_err());
    }

    #[test]
    fn reports_only_the_ready_source() {
        let (local_rd, local_wr) = pipe();
        let (chan_rd, chan_wr) = pipe();
        assert_eq!(unsafe { libc::write(chan_wr, b"x".as_ptr().cast(), 1) }, 1);

        let poller = Poller::new(Duration::from_millis(500));
        let ready = poller.wait(Some(local_rd), chan_rd).unwrap();
        assert!(ready.channel);
        assert!(!ready.local);

        for fd in [local_rd, local_wr, chan_rd, chan_wr] {
            unsafe { libc::close(fd) };
        }
    }
}
