use std::io;
use std::os::unix::io::RawFd;

/// Put the terminal behind `fd` into raw mode.
///
/// Clears canonical input, echo, signal generation and output
/// post-processing so every byte passes through untouched.
pub fn set_raw(fd: RawFd) -> io::Result<()> {
    unsafe {
        let mut attrs: libc::termios = std::mem::zeroed();
        if libc::tcgetattr(fd, &mut attrs) != 0 {
            return Err(io::Error::last_os_error());
        }
        libc::cfmakeraw(&mut attrs);
        if libc::tcsetattr(fd, libc::TCSANOW, &attrs) != 0 {
            return Err(io::Error::last_os_error());
        }
    }
    Ok(())
}

/// Whether canonical mode and echo are both off for `fd`.
pub fn is_raw(fd: RawFd) -> io::Result<bool> {
    unsafe {
        let mut attrs: libc::termios = std::mem::zeroed();
        if libc::tcgetattr(fd, &mut attrs) != 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(attrs.c_lflag & (libc::ICANON | libc::ECHO | libc::ISIG) == 0)
    }
}
