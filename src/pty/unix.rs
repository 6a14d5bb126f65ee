//! Unix PTY implementation
//!
//! Implements PTY creation and child process management using POSIX APIs.
//! The master side is kept blocking; readers wait on it with `poll` so a
//! read can time out without spinning.

use std::convert::Infallible;
use std::ffi::CString;
use std::fs::File;
use std::io::{self, ErrorKind, Read};
use std::os::fd::{AsRawFd, FromRawFd, IntoRawFd, OwnedFd, RawFd};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use nix::errno::Errno;
use nix::fcntl::{open, OFlag};
use nix::libc::{self, STDERR_FILENO, STDIN_FILENO, STDOUT_FILENO};
use nix::poll::{poll, PollFd, PollFlags};
use nix::pty::{grantpt, posix_openpt, ptsname, unlockpt};
use nix::sys::signal::{kill, Signal};
use nix::sys::stat::Mode;
use nix::sys::wait::{waitpid, WaitPidFlag, WaitStatus};
use nix::unistd::{close, dup2, execvp, fork, setsid, ForkResult, Pid};

use super::{PtyError, PtyResult, WindowSize};
use crate::host::ChildOutput;

/// Exit code reported when the child could not exec its program
const EXEC_FAILED: i32 = 127;

/// A pseudoterminal with a spawned child process
pub struct Pty {
    /// The PTY master file descriptor
    master: OwnedFd,
    /// The child process ID
    child_pid: Pid,
    /// Whether the child is still running
    alive: AtomicBool,
    /// Exit code once the child has been reaped
    exit_code: Mutex<Option<i32>>,
}

impl Pty {
    /// Spawn `program` with `args` on a new PTY of the given size
    pub fn spawn<S: AsRef<str>>(program: &str, args: &[S], size: WindowSize) -> PtyResult<Self> {
        // Everything the child needs is allocated before fork
        let program_c = to_cstring(program)?;
        let mut argv = Vec::with_capacity(args.len() + 1);
        argv.push(program_c.clone());
        for arg in args {
            argv.push(to_cstring(arg.as_ref())?);
        }

        let master = posix_openpt(OFlag::O_RDWR | OFlag::O_NOCTTY).map_err(PtyError::OpenMaster)?;
        grantpt(&master).map_err(PtyError::GrantPty)?;
        unlockpt(&master).map_err(PtyError::UnlockPty)?;

        // SAFETY: ptsname is not thread-safe; the name is copied out before
        // any other PTY call could overwrite the static buffer
        let slave_name = unsafe { ptsname(&master) }.map_err(PtyError::PtsName)?;

        // SAFETY: the fd comes straight from posix_openpt and is owned here
        let master = unsafe { OwnedFd::from_raw_fd(master.into_raw_fd()) };
        set_window_size(master.as_raw_fd(), size)?;

        // SAFETY: the child only calls exec setup functions before exec or _exit
        match unsafe { fork() }.map_err(PtyError::Fork)? {
            ForkResult::Child => {
                drop(master);
                let _ = exec_child(&slave_name, &program_c, &argv);
                // SAFETY: _exit skips destructors and atexit handlers that
                // belong to the parent's copy of this address space
                unsafe { libc::_exit(EXEC_FAILED) }
            }
            ForkResult::Parent { child } => {
                tracing::info!("Spawned {} (pid {}) on {}", program, child, slave_name);
                Ok(Pty {
                    master,
                    child_pid: child,
                    alive: AtomicBool::new(true),
                    exit_code: Mutex::new(None),
                })
            }
        }
    }

    /// Get the child process ID
    pub fn child_pid(&self) -> Pid {
        self.child_pid
    }

    /// A reader for the child's output
    pub fn reader(&self) -> PtyResult<PtyReader> {
        Ok(PtyReader {
            file: File::from(self.master.try_clone()?),
        })
    }

    /// A writer for the child's input
    pub fn writer(&self) -> PtyResult<File> {
        Ok(File::from(self.master.try_clone()?))
    }

    /// Resize the PTY
    pub fn resize(&self, size: WindowSize) -> PtyResult<()> {
        set_window_size(self.master.as_raw_fd(), size)
    }

    /// Current window size of the PTY
    pub fn window_size(&self) -> PtyResult<WindowSize> {
        get_window_size(self.master.as_raw_fd())
    }

    /// Check if the child process is still running
    pub fn is_alive(&self) -> bool {
        if !self.alive.load(Ordering::SeqCst) {
            return false;
        }

        match waitpid(self.child_pid, Some(WaitPidFlag::WNOHANG)) {
            Ok(status) => self.record(status).is_none(),
            Err(_) => {
                self.alive.store(false, Ordering::SeqCst);
                false
            }
        }
    }

    /// Wait for the child process to exit and return its exit code. A child
    /// killed by a signal reports 128 + the signal number.
    pub fn wait(&self) -> PtyResult<Option<i32>> {
        while self.alive.load(Ordering::SeqCst) {
            match waitpid(self.child_pid, None) {
                Ok(status) => {
                    if let Some(code) = self.record(status) {
                        return Ok(Some(code));
                    }
                }
                Err(Errno::EINTR) => {}
                Err(Errno::ECHILD) => self.alive.store(false, Ordering::SeqCst),
                Err(e) => return Err(PtyError::Wait(e)),
            }
        }
        Ok(self.exit_code())
    }

    /// Exit code, once the child has been reaped
    pub fn exit_code(&self) -> Option<i32> {
        *self.exit_code.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Send a signal to the child process
    pub fn signal(&self, signal: Signal) -> PtyResult<()> {
        kill(self.child_pid, signal).map_err(PtyError::Signal)
    }

    /// Store a terminal wait status; `None` if the child is still running
    fn record(&self, status: WaitStatus) -> Option<i32> {
        let code = match status {
            WaitStatus::Exited(_, code) => code,
            WaitStatus::Signaled(_, signal, _) => 128 + signal as i32,
            _ => return None,
        };
        self.alive.store(false, Ordering::SeqCst);
        *self.exit_code.lock().unwrap_or_else(PoisonError::into_inner) = Some(code);
        Some(code)
    }
}

impl Drop for Pty {
    fn drop(&mut self) {
        if self.is_alive() {
            let _ = self.signal(Signal::SIGHUP);
            let _ = waitpid(self.child_pid, Some(WaitPidFlag::WNOHANG));
        }
    }
}

/// Reading end of the PTY master
pub struct PtyReader {
    file: File,
}

impl ChildOutput for PtyReader {
    fn read_timeout(&mut self, buf: &mut [u8], timeout: Duration) -> io::Result<Option<usize>> {
        let timeout_ms = i32::try_from(timeout.as_millis()).unwrap_or(i32::MAX);
        let ready = {
            let mut fds = [PollFd::new(&self.file, PollFlags::POLLIN)];
            poll(&mut fds, timeout_ms)
        };
        match ready {
            Ok(0) | Err(Errno::EINTR) => return Ok(None),
            Ok(_) => {}
            Err(e) => return Err(e.into()),
        }

        match self.file.read(buf) {
            Ok(n) => Ok(Some(n)),
            // Linux reports EIO on the master once every slave fd is closed
            Err(e) if e.raw_os_error() == Some(libc::EIO) => Ok(Some(0)),
            Err(e) if e.kind() == ErrorKind::Interrupted => Ok(None),
            Err(e) => Err(e),
        }
    }
}

fn to_cstring(s: &str) -> PtyResult<CString> {
    CString::new(s).map_err(|_| PtyError::InvalidArgument(s.to_string()))
}

/// Runs in the forked child: attach to the slave and exec. Only returns on
/// failure.
fn exec_child(slave_name: &str, program: &CString, argv: &[CString]) -> nix::Result<Infallible> {
    setsid()?;

    // Opening the slave after setsid makes it the controlling terminal
    let slave_fd = open(slave_name, OFlag::O_RDWR, Mode::empty())?;

    // SAFETY: TIOCSCTTY is a valid ioctl for setting controlling terminal
    unsafe {
        libc::ioctl(slave_fd, libc::TIOCSCTTY as _, 0);
    }

    dup2(slave_fd, STDIN_FILENO)?;
    dup2(slave_fd, STDOUT_FILENO)?;
    dup2(slave_fd, STDERR_FILENO)?;
    if slave_fd > STDERR_FILENO {
        let _ = close(slave_fd);
    }

    std::env::set_var("TERM", "xterm-256color");
    std::env::set_var("COLORTERM", "truecolor");

    execvp(program, argv)
}

/// Set the window size on a PTY file descriptor
fn set_window_size(fd: RawFd, size: WindowSize) -> PtyResult<()> {
    let winsize = libc::winsize {
        ws_row: size.rows,
        ws_col: size.cols,
        ws_xpixel: size.pixel_width,
        ws_ypixel: size.pixel_height,
    };

    // SAFETY: TIOCSWINSZ is a valid ioctl for setting window size
    let result = unsafe { libc::ioctl(fd, libc::TIOCSWINSZ, &winsize) };

    if result < 0 {
        Err(PtyError::SetWinsize(Errno::last()))
    } else {
        Ok(())
    }
}

/// Get the window size from a PTY file descriptor
fn get_window_size(fd: RawFd) -> PtyResult<WindowSize> {
    let mut winsize = libc::winsize {
        ws_row: 0,
        ws_col: 0,
        ws_xpixel: 0,
        ws_ypixel: 0,
    };

    // SAFETY: TIOCGWINSZ is a valid ioctl for getting window size
    let result = unsafe { libc::ioctl(fd, libc::TIOCGWINSZ, &mut winsize) };

    if result < 0 {
        Err(PtyError::SetWinsize(Errno::last()))
    } else {
        Ok(WindowSize {
            rows: winsize.ws_row,
            cols: winsize.ws_col,
            pixel_width: winsize.ws_xpixel,
            pixel_height: winsize.ws_ypixel,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Read until EOF or until `deadline` passes
    fn read_all(reader: &mut PtyReader, deadline: Duration) -> Vec<u8> {
        let start = std::time::Instant::now();
        let mut out = Vec::new();
        let mut buf = [0u8; 1024];
        while start.elapsed() < deadline {
            match reader.read_timeout(&mut buf, Duration::from_millis(50)) {
                Ok(Some(0)) | Err(_) => break,
                Ok(Some(n)) => out.extend_from_slice(&buf[..n]),
                Ok(None) => {}
            }
        }
        out
    }

    #[test]
    fn test_window_size() {
        let size = WindowSize::new(80, 24);
        assert_eq!(size.cols, 80);
        assert_eq!(size.rows, 24);
        assert_eq!(WindowSize::from_grid(100_000, 5), WindowSize::new(u16::MAX, 5));
    }

    #[test]
    fn test_pty_spawn_and_read() {
        let pty = Pty::spawn("/bin/echo", &["hello"], WindowSize::new(80, 24))
            .expect("Failed to spawn PTY");
        let mut reader = pty.reader().expect("Failed to clone reader");

        let output = read_all(&mut reader, Duration::from_secs(5));
        assert!(
            String::from_utf8_lossy(&output).contains("hello"),
            "Unexpected output: {:?}",
            output
        );

        assert_eq!(pty.wait().expect("Failed to wait"), Some(0));
        assert!(!pty.is_alive());
    }

    #[test]
    fn test_pty_write_read() {
        use std::io::Write;

        let pty = Pty::spawn("/bin/cat", &[] as &[&str], WindowSize::new(80, 24))
            .expect("Failed to spawn PTY");
        let mut writer = pty.writer().expect("Failed to clone writer");
        let mut reader = pty.reader().expect("Failed to clone reader");

        writer.write_all(b"test\n").expect("Failed to write");

        let mut buf = [0u8; 1024];
        let mut output = Vec::new();
        for _ in 0..50 {
            if let Ok(Some(n)) = reader.read_timeout(&mut buf, Duration::from_millis(100)) {
                output.extend_from_slice(&buf[..n]);
            }
            if String::from_utf8_lossy(&output).contains("test") {
                break;
            }
        }
        assert!(String::from_utf8_lossy(&output).contains("test"));

        pty.signal(Signal::SIGKILL).expect("Failed to signal");
        assert_eq!(pty.wait().expect("Failed to wait"), Some(128 + 9));
    }

    #[test]
    fn test_pty_resize() {
        let pty = Pty::spawn("/bin/sh", &[] as &[&str], WindowSize::new(80, 24))
            .expect("Failed to spawn PTY");

        pty.resize(WindowSize::new(120, 40)).expect("Failed to resize");

        let size = pty.window_size().expect("Failed to get size");
        assert_eq!(size.cols, 120);
        assert_eq!(size.rows, 40);
    }

    #[test]
    fn test_exec_failure_exits_127() {
        let pty = Pty::spawn(
            "/nonexistent/tinyterm-test-binary",
            &[] as &[&str],
            WindowSize::default(),
        )
        .expect("Failed to spawn PTY");
        assert_eq!(pty.wait().expect("Failed to wait"), Some(EXEC_FAILED));
    }

    #[test]
    fn test_nul_in_argument_rejected() {
        let result = Pty::spawn("/bin/echo", &["a\0b"], WindowSize::default());
        assert!(matches!(result, Err(PtyError::InvalidArgument(_))));
    }
}
