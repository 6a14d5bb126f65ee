//! Session Host
//!
//! Runs a [`Session`] against a live child process. A reader thread waits on
//! the child's output and feeds each chunk into the session under the lock.
//! Device replies are queued to a writer thread, so the reader never waits
//! on the child's input. The UI thread resizes, snapshots and sends input
//! through the same lock, one short critical section per call.

use std::io::{self, Read, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crate::core::Snapshot;
use crate::input::KeyEvent;
use crate::session::{Session, SessionError, SessionEvent};

/// How long the reader blocks before re-checking the running flag
pub const POLL_INTERVAL: Duration = Duration::from_millis(50);

const READ_BUFFER_SIZE: usize = 8192;

/// A source of child output that can wait with a timeout
pub trait ChildOutput: Send {
    /// Read into `buf`. `Ok(None)` means nothing arrived within `timeout`;
    /// `Ok(Some(0))` means end of output.
    fn read_timeout(&mut self, buf: &mut [u8], timeout: Duration) -> io::Result<Option<usize>>;
}

/// Adapts any blocking reader (a file, a pipe) to [`ChildOutput`]. Reads
/// ignore the timeout, so shutdown waits for the pending read to return.
pub struct BlockingReader<R> {
    inner: R,
}

impl<R: Read + Send> BlockingReader<R> {
    pub fn new(inner: R) -> Self {
        Self { inner }
    }
}

impl<R: Read + Send> ChildOutput for BlockingReader<R> {
    fn read_timeout(&mut self, buf: &mut [u8], _timeout: Duration) -> io::Result<Option<usize>> {
        match self.inner.read(buf) {
            Ok(n) => Ok(Some(n)),
            Err(e) if e.kind() == io::ErrorKind::Interrupted => Ok(None),
            Err(e) => Err(e),
        }
    }
}

type ExitStatusFn = Box<dyn FnOnce() -> Option<i32> + Send>;
type ChildInput = Arc<Mutex<Box<dyn Write + Send>>>;

/// A session connected to a running child process
pub struct SessionHost {
    session: Arc<Mutex<Session>>,
    input: ChildInput,
    running: Arc<AtomicBool>,
    exited: Arc<AtomicBool>,
    reader_thread: Option<JoinHandle<()>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl SessionHost {
    /// Start hosting `session`, reading child output from `output` and
    /// sending input to `input`
    pub fn start<O, W>(session: Session, output: O, input: W) -> Self
    where
        O: ChildOutput + 'static,
        W: Write + Send + 'static,
    {
        Self::start_with_exit_status(session, output, input, || None)
    }

    /// Like [`SessionHost::start`]; `exit_status` is called once the output
    /// ends to obtain the child's exit code
    pub fn start_with_exit_status<O, W, F>(session: Session, output: O, input: W, exit_status: F) -> Self
    where
        O: ChildOutput + 'static,
        W: Write + Send + 'static,
        F: FnOnce() -> Option<i32> + Send + 'static,
    {
        let session = Arc::new(Mutex::new(session));
        let input: ChildInput = Arc::new(Mutex::new(Box::new(input)));
        let running = Arc::new(AtomicBool::new(true));
        let exited = Arc::new(AtomicBool::new(false));

        let (replies, pending) = mpsc::channel();
        let reply_input = Arc::clone(&input);
        // Detached; ends once the reader drops its sender
        thread::spawn(move || write_replies(pending, reply_input));

        let reader = Reader {
            session: Arc::clone(&session),
            replies,
            running: Arc::clone(&running),
            exited: Arc::clone(&exited),
        };
        let exit_status: ExitStatusFn = Box::new(exit_status);
        let reader_thread = thread::spawn(move || reader.run(output, exit_status));

        Self {
            session,
            input,
            running,
            exited,
            reader_thread: Some(reader_thread),
        }
    }

    /// Host a session on a PTY child. The PTY is shared with the caller,
    /// which keeps it for resizing and signalling.
    #[cfg(unix)]
    pub fn spawn_pty(
        session: Session,
        pty: Arc<crate::pty::Pty>,
    ) -> Result<Self, crate::pty::PtyError> {
        let output = pty.reader()?;
        let input = pty.writer()?;
        Ok(Self::start_with_exit_status(session, output, input, move || {
            pty.wait().unwrap_or_else(|e| {
                tracing::warn!("Failed to reap child: {}", e);
                None
            })
        }))
    }

    /// Shared handle to the session
    pub fn session(&self) -> Arc<Mutex<Session>> {
        Arc::clone(&self.session)
    }

    /// Whether the reader thread is still consuming output
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst) && !self.exited.load(Ordering::SeqCst)
    }

    /// Whether the child's output has ended
    pub fn has_exited(&self) -> bool {
        self.exited.load(Ordering::SeqCst)
    }

    pub fn resize(&self, cols: usize, rows: usize) -> Result<(), SessionError> {
        lock(&self.session).resize(cols, rows)
    }

    pub fn snapshot(&self) -> Snapshot {
        lock(&self.session).snapshot()
    }

    pub fn generation(&self) -> u64 {
        lock(&self.session).generation()
    }

    pub fn take_events(&self) -> Vec<SessionEvent> {
        lock(&self.session).take_events()
    }

    /// Encode a key press with the current modes and send it to the child
    pub fn send_key(&self, event: &KeyEvent) -> Result<(), SessionError> {
        let bytes = lock(&self.session).encode_key(event);
        self.send_bytes(&bytes)
    }

    /// Encode pasted text with the current modes and send it to the child
    pub fn send_paste(&self, text: &str) -> Result<(), SessionError> {
        let bytes = lock(&self.session).encode_paste(text);
        self.send_bytes(&bytes)
    }

    /// Send raw bytes to the child
    pub fn send_bytes(&self, bytes: &[u8]) -> Result<(), SessionError> {
        if self.exited.load(Ordering::SeqCst) {
            return Err(SessionError::ChildExited);
        }
        if bytes.is_empty() {
            return Ok(());
        }
        write_input(&self.input, bytes).map_err(|e| match e.kind() {
            io::ErrorKind::BrokenPipe => SessionError::ChildExited,
            _ => SessionError::Io(e),
        })
    }

    /// Stop the reader thread and wait for it to finish
    pub fn shutdown(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        if let Some(handle) = self.reader_thread.take() {
            if handle.join().is_err() {
                tracing::warn!("Reader thread panicked");
            }
        }
    }
}

impl Drop for SessionHost {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn write_input(input: &ChildInput, bytes: &[u8]) -> io::Result<()> {
    let mut input = lock(input);
    input.write_all(bytes)?;
    input.flush()
}

/// Writer thread: sends queued device replies to the child
fn write_replies(pending: Receiver<Vec<u8>>, input: ChildInput) {
    for reply in pending {
        if let Err(e) = write_input(&input, &reply) {
            tracing::debug!("Failed to send reply to child: {}", e);
        }
    }
}

/// State moved into the reader thread
struct Reader {
    session: Arc<Mutex<Session>>,
    replies: Sender<Vec<u8>>,
    running: Arc<AtomicBool>,
    exited: Arc<AtomicBool>,
}

impl Reader {
    fn run<O: ChildOutput>(self, mut output: O, exit_status: ExitStatusFn) {
        let mut buf = vec![0u8; READ_BUFFER_SIZE];

        loop {
            if !self.running.load(Ordering::SeqCst) {
                tracing::debug!("Reader stopped by host");
                return;
            }

            match output.read_timeout(&mut buf, POLL_INTERVAL) {
                Ok(None) => continue,
                Ok(Some(0)) => break,
                Ok(Some(n)) => {
                    let responses = {
                        let mut session = lock(&self.session);
                        session.feed(&buf[..n]);
                        session.take_responses()
                    };
                    if !responses.is_empty() && self.replies.send(responses).is_err() {
                        tracing::debug!("Reply writer has stopped");
                    }
                }
                Err(e) => {
                    tracing::warn!("Reading child output failed: {}", e);
                    break;
                }
            }
        }

        self.exited.store(true, Ordering::SeqCst);
        let code = exit_status();
        lock(&self.session).record_exit(code);
    }
}
