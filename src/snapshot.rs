//! Best-effort, deadline-bounded snapshots of stream output.
//!
//! [`read_snapshot`] drains whatever a handle can deliver within a short
//! deadline and returns it as text. It is meant for sampling process or log
//! output in tests: it never fails, and the text it returns is not
//! guaranteed to be the complete stream.

use std::io::{self, ErrorKind, Read};
use std::net::TcpStream;
#[cfg(unix)]
use std::os::unix::net::UnixStream;
use std::time::{Duration, Instant};

use tracing::trace;

/// Default time allowed for a snapshot read.
pub const SNAPSHOT_DEADLINE: Duration = Duration::from_millis(50);
/// Bytes requested from the handle per read call.
pub const CHUNK_SIZE: usize = 4096;
/// Initial capacity of the accumulated snapshot buffer.
pub const INITIAL_CAPACITY: usize = 8192;

/// A readable handle that accepts an absolute read deadline.
pub trait DeadlineRead: Read {
    /// Make reads past `deadline` fail instead of blocking.
    fn set_read_deadline(&mut self, deadline: Instant) -> io::Result<()>;
}

impl<T: DeadlineRead + ?Sized> DeadlineRead for &mut T {
    fn set_read_deadline(&mut self, deadline: Instant) -> io::Result<()> {
        (**self).set_read_deadline(deadline)
    }
}

/// Parameters for [`read_snapshot_with`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SnapshotOptions {
    pub deadline: Duration,
    pub chunk_size: usize,
    pub initial_capacity: usize,
}

impl Default for SnapshotOptions {
    fn default() -> Self {
        Self {
            deadline: SNAPSHOT_DEADLINE,
            chunk_size: CHUNK_SIZE,
            initial_capacity: INITIAL_CAPACITY,
        }
    }
}

/// Read the bytes `handle` delivers within 50ms and return them as text.
pub fn read_snapshot<H: DeadlineRead + ?Sized>(handle: &mut H) -> String {
    read_snapshot_with(handle, &SnapshotOptions::default())
}

/// Read the bytes `handle` delivers within `options.deadline`.
///
/// Returns an empty string if the deadline cannot be set, including when
/// `options.deadline` is too large to represent as an `Instant`. Invalid
/// UTF-8 is replaced rather than rejected.
pub fn read_snapshot_with<H: DeadlineRead + ?Sized>(
    handle: &mut H,
    options: &SnapshotOptions,
) -> String {
    let Some(deadline) = Instant::now().checked_add(options.deadline) else {
        trace!(deadline = ?options.deadline, "snapshot unavailable: deadline out of range");
        return String::new();
    };
    if let Err(e) = handle.set_read_deadline(deadline) {
        trace!(error = %e, "snapshot unavailable: could not set read deadline");
        return String::new();
    }

    let mut buf = Vec::with_capacity(options.initial_capacity);
    let mut chunk = vec![0u8; options.chunk_size.max(1)];
    loop {
        match handle.read(&mut chunk) {
            Ok(0) => break,
            Ok(n) => buf.extend_from_slice(&chunk[..n]),
            // Any error ends the snapshot, deadline or not. Real I/O
            // failures are only visible in the trace log.
            Err(e) => {
                trace!(error = %e, kind = ?e.kind(), bytes = buf.len(), "snapshot read stopped");
                break;
            }
        }
    }

    String::from_utf8_lossy(&buf).into_owned()
}

/// Streams with a relative per-read timeout, like sockets.
pub trait ReadTimeout: Read {
    fn set_read_timeout(&self, timeout: Option<Duration>) -> io::Result<()>;
}

impl ReadTimeout for TcpStream {
    fn set_read_timeout(&self, timeout: Option<Duration>) -> io::Result<()> {
        TcpStream::set_read_timeout(self, timeout)
    }
}

#[cfg(unix)]
impl ReadTimeout for UnixStream {
    fn set_read_timeout(&self, timeout: Option<Duration>) -> io::Result<()> {
        UnixStream::set_read_timeout(self, timeout)
    }
}

/// Adapts a [`ReadTimeout`] stream to an absolute read deadline.
///
/// Each read is given the time remaining until the deadline. Once the
/// deadline has passed, reads fail with `ErrorKind::TimedOut` without
/// touching the stream.
#[derive(Debug)]
pub struct DeadlineStream<S> {
    inner: S,
    deadline: Option<Instant>,
}

impl<S: ReadTimeout> DeadlineStream<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            deadline: None,
        }
    }

    /// Remove the deadline so reads block again.
    pub fn clear_read_deadline(&mut self) -> io::Result<()> {
        self.deadline = None;
        self.inner.set_read_timeout(None)
    }

    pub fn get_ref(&self) -> &S {
        &self.inner
    }

    pub fn into_inner(self) -> S {
        self.inner
    }
}

impl<S: ReadTimeout> DeadlineRead for DeadlineStream<S> {
    fn set_read_deadline(&mut self, deadline: Instant) -> io::Result<()> {
        let remaining = deadline.saturating_duration_since(Instant::now());
        if !remaining.is_zero() {
            self.inner.set_read_timeout(Some(remaining))?;
        }
        self.deadline = Some(deadline);
        Ok(())
    }
}

impl<S: ReadTimeout> Read for DeadlineStream<S> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if let Some(deadline) = self.deadline {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Err(io::Error::new(ErrorKind::TimedOut, "read deadline exceeded"));
            }
            // `set_read_timeout` rejects a zero duration.
            self.inner.set_read_timeout(Some(remaining))?;
        }
        self.inner.read(buf)
    }
}
