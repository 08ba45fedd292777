//! In-memory sinks for exercising the emitter without a socket.

use std::{
    io::{self, Write},
    sync::Arc,
};

use parking_lot::Mutex;

/// Cloneable sink that appends every write to a shared buffer.
///
/// The buffer is private so tests can't bypass the `Write` implementation.
#[derive(Clone, Debug, Default)]
pub struct SharedSink {
    buffer: Arc<Mutex<Vec<u8>>>,
    writes: Arc<Mutex<usize>>,
}

impl SharedSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all bytes written so far.
    pub fn contents(&self) -> Vec<u8> {
        self.buffer.lock().clone()
    }

    /// Number of `write` calls received.
    pub fn write_calls(&self) -> usize {
        *self.writes.lock()
    }
}

impl Write for SharedSink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        *self.writes.lock() += 1;
        self.buffer.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// How a [`FailingSink`] misbehaves.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FailureMode {
    /// Every write returns an error.
    WriteError,
    /// Every write accepts only the first `n` bytes.
    ShortWrite(usize),
    /// Writes succeed; flushing fails.
    FlushError,
}

/// Sink that fails according to its [`FailureMode`].
#[derive(Clone, Debug)]
pub struct FailingSink {
    mode: FailureMode,
    accepted: SharedSink,
}

impl FailingSink {
    pub fn new(mode: FailureMode) -> Self {
        Self {
            mode,
            accepted: SharedSink::new(),
        }
    }

    /// Bytes the sink accepted before or despite failing.
    pub fn accepted(&self) -> Vec<u8> {
        self.accepted.contents()
    }
}

impl Write for FailingSink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self.mode {
            FailureMode::WriteError => Err(io::Error::new(
                io::ErrorKind::BrokenPipe,
                "connection reset by collector",
            )),
            FailureMode::ShortWrite(n) => self.accepted.write(&buf[..n.min(buf.len())]),
            FailureMode::FlushError => self.accepted.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self.mode {
            FailureMode::FlushError => Err(io::Error::other("flush failed")),
            _ => Ok(()),
        }
    }
}
