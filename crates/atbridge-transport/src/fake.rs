use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::error::{Result, TransportError};
use crate::link::SerialLink;

/// One scripted event on the read side of a [`FakeLink`].
#[derive(Debug)]
pub enum FakeEvent {
    /// Bytes that arrive together in one physical read.
    Chunk(Vec<u8>),
    /// One poll observing an idle line.
    Quiet,
    /// An I/O failure surfaced on the next poll or read.
    Fault,
}

impl FakeEvent {
    /// Convenience for scripting a chunk from a byte literal.
    pub fn chunk(bytes: impl AsRef<[u8]>) -> Self {
        FakeEvent::Chunk(bytes.as_ref().to_vec())
    }
}

#[derive(Debug, Default)]
struct FakeInner {
    script: VecDeque<FakeEvent>,
    writes: Vec<Vec<u8>>,
    open: bool,
    resets: usize,
}

/// Scriptable in-memory serial endpoint for tests.
///
/// Reads are driven by a script of [`FakeEvent`]s. An exhausted script
/// reports the link as closed, so loops driving a fake terminate instead of
/// polling forever. Writes are recorded for assertions; `reset_input` leaves
/// the script alone (scripts model bytes arriving after the session starts)
/// and only counts invocations.
#[derive(Debug, Default)]
pub struct FakeLink {
    name: String,
    fail_open: bool,
    fail_writes: bool,
    idle_when_exhausted: bool,
    inner: Mutex<FakeInner>,
}

impl FakeLink {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn scripted(name: impl Into<String>, script: Vec<FakeEvent>) -> Self {
        let link = Self::new(name);
        link.guard().script = script.into();
        link
    }

    /// Make `open` fail with a scripted error.
    pub fn failing_open(mut self) -> Self {
        self.fail_open = true;
        self
    }

    /// Make every write fail with a scripted error.
    pub fn failing_writes(mut self) -> Self {
        self.fail_writes = true;
        self
    }

    /// Report an idle line instead of a closed one once the script runs out.
    ///
    /// Models a peer that stays connected but silent, so stop paths can be
    /// exercised while a reader is blocked polling.
    pub fn idle_when_exhausted(mut self) -> Self {
        self.idle_when_exhausted = true;
        self
    }

    /// Everything written to this link, one entry per `write_all`.
    pub fn writes(&self) -> Vec<Vec<u8>> {
        self.guard().writes.clone()
    }

    /// How many times the input buffer was reset.
    pub fn resets(&self) -> usize {
        self.guard().resets
    }

    fn guard(&self) -> MutexGuard<'_, FakeInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn closed(&self) -> TransportError {
        TransportError::Closed {
            port: self.name.clone(),
        }
    }

    fn fault(&self) -> TransportError {
        TransportError::Io {
            port: self.name.clone(),
            source: std::io::Error::other("scripted fault"),
        }
    }
}

impl SerialLink for FakeLink {
    fn name(&self) -> &str {
        &self.name
    }

    fn open(&self) -> Result<()> {
        if self.fail_open {
            return Err(TransportError::Open {
                port: self.name.clone(),
                source: std::io::Error::other("scripted open failure"),
            });
        }
        self.guard().open = true;
        Ok(())
    }

    fn is_open(&self) -> bool {
        self.guard().open
    }

    fn bytes_available(&self) -> Result<usize> {
        let mut inner = self.guard();
        if !inner.open {
            return Err(self.closed());
        }
        match inner.script.front() {
            Some(FakeEvent::Chunk(chunk)) => Ok(chunk.len()),
            Some(FakeEvent::Quiet) => {
                inner.script.pop_front();
                Ok(0)
            }
            Some(FakeEvent::Fault) => {
                inner.script.pop_front();
                Err(self.fault())
            }
            None if self.idle_when_exhausted => Ok(0),
            None => Err(self.closed()),
        }
    }

    fn read(&self, buf: &mut [u8]) -> Result<usize> {
        let mut inner = self.guard();
        if !inner.open {
            return Err(self.closed());
        }
        match inner.script.pop_front() {
            Some(FakeEvent::Chunk(mut chunk)) => {
                let n = chunk.len().min(buf.len());
                buf[..n].copy_from_slice(&chunk[..n]);
                if n < chunk.len() {
                    chunk.drain(..n);
                    inner.script.push_front(FakeEvent::Chunk(chunk));
                }
                Ok(n)
            }
            Some(FakeEvent::Quiet) => Ok(0),
            Some(FakeEvent::Fault) => Err(self.fault()),
            None => Err(self.closed()),
        }
    }

    fn write_all(&self, buf: &[u8]) -> Result<()> {
        let mut inner = self.guard();
        if !inner.open {
            return Err(self.closed());
        }
        if self.fail_writes {
            return Err(self.fault());
        }
        inner.writes.push(buf.to_vec());
        Ok(())
    }

    fn reset_input(&self) -> Result<()> {
        let mut inner = self.guard();
        if !inner.open {
            return Err(self.closed());
        }
        inner.resets += 1;
        Ok(())
    }

    fn close(&self) {
        self.guard().open = false;
    }
}
