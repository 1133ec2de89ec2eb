//! Minimal byte I/O traits that codecs decode from and encode to.
//!
//! These are deliberately narrow — a source offers byte-at-a-time lookahead
//! plus bulk reads, a sink offers bulk writes — so that a codec can be
//! driven by anything from an in-memory slice to a buffered socket without
//! depending on `std::io` directly.

use std::convert::Infallible;
use std::io;

/// A source of bytes a decoder pulls from.
///
/// `Self::Error` is reserved for genuine I/O failures. Running out of input
/// is not an error at this layer — `peek`/`pull`/`pull_exact` all report it
/// as `None` or a short result, and it is each codec's own job to decide
/// whether that shortfall means "clean end of document" or
/// `ErrUnexpectedEOF`.
pub trait ByteSource {
    /// The error type returned on I/O failure.
    type Error;

    /// Look at the next byte without consuming it, or `None` at end of
    /// input.
    fn peek(&mut self) -> Result<Option<u8>, Self::Error>;

    /// Consume and return the next byte, or `None` at end of input.
    fn pull(&mut self) -> Result<Option<u8>, Self::Error>;

    /// Consume and return exactly `n` bytes, or `None` if fewer than `n`
    /// bytes remain.
    fn pull_exact(&mut self, n: usize) -> Result<Option<Vec<u8>>, Self::Error>;
}

/// A sink of bytes an encoder pushes to.
pub trait ByteSink {
    /// The error type returned on I/O failure.
    type Error;

    /// Write all of `bytes` to the sink.
    fn push(&mut self, bytes: &[u8]) -> Result<(), Self::Error>;
}

impl ByteSource for &[u8] {
    type Error = Infallible;

    fn peek(&mut self) -> Result<Option<u8>, Self::Error> {
        Ok(self.first().copied())
    }

    fn pull(&mut self) -> Result<Option<u8>, Self::Error> {
        match self.split_first() {
            Some((b, rest)) => { *self = rest; Ok(Some(*b)) }
            None => Ok(None),
        }
    }

    fn pull_exact(&mut self, n: usize) -> Result<Option<Vec<u8>>, Self::Error> {
        if self.len() < n {
            return Ok(None)
        }
        let (a, b) = self.split_at(n);
        *self = b;
        Ok(Some(a.to_vec()))
    }
}

impl ByteSink for Vec<u8> {
    type Error = Infallible;

    fn push(&mut self, bytes: &[u8]) -> Result<(), Self::Error> {
        self.extend_from_slice(bytes);
        Ok(())
    }
}

/// Adapts a [`std::io::Read`] into a [`ByteSource`] with a one-byte
/// lookahead buffer, the way `minicbor_io::Reader` wraps a reader with a
/// scratch buffer.
pub struct IoSource<R> {
    inner: R,
    lookahead: Option<u8>,
}

impl<R: io::Read> IoSource<R> {
    /// Wrap a reader.
    pub fn new(inner: R) -> Self {
        IoSource { inner, lookahead: None }
    }

    fn fill(&mut self) -> io::Result<Option<u8>> {
        if let Some(b) = self.lookahead {
            return Ok(Some(b))
        }
        let mut buf = [0u8; 1];
        let n = self.inner.read(&mut buf)?;
        if n == 0 {
            return Ok(None)
        }
        self.lookahead = Some(buf[0]);
        Ok(Some(buf[0]))
    }
}

impl<R: io::Read> ByteSource for IoSource<R> {
    type Error = io::Error;

    fn peek(&mut self) -> Result<Option<u8>, Self::Error> {
        self.fill()
    }

    fn pull(&mut self) -> Result<Option<u8>, Self::Error> {
        let b = self.fill()?;
        self.lookahead = None;
        Ok(b)
    }

    fn pull_exact(&mut self, n: usize) -> Result<Option<Vec<u8>>, Self::Error> {
        let mut out = Vec::with_capacity(n);
        if n > 0 {
            match self.pull()? {
                Some(b) => out.push(b),
                None => return Ok(None),
            }
        }
        if out.len() < n {
            let mut rest = vec![0u8; n - out.len()];
            match self.inner.read_exact(&mut rest) {
                Ok(()) => out.extend_from_slice(&rest),
                Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => return Ok(None),
                Err(e) => return Err(e),
            }
        }
        Ok(Some(out))
    }
}

/// Adapts a [`std::io::Write`] into a [`ByteSink`].
pub struct IoSink<W> {
    inner: W,
}

impl<W: io::Write> IoSink<W> {
    /// Wrap a writer.
    pub fn new(inner: W) -> Self {
        IoSink { inner }
    }

    /// Unwrap the inner writer.
    pub fn into_inner(self) -> W {
        self.inner
    }
}

impl<W: io::Write> ByteSink for IoSink<W> {
    type Error = io::Error;

    fn push(&mut self, bytes: &[u8]) -> Result<(), Self::Error> {
        self.inner.write_all(bytes)
    }
}
