use crate::close::Close;
use crate::error::ReaderzError;
use crate::options::{DEFAULT_CAPACITY, MIN_CAPACITY};

use std::fmt;
use std::io::{self, BufRead, Read};

/// Read-ahead buffer over a closable source, with non-consuming `peek`.
///
/// Unlike `std::io::BufReader`, `peek(n)` keeps filling until `n` bytes are
/// buffered (or the source ends), so a short first read from a pipe or socket
/// does not hide the leading bytes.
pub struct BufferedStream<R> {
    inner: R,
    buf: Box<[u8]>,
    pos: usize,
    filled: usize,
    // Set when the last pull from `inner` failed; read by the gzip layer.
    source_fault: bool,
}

impl<R: Read> BufferedStream<R> {
    pub fn new(inner: R) -> Self {
        Self::with_capacity(DEFAULT_CAPACITY, inner)
    }

    pub fn with_capacity(capacity: usize, inner: R) -> Self {
        let capacity = capacity.max(MIN_CAPACITY);
        Self {
            inner,
            buf: vec![0u8; capacity].into_boxed_slice(),
            pos: 0,
            filled: 0,
            source_fault: false,
        }
    }

    /// Return the next `n` bytes without consuming them.
    ///
    /// Fails with [`ReaderzError::ShortRead`] if the source ends first; whatever
    /// was buffered stays readable. Source errors are returned as
    /// [`ReaderzError::Io`] unchanged.
    pub fn peek(&mut self, n: usize) -> Result<&[u8], ReaderzError> {
        if n > self.buf.len() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!(
                    "peek of {n} bytes exceeds buffer capacity {}",
                    self.buf.len()
                ),
            )
            .into());
        }
        if self.filled - self.pos < n {
            if self.pos + n > self.buf.len() {
                self.compact();
            }
            while self.filled - self.pos < n {
                match self.pull() {
                    Ok(0) => {
                        return Err(ReaderzError::ShortRead {
                            needed: n,
                            available: self.filled - self.pos,
                        });
                    }
                    Ok(_) => {}
                    Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                    Err(e) => return Err(e.into()),
                }
            }
        }
        Ok(&self.buf[self.pos..self.pos + n])
    }

    /// Read once from the source into the free tail of the buffer.
    fn pull(&mut self) -> io::Result<usize> {
        let res = self.inner.read(&mut self.buf[self.filled..]);
        self.source_fault = res.is_err();
        let n = res?;
        log::trace!("buffered {n} bytes from source");
        self.filled += n;
        Ok(n)
    }

    fn pull_direct(&mut self, out: &mut [u8]) -> io::Result<usize> {
        let res = self.inner.read(out);
        self.source_fault = res.is_err();
        res
    }
}

impl<R> BufferedStream<R> {
    /// Unread bytes currently held in the buffer.
    pub fn buffer(&self) -> &[u8] {
        &self.buf[self.pos..self.filled]
    }

    pub fn capacity(&self) -> usize {
        self.buf.len()
    }

    pub fn get_ref(&self) -> &R {
        &self.inner
    }

    /// Reading from the source directly skips anything still buffered.
    pub fn get_mut(&mut self) -> &mut R {
        &mut self.inner
    }

    /// Unwrap the source. Buffered bytes are lost.
    pub fn into_inner(self) -> R {
        self.inner
    }

    /// Release the source. Closes the wrapped source, never this layer again.
    pub fn close(self) -> io::Result<()>
    where
        R: Close,
    {
        self.inner.close()
    }

    pub(crate) fn take_source_fault(&mut self) -> bool {
        std::mem::take(&mut self.source_fault)
    }

    fn compact(&mut self) {
        self.buf.copy_within(self.pos..self.filled, 0);
        self.filled -= self.pos;
        self.pos = 0;
    }
}

impl<R: Read> Read for BufferedStream<R> {
    fn read(&mut self, out: &mut [u8]) -> io::Result<usize> {
        // Nothing buffered and a big destination: skip the copy.
        if self.pos == self.filled && out.len() >= self.buf.len() {
            self.pos = 0;
            self.filled = 0;
            return self.pull_direct(out);
        }
        let n = {
            let avail = self.fill_buf()?;
            let n = avail.len().min(out.len());
            out[..n].copy_from_slice(&avail[..n]);
            n
        };
        self.consume(n);
        Ok(n)
    }
}

impl<R: Read> BufRead for BufferedStream<R> {
    fn fill_buf(&mut self) -> io::Result<&[u8]> {
        if self.pos >= self.filled {
            self.pos = 0;
            self.filled = 0;
            self.pull()?;
        }
        Ok(&self.buf[self.pos..self.filled])
    }

    fn consume(&mut self, amt: usize) {
        self.pos = (self.pos + amt).min(self.filled);
    }
}

impl<R: Close> Close for BufferedStream<R> {
    fn close(self) -> io::Result<()> {
        self.inner.close()
    }
}

impl<R: fmt::Debug> fmt::Debug for BufferedStream<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BufferedStream")
            .field("inner", &self.inner)
            .field("buffered", &format_args!("{}/{}", self.filled - self.pos, self.buf.len()))
            .finish()
    }
}
