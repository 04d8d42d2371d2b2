//! The release half of a raw stream source.
//!
//! `std::io::Read` has no notion of closing: sources are released on drop. Streams
//! handed to [`crate::MaybeGzip`] need an explicit, fallible release that can be
//! chained from the outermost wrapper down to the source, which is what [`Close`]
//! provides.

use std::fmt;
use std::fs::File;
use std::io::{self, Cursor, Empty, Read, Stdin};
use std::process::ChildStdout;

/// Explicit release of a byte source. Consumes the value, so it runs at most once.
pub trait Close {
    fn close(self) -> io::Result<()>;
}

impl Close for File {
    /// Dropping a `File` closes the descriptor; errors from `close(2)` are not
    /// observable through std.
    fn close(self) -> io::Result<()> {
        drop(self);
        Ok(())
    }
}

impl<T> Close for Cursor<T> {
    fn close(self) -> io::Result<()> {
        Ok(())
    }
}

impl Close for &[u8] {
    fn close(self) -> io::Result<()> {
        Ok(())
    }
}

impl Close for Empty {
    fn close(self) -> io::Result<()> {
        Ok(())
    }
}

impl Close for Stdin {
    fn close(self) -> io::Result<()> {
        Ok(())
    }
}

impl Close for ChildStdout {
    fn close(self) -> io::Result<()> {
        drop(self);
        Ok(())
    }
}

impl<T: Close> Close for Box<T> {
    fn close(self) -> io::Result<()> {
        (*self).close()
    }
}

/// A reader paired with a release callback.
///
/// Use it for sources whose release is not tied to drop: pooled connections,
/// sockets that need a shutdown, or anything that must report how release went.
pub struct WithClose<R, F> {
    inner: R,
    release: F,
}

/// Pair `reader` with `release`, which runs once when the pair is closed.
pub fn with_close<R, F>(reader: R, release: F) -> WithClose<R, F>
where
    R: Read,
    F: FnOnce(R) -> io::Result<()>,
{
    WithClose {
        inner: reader,
        release,
    }
}

impl<R, F> WithClose<R, F> {
    pub fn get_ref(&self) -> &R {
        &self.inner
    }

    pub fn get_mut(&mut self) -> &mut R {
        &mut self.inner
    }
}

impl<R: Read, F> Read for WithClose<R, F> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.inner.read(buf)
    }
}

impl<R, F> Close for WithClose<R, F>
where
    F: FnOnce(R) -> io::Result<()>,
{
    fn close(self) -> io::Result<()> {
        (self.release)(self.inner)
    }
}

impl<R: fmt::Debug, F> fmt::Debug for WithClose<R, F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WithClose")
            .field("inner", &self.inner)
            .finish_non_exhaustive()
    }
}
