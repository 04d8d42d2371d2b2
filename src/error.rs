use std::fmt;
use std::io;
use thiserror::Error;

/// Which layer failed to release during `close`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseLayer {
    /// The gzip engine (reports a decompression failure seen while reading).
    Engine,
    /// The raw source beneath the buffer.
    Source,
}

impl fmt::Display for CloseLayer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CloseLayer::Engine => f.write_str("gzip engine"),
            CloseLayer::Source => f.write_str("raw source"),
        }
    }
}

#[derive(Debug, Error)]
pub enum ReaderzError {
    #[error("short read: needed {needed} bytes, stream ended after {available}")]
    ShortRead { needed: usize, available: usize },
    /// Failure of the raw source, passed through untouched.
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error("gzip header rejected: {0}")]
    DecompressionInit(#[source] io::Error),
    #[error("gzip stream corrupt: {0}")]
    Decompression(#[source] io::Error),
    #[error("failed to close {layer}: {source}")]
    Close {
        layer: CloseLayer,
        #[source]
        source: io::Error,
    },
}

impl ReaderzError {
    pub(crate) fn close_err(layer: CloseLayer, source: io::Error) -> Self {
        Self::Close { layer, source }
    }

    /// Convert into an `io::Error` for use behind `io::Read`.
    ///
    /// `Io` is unwrapped as-is, every other variant is boxed so that
    /// [`ReaderzError::from_io`] can recover it.
    pub fn into_io(self) -> io::Error {
        let kind = match &self {
            ReaderzError::Io(e) => e.kind(),
            ReaderzError::ShortRead { .. } => io::ErrorKind::UnexpectedEof,
            ReaderzError::DecompressionInit(_) | ReaderzError::Decompression(_) => {
                io::ErrorKind::InvalidData
            }
            ReaderzError::Close { source, .. } => source.kind(),
        };
        match self {
            ReaderzError::Io(e) => e,
            other => io::Error::new(kind, other),
        }
    }

    /// Recover a typed error from an `io::Error` returned by one of our readers.
    /// Errors that did not originate here come back as `Io`.
    pub fn from_io(err: io::Error) -> Self {
        if !is_wrapped(&err) {
            return ReaderzError::Io(err);
        }
        match err.into_inner().map(|inner| inner.downcast::<ReaderzError>()) {
            Some(Ok(typed)) => *typed,
            // is_wrapped checked the payload type
            Some(Err(other)) => ReaderzError::Io(io::Error::other(other)),
            None => ReaderzError::Io(io::Error::other("empty error payload")),
        }
    }
}

/// True if `err` carries a [`ReaderzError`] produced by this crate.
pub fn is_wrapped(err: &io::Error) -> bool {
    err.get_ref()
        .map(|inner| inner.is::<ReaderzError>())
        .unwrap_or(false)
}
