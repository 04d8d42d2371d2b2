//! Transparent gzip detection for closable byte streams.
//!
//! - Peeks the first two bytes without consuming them.
//! - `1F 8B` (gzip magic): decodes through flate2, concatenated members included.
//! - Anything else: bytes pass through untouched, magic position included.
//! - Closing the returned handle closes every layer, engine first, source last.
//! - `zlib` feature for the system zlib backend; async API behind `async`.

pub mod buffered;
pub mod close;
pub mod error;
pub mod options;
pub mod reader;
mod util;

#[cfg(feature = "async")]
pub mod async_reader;

pub use crate::buffered::BufferedStream;
pub use crate::close::{Close, WithClose, with_close};
pub use crate::error::{CloseLayer, ReaderzError, is_wrapped};
pub use crate::options::{DEFAULT_CAPACITY, DetectOptions, MIN_CAPACITY, Members};
pub use crate::reader::{GzipStream, MaybeGzip, Mode, open, open_path, open_with};
pub use crate::util::{GZIP_MAGIC, has_gzip_magic};

#[cfg(feature = "async")]
pub use crate::async_reader::{AsyncMaybeGzip, open_async, open_async_with, open_path_async};
