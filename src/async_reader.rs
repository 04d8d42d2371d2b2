#![cfg(feature = "async")]

use crate::error::ReaderzError;
use crate::options::{DetectOptions, MIN_CAPACITY, Members};
use crate::util::{GZIP_MAGIC, has_gzip_magic};

use async_compression::tokio::bufread::GzipDecoder;
use std::io::Cursor;
use std::path::Path;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::fs::File;
use tokio::io::{self, AsyncRead, AsyncReadExt, BufReader, Chain, ReadBuf};

/// Fixed part of a gzip member header: ID1 ID2 CM FLG MTIME(4) XFL OS.
const GZIP_FIXED_HEADER: usize = 10;
const CM_DEFLATE: u8 = 8;
const FLG_RESERVED: u8 = 0xE0;

/// The source with the bytes read during detection put back in front.
type Prefixed<R> = BufReader<Chain<Cursor<Vec<u8>>, Tracked<R>>>;

/// Async counterpart of [`crate::MaybeGzip`].
///
/// Tokio readers have no close; the source is released on drop or handed back
/// by [`AsyncMaybeGzip::into_inner`]. The fixed gzip header is checked at
/// construction, optional header fields and the body on read.
pub enum AsyncMaybeGzip<R> {
    Plain(Prefixed<R>),
    Gzip(GzipDecoder<Prefixed<R>>),
}

/// Remembers whether the last read from the source failed, so decoder errors
/// can be told apart from source errors.
pub struct Tracked<R> {
    inner: R,
    fault: bool,
}

impl<R: AsyncRead + Unpin> AsyncRead for Tracked<R> {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        let this = self.get_mut();
        let res = Pin::new(&mut this.inner).poll_read(cx, buf);
        if let Poll::Ready(r) = &res {
            this.fault = r.is_err();
        }
        res
    }
}

pub async fn open_async<R>(raw: R) -> Result<AsyncMaybeGzip<R>, ReaderzError>
where
    R: AsyncRead + Unpin,
{
    open_async_with(raw, &DetectOptions::default()).await
}

/// Read from `raw` until `head` holds `want` bytes. Returns how many were read
/// if the source ended first.
async fn fill_head<R>(raw: &mut R, head: &mut Vec<u8>, want: usize) -> io::Result<Option<usize>>
where
    R: AsyncRead + Unpin,
{
    let mut chunk = [0u8; GZIP_FIXED_HEADER];
    while head.len() < want {
        let missing = want - head.len();
        match raw.read(&mut chunk[..missing]).await {
            Ok(0) => return Ok(Some(head.len())),
            Ok(n) => head.extend_from_slice(&chunk[..n]),
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(None)
}

pub async fn open_async_with<R>(
    mut raw: R,
    opts: &DetectOptions,
) -> Result<AsyncMaybeGzip<R>, ReaderzError>
where
    R: AsyncRead + Unpin,
{
    let mut head = Vec::with_capacity(GZIP_FIXED_HEADER);
    if let Some(available) = fill_head(&mut raw, &mut head, GZIP_MAGIC.len()).await? {
        return Err(ReaderzError::ShortRead {
            needed: GZIP_MAGIC.len(),
            available,
        });
    }

    let is_gzip = has_gzip_magic(&head);
    if is_gzip {
        if fill_head(&mut raw, &mut head, GZIP_FIXED_HEADER).await?.is_some() {
            return Err(ReaderzError::DecompressionInit(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "truncated gzip header",
            )));
        }
        if head[2] != CM_DEFLATE || head[3] & FLG_RESERVED != 0 {
            return Err(ReaderzError::DecompressionInit(io::Error::new(
                io::ErrorKind::InvalidData,
                format!(
                    "invalid gzip header: method {:#04x}, flags {:#04x}",
                    head[2], head[3]
                ),
            )));
        }
    }

    let tracked = Tracked {
        inner: raw,
        fault: false,
    };
    let stream = BufReader::with_capacity(
        opts.capacity.max(MIN_CAPACITY),
        Cursor::new(head).chain(tracked),
    );

    if !is_gzip {
        log::debug!("no gzip magic, passing async stream through");
        return Ok(AsyncMaybeGzip::Plain(stream));
    }

    log::debug!("gzip magic found, decoding {:?} member(s)", opts.members);
    let mut dec = GzipDecoder::new(stream);
    dec.multiple_members(opts.members == Members::Multi);
    Ok(AsyncMaybeGzip::Gzip(dec))
}

pub async fn open_path_async<P: AsRef<Path>>(
    path: P,
) -> Result<AsyncMaybeGzip<File>, ReaderzError> {
    let f = File::open(path.as_ref()).await?;
    open_async(f).await
}

impl<R> AsyncMaybeGzip<R> {
    #[inline]
    pub fn is_gzip(&self) -> bool {
        matches!(self, AsyncMaybeGzip::Gzip(_))
    }
}

impl<R: AsyncRead + Unpin> AsyncMaybeGzip<R> {
    /// Unwrap the source. Buffered and already-peeked bytes are lost.
    pub fn into_inner(self) -> R {
        let prefixed = match self {
            AsyncMaybeGzip::Plain(stream) => stream,
            AsyncMaybeGzip::Gzip(dec) => dec.into_inner(),
        };
        let (_, tracked) = prefixed.into_inner().into_inner();
        tracked.inner
    }
}

impl<R: AsyncRead + Unpin> AsyncRead for AsyncMaybeGzip<R> {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        match self.get_mut() {
            AsyncMaybeGzip::Plain(stream) => Pin::new(stream).poll_read(cx, buf),
            AsyncMaybeGzip::Gzip(dec) => match Pin::new(&mut *dec).poll_read(cx, buf) {
                Poll::Ready(Err(e)) => {
                    let (_, tracked) = dec.get_mut().get_mut().get_mut();
                    if std::mem::take(&mut tracked.fault) {
                        // Source failures pass through unchanged.
                        Poll::Ready(Err(e))
                    } else {
                        Poll::Ready(Err(ReaderzError::Decompression(e).into_io()))
                    }
                }
                other => other,
            },
        }
    }
}
