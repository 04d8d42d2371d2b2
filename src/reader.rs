use crate::buffered::BufferedStream;
use crate::close::Close;
use crate::error::{CloseLayer, ReaderzError};
use crate::options::{DetectOptions, Members};
use crate::util::{GZIP_MAGIC, has_gzip_magic};

use flate2::GzHeader;
use flate2::bufread::{GzDecoder, MultiGzDecoder};
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Plain,
    Gzip,
}

/// A stream that is either passed through or gzip-decoded, decided once from
/// the first two bytes.
#[derive(Debug)]
pub enum MaybeGzip<R> {
    Plain(BufferedStream<R>),
    Gzip(GzipStream<R>),
}

/// Open `raw` with default options. See [`MaybeGzip::with_options`].
pub fn open<R: Read + Close>(raw: R) -> Result<MaybeGzip<R>, ReaderzError> {
    MaybeGzip::with_options(raw, &DetectOptions::default())
}

pub fn open_with<R: Read + Close>(
    raw: R,
    opts: &DetectOptions,
) -> Result<MaybeGzip<R>, ReaderzError> {
    MaybeGzip::with_options(raw, opts)
}

/// Open a file and detect gzip by content. The extension is ignored.
pub fn open_path<P: AsRef<Path>>(path: P) -> Result<MaybeGzip<File>, ReaderzError> {
    let path = path.as_ref();
    let f = File::open(path)?;
    log::debug!("opened {}", path.display());
    open(f)
}

impl<R: Read + Close> MaybeGzip<R> {
    pub fn new(raw: R) -> Result<Self, ReaderzError> {
        Self::with_options(raw, &DetectOptions::default())
    }

    /// Peek at the first two bytes of `raw` and pick a mode.
    ///
    /// Fails with [`ReaderzError::ShortRead`] on inputs shorter than two bytes,
    /// [`ReaderzError::Io`] if the source fails, and
    /// [`ReaderzError::DecompressionInit`] if the magic matches but the gzip
    /// header does not parse. The source is released before any error is
    /// returned.
    pub fn with_options(raw: R, opts: &DetectOptions) -> Result<Self, ReaderzError> {
        let mut buffered = BufferedStream::with_capacity(opts.capacity, raw);
        let is_gzip = match buffered.peek(GZIP_MAGIC.len()).map(has_gzip_magic) {
            Ok(is_gzip) => is_gzip,
            Err(err) => return Err(release_after(buffered, err)),
        };

        if !is_gzip {
            log::debug!("no gzip magic, passing stream through");
            return Ok(MaybeGzip::Plain(buffered));
        }

        log::debug!("gzip magic found, decoding {:?} member(s)", opts.members);
        let mut stream = GzipStream::new(buffered, opts.members);
        match stream.check_header() {
            Ok(()) => Ok(MaybeGzip::Gzip(stream)),
            Err(err) => Err(release_after(stream.into_inner(), err)),
        }
    }

    /// Release every layer: the engine first, then the source.
    ///
    /// Both releases are attempted. An engine error wins over a source error.
    pub fn close(self) -> Result<(), ReaderzError> {
        match self {
            MaybeGzip::Plain(buffered) => buffered
                .close()
                .map_err(|e| ReaderzError::close_err(CloseLayer::Source, e)),
            MaybeGzip::Gzip(stream) => stream.close(),
        }
    }
}

impl<R> MaybeGzip<R> {
    pub fn mode(&self) -> Mode {
        match self {
            MaybeGzip::Plain(_) => Mode::Plain,
            MaybeGzip::Gzip(_) => Mode::Gzip,
        }
    }

    #[inline]
    pub fn is_gzip(&self) -> bool {
        self.mode() == Mode::Gzip
    }

    /// The parsed gzip header, if decoding.
    pub fn header(&self) -> Option<&GzHeader> {
        match self {
            MaybeGzip::Plain(_) => None,
            MaybeGzip::Gzip(stream) => stream.header(),
        }
    }

    pub fn get_ref(&self) -> &R {
        match self {
            MaybeGzip::Plain(buffered) => buffered.get_ref(),
            MaybeGzip::Gzip(stream) => stream.get_ref().get_ref(),
        }
    }
}

impl<R: Read> Read for MaybeGzip<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            MaybeGzip::Plain(buffered) => buffered.read(buf),
            MaybeGzip::Gzip(stream) => stream.read(buf),
        }
    }
}

impl<R: Read + Close> Close for MaybeGzip<R> {
    fn close(self) -> io::Result<()> {
        MaybeGzip::close(self).map_err(ReaderzError::into_io)
    }
}

fn release_after<R: Close>(buffered: BufferedStream<R>, err: ReaderzError) -> ReaderzError {
    if let Err(close_err) = buffered.close() {
        log::warn!("failed to release source after detection error ({err}): {close_err}");
    }
    err
}

#[derive(Debug)]
enum Engine<R> {
    Single(GzDecoder<BufferedStream<R>>),
    Multi(MultiGzDecoder<BufferedStream<R>>),
}

impl<R: Read> Engine<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            Engine::Single(dec) => dec.read(buf),
            Engine::Multi(dec) => dec.read(buf),
        }
    }
}

impl<R> Engine<R> {
    fn header(&self) -> Option<&GzHeader> {
        match self {
            Engine::Single(dec) => dec.header(),
            Engine::Multi(dec) => dec.header(),
        }
    }

    fn get_ref(&self) -> &BufferedStream<R> {
        match self {
            Engine::Single(dec) => dec.get_ref(),
            Engine::Multi(dec) => dec.get_ref(),
        }
    }

    fn get_mut(&mut self) -> &mut BufferedStream<R> {
        match self {
            Engine::Single(dec) => dec.get_mut(),
            Engine::Multi(dec) => dec.get_mut(),
        }
    }

    fn into_inner(self) -> BufferedStream<R> {
        match self {
            Engine::Single(dec) => dec.into_inner(),
            Engine::Multi(dec) => dec.into_inner(),
        }
    }
}

/// The gzip engine layered over a [`BufferedStream`].
///
/// Keeps the first decompression failure; [`GzipStream::close`] reports it.
#[derive(Debug)]
pub struct GzipStream<R> {
    engine: Engine<R>,
    failure: Option<(io::ErrorKind, String)>,
}

impl<R: Read> GzipStream<R> {
    fn new(inner: BufferedStream<R>, members: Members) -> Self {
        let engine = match members {
            Members::Single => Engine::Single(GzDecoder::new(inner)),
            Members::Multi => Engine::Multi(MultiGzDecoder::new(inner)),
        };
        Self {
            engine,
            failure: None,
        }
    }

    /// flate2 parses the header in `new` and holds any error until the next
    /// read. An empty read surfaces it without producing output.
    fn check_header(&mut self) -> Result<(), ReaderzError> {
        if self.engine.header().is_some() {
            return Ok(());
        }
        match self.engine.read(&mut []) {
            Ok(_) => Ok(()),
            Err(e) if self.engine.get_mut().take_source_fault() => Err(ReaderzError::Io(e)),
            Err(e) => Err(ReaderzError::DecompressionInit(e)),
        }
    }
}

impl<R> GzipStream<R> {
    pub fn header(&self) -> Option<&GzHeader> {
        self.engine.header()
    }

    pub fn get_ref(&self) -> &BufferedStream<R> {
        self.engine.get_ref()
    }

    /// Drop the engine and hand back the buffered stream beneath it.
    pub fn into_inner(self) -> BufferedStream<R> {
        self.engine.into_inner()
    }

    /// Close the engine, then the buffered stream. The source is released even
    /// when the engine reports an error.
    ///
    /// An engine error is rebuilt from the kind and message of the first
    /// failure seen on read; its `source()` chain is not preserved.
    pub fn close(self) -> Result<(), ReaderzError>
    where
        R: Close,
    {
        let GzipStream { engine, failure } = self;
        let engine_res = match failure {
            Some((kind, msg)) => Err(io::Error::new(kind, msg)),
            None => Ok(()),
        };
        let source_res = engine.into_inner().close();
        engine_res.map_err(|e| ReaderzError::close_err(CloseLayer::Engine, e))?;
        source_res.map_err(|e| ReaderzError::close_err(CloseLayer::Source, e))
    }
}

impl<R: Read> Read for GzipStream<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self.engine.read(buf) {
            Ok(n) => Ok(n),
            // Source failures pass through unchanged.
            Err(e) if self.engine.get_mut().take_source_fault() => Err(e),
            Err(e) => {
                if self.failure.is_none() {
                    self.failure = Some((e.kind(), e.to_string()));
                }
                Err(ReaderzError::Decompression(e).into_io())
            }
        }
    }
}
