#![allow(dead_code)]

use flate2::Compression;
use flate2::write::GzEncoder;
use readerz::Close;
use std::cell::Cell;
use std::io::{self, Cursor, Read, Write};
use std::rc::Rc;

pub fn gzip(data: &[u8]) -> Vec<u8> {
    let mut enc = GzEncoder::new(Vec::new(), Compression::fast());
    enc.write_all(data).unwrap();
    enc.finish().unwrap()
}

/// Deterministic, mildly compressible filler.
pub fn sample(len: usize) -> Vec<u8> {
    (0..len).map(|i| ((i * 31) % 251) as u8 ^ (i / 7) as u8).collect()
}

/// In-memory source that records how often it was released.
pub struct Recorder {
    data: Cursor<Vec<u8>>,
    chunk: usize,
    fail_after: Option<usize>,
    fail_close: bool,
    closes: Rc<Cell<usize>>,
}

impl Recorder {
    pub fn new(data: impl Into<Vec<u8>>) -> (Self, Rc<Cell<usize>>) {
        let closes = Rc::new(Cell::new(0));
        let rec = Recorder {
            data: Cursor::new(data.into()),
            chunk: usize::MAX,
            fail_after: None,
            fail_close: false,
            closes: closes.clone(),
        };
        (rec, closes)
    }

    /// Hand out at most `n` bytes per read.
    pub fn trickle(mut self, n: usize) -> Self {
        self.chunk = n;
        self
    }

    /// Fail with `ConnectionReset` once `n` bytes have been delivered.
    pub fn fail_after(mut self, n: usize) -> Self {
        self.fail_after = Some(n);
        self
    }

    pub fn fail_close(mut self) -> Self {
        self.fail_close = true;
        self
    }
}

impl Read for Recorder {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let pos = self.data.position() as usize;
        let mut limit = buf.len().min(self.chunk);
        if let Some(n) = self.fail_after {
            if pos >= n {
                return Err(io::Error::new(io::ErrorKind::ConnectionReset, "source went away"));
            }
            limit = limit.min(n - pos);
        }
        self.data.read(&mut buf[..limit])
    }
}

impl Close for Recorder {
    fn close(self) -> io::Result<()> {
        self.closes.set(self.closes.get() + 1);
        if self.fail_close {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "release failed"))
        } else {
            Ok(())
        }
    }
}
