//! Spillover byte buffer backing an open [`crate::handle::Handle`].
//!
//! An open handle *is* a buffered byte container with an overflow-to-disk
//! policy, modeled here as composition rather than by subclassing a
//! spooled-file type (as the original Python's `SpooledTemporaryFile` base
//! class did): a `Handle` owns a `SpillBuffer` with a configured threshold
//! and delegates `Read`/`Write`/`Seek` to it.

use std::io::{self, Cursor, Read, Seek, SeekFrom, Write};

enum Inner {
    Memory(Cursor<Vec<u8>>),
    Spilled(std::fs::File),
}

/// A byte buffer that holds its contents in memory until it grows past
/// `threshold`, at which point it transparently spills to a temporary file.
pub struct SpillBuffer {
    inner: Inner,
    threshold: usize,
}

impl SpillBuffer {
    /// Creates an empty buffer that spills to disk once its contents exceed
    /// `threshold` bytes.
    pub fn new(threshold: usize) -> Self {
        Self {
            inner: Inner::Memory(Cursor::new(Vec::new())),
            threshold,
        }
    }

    /// Creates a buffer pre-populated with `data`, spilling immediately if
    /// `data` already exceeds the threshold.
    pub fn from_bytes(data: Vec<u8>, threshold: usize) -> io::Result<Self> {
        let mut buf = Self {
            inner: Inner::Memory(Cursor::new(data)),
            threshold,
        };
        if let Inner::Memory(cur) = &buf.inner {
            if cur.get_ref().len() > threshold {
                buf.spill()?;
            }
        }
        Ok(buf)
    }

    fn spill(&mut self) -> io::Result<()> {
        if let Inner::Memory(cur) = &self.inner {
            let pos = cur.position();
            let data = cur.get_ref().clone();
            let mut file = tempfile::tempfile()?;
            file.write_all(&data)?;
            file.seek(SeekFrom::Start(pos))?;
            self.inner = Inner::Spilled(file);
        }
        Ok(())
    }

    /// Returns true if this buffer has spilled to a temporary file.
    pub fn is_spilled(&self) -> bool {
        matches!(self.inner, Inner::Spilled(_))
    }

    /// Reads the entire buffer from the start, restoring the prior position.
    pub fn read_all_from_start(&mut self) -> io::Result<Vec<u8>> {
        let restore = self.stream_position()?;
        self.seek(SeekFrom::Start(0))?;
        let mut data = Vec::new();
        self.read_to_end(&mut data)?;
        self.seek(SeekFrom::Start(restore))?;
        Ok(data)
    }
}

impl Read for SpillBuffer {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match &mut self.inner {
            Inner::Memory(cur) => cur.read(buf),
            Inner::Spilled(file) => file.read(buf),
        }
    }
}

impl Write for SpillBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if let Inner::Memory(cur) = &self.inner {
            if cur.position() as usize + buf.len() > self.threshold {
                self.spill()?;
            }
        }
        match &mut self.inner {
            Inner::Memory(cur) => cur.write(buf),
            Inner::Spilled(file) => file.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match &mut self.inner {
            Inner::Memory(_) => Ok(()),
            Inner::Spilled(file) => file.flush(),
        }
    }
}

impl Seek for SpillBuffer {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        match &mut self.inner {
            Inner::Memory(cur) => cur.seek(pos),
            Inner::Spilled(file) => file.seek(pos),
        }
    }
}
