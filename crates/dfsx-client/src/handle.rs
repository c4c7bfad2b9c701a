//! Per-open-file handle.

use std::io::{self, Read, Seek, SeekFrom, Write};

use dfsx_core::{Endpoint, LastModified};

use crate::buffer::SpillBuffer;

/// The access mode a [`Handle`] was opened with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Read-only: the buffer is pre-populated from the storage node and never
    /// written back.
    Read,
    /// Write-only: starts from an empty buffer (truncate) and commits on flush.
    Write,
    /// Append: starts from the existing contents (or empty, if absent) and
    /// commits the full buffer on flush.
    Append,
}

impl Mode {
    /// True for modes that acquire a lease and commit on flush.
    pub fn writes(self) -> bool {
        matches!(self, Mode::Write | Mode::Append)
    }

    /// True for modes that need the file's current contents fetched at open time.
    pub fn needs_read(self) -> bool {
        matches!(self, Mode::Read | Mode::Append)
    }
}

/// A per-open-file object: target path, access mode, the storage endpoint
/// serving it, an optional lease, the buffered body, and the last-known
/// cache token.
///
/// Owned exclusively by its opening caller and closed exactly once; the
/// [`crate::session::Session`] that produced it is also the one that can
/// flush or close it, since those operations cross service boundaries.
pub struct Handle {
    pub(crate) path: String,
    pub(crate) mode: Mode,
    pub(crate) endpoint: Endpoint,
    pub(crate) lease_id: Option<u64>,
    pub(crate) buffer: SpillBuffer,
    pub(crate) last_modified: Option<LastModified>,
    pub(crate) cache: bool,
    /// Set once this handle's first successful commit has run. A second
    /// commit (e.g. from a second `close`) must be a no-op: it neither
    /// re-PUTs the body nor re-revokes the (already-gone) lease.
    pub(crate) flushed: bool,
}

impl Handle {
    /// The path this handle was opened for.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// The mode this handle was opened with.
    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// The storage endpoint serving this handle's file.
    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    /// The currently held lease id, if any.
    pub fn lease_id(&self) -> Option<u64> {
        self.lease_id
    }

    /// The last `Last-Modified` token observed from the server, if any.
    pub fn last_modified(&self) -> Option<&LastModified> {
        self.last_modified.as_ref()
    }

    /// Reads buffered bytes into `buf`, like [`Read::read`].
    pub fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.buffer.read(buf)
    }

    /// Writes `buf` into the local buffer, like [`Write::write`].
    ///
    /// Contacts no server: writes mutate only the local buffer.
    pub fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.buffer.write(buf)
    }

    /// Seeks within the local buffer, like [`Seek::seek`].
    pub fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        self.buffer.seek(pos)
    }
}

impl Read for Handle {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        Handle::read(self, buf)
    }
}

impl Write for Handle {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        Handle::write(self, buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.buffer.flush()
    }
}

impl Seek for Handle {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        Handle::seek(self, pos)
    }
}
