//! An append-only byte buffer with a rewindable read cursor.

use bytes::{Bytes, BytesMut};

/// The unread length of a [`Body`]: either a known byte count or
/// [`KnownLength::Unknown`] for streaming sources the core does not
/// otherwise support.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KnownLength {
    /// The exact number of unread bytes remaining.
    Bytes(usize),
    /// The length cannot be determined up front.
    Unknown,
}

/// A sequence of byte chunks with a total length and a monotonically
/// advancing read offset.
///
/// All operations on an in-memory `Body` are infallible: there is no failure
/// mode for appending or reading bytes already held in memory.
#[derive(Debug, Clone, Default)]
pub struct Body {
    data: BytesMut,
    read_offset: usize,
}

impl Body {
    /// An empty body.
    pub fn empty() -> Self {
        Body::default()
    }

    /// Builds a body already containing `bytes`, with the read cursor at 0.
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        Body {
            data: BytesMut::from(bytes.into().as_slice()),
            read_offset: 0,
        }
    }

    /// Appends `chunk` to the end of the buffer. Does not move the read
    /// cursor.
    pub fn write(&mut self, chunk: &[u8]) {
        self.data.extend_from_slice(chunk);
    }

    /// The number of bytes not yet consumed by `read`.
    pub fn known_length(&self) -> KnownLength {
        KnownLength::Bytes(self.data.len() - self.read_offset)
    }

    /// The total number of bytes ever written, read or not.
    pub fn total_len(&self) -> usize {
        self.data.len()
    }

    /// True if there are no bytes at all.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Fills up to `dst.len()` bytes starting at the read cursor, advancing
    /// the cursor, and returns the number of bytes copied.
    pub fn read(&mut self, dst: &mut [u8]) -> usize {
        let available = &self.data[self.read_offset..];
        let n = available.len().min(dst.len());
        dst[..n].copy_from_slice(&available[..n]);
        self.read_offset += n;
        n
    }

    /// Resets the read cursor to the start of the buffer.
    pub fn rewind(&mut self) {
        self.read_offset = 0;
    }

    /// Materialises the entire buffer (read or not) as a single contiguous
    /// byte sequence.
    pub fn to_bytes(&self) -> Bytes {
        self.data.clone().freeze()
    }

    /// Discards all content, resetting the body to empty.
    pub fn clear(&mut self) {
        self.data.clear();
        self.read_offset = 0;
    }
}
