//! The byte-stream abstraction a [`crate::messenger::Messenger`] drives.
//!
//! The core ships exactly one concrete binding, a blocking adapter over
//! `std::net::TcpStream`, and leaves every other binding (non-blocking,
//! TLS-wrapped, in-memory) to implementations of the trait.

use std::io::{self, Read, Write};
use std::net::TcpStream;
use std::time::Duration;

use crate::error::TransportError;

/// Whether a [`Transport::read`] call should return as soon as any bytes
/// are available, or block until the buffer is fully populated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadMode {
    /// Return as soon as at least one byte has been read.
    Once,
    /// Block until `buf` is completely filled (or the stream closes).
    Exact,
}

/// The minimal byte-stream a messenger needs: wait, read, write, flush,
/// close, and an emptiness check used to decide keep-alive idle waits.
pub trait Transport {
    /// Blocks up to `timeout` for readable data; returns `false` on
    /// timeout, `true` if data (or EOF) is ready.
    fn wait_for_data(&mut self, timeout: Duration) -> Result<bool, TransportError>;

    /// Reads into `buf` per `mode`, returning the number of bytes read (0
    /// at EOF).
    fn read(&mut self, buf: &mut [u8], mode: ReadMode) -> Result<usize, TransportError>;

    /// Writes all of `bytes`.
    fn write(&mut self, bytes: &[u8]) -> Result<(), TransportError>;

    /// Flushes any buffered output.
    fn flush(&mut self) -> Result<(), TransportError>;

    /// Closes the transport. Idempotent.
    fn close(&mut self) -> Result<(), TransportError>;

    /// True if the peer has closed its write half and no bytes remain
    /// buffered for reading.
    fn is_empty(&mut self) -> Result<bool, TransportError>;
}

/// A blocking adapter over `std::net::TcpStream`.
pub struct TcpTransport {
    stream: TcpStream,
}

impl TcpTransport {
    /// Wraps an already-connected stream.
    pub fn new(stream: TcpStream) -> Self {
        TcpTransport { stream }
    }
}

impl Transport for TcpTransport {
    fn wait_for_data(&mut self, timeout: Duration) -> Result<bool, TransportError> {
        self.stream.set_read_timeout(Some(timeout))?;
        let mut probe = [0u8; 1];
        match self.stream.peek(&mut probe) {
            Ok(_) => Ok(true),
            Err(e) if e.kind() == io::ErrorKind::WouldBlock || e.kind() == io::ErrorKind::TimedOut => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    fn read(&mut self, buf: &mut [u8], mode: ReadMode) -> Result<usize, TransportError> {
        self.stream.set_read_timeout(None)?;
        match mode {
            ReadMode::Once => {
                let n = self.stream.read(buf)?;
                Ok(n)
            }
            ReadMode::Exact => {
                self.stream.read_exact(buf).map_err(|e| {
                    if e.kind() == io::ErrorKind::UnexpectedEof {
                        TransportError::Closed
                    } else {
                        TransportError::Io(e)
                    }
                })?;
                Ok(buf.len())
            }
        }
    }

    fn write(&mut self, bytes: &[u8]) -> Result<(), TransportError> {
        self.stream.write_all(bytes)?;
        Ok(())
    }

    fn flush(&mut self) -> Result<(), TransportError> {
        self.stream.flush()?;
        Ok(())
    }

    fn close(&mut self) -> Result<(), TransportError> {
        let _ = self.stream.shutdown(std::net::Shutdown::Both);
        Ok(())
    }

    fn is_empty(&mut self) -> Result<bool, TransportError> {
        let mut probe = [0u8; 1];
        self.stream.set_nonblocking(true)?;
        let result = match self.stream.peek(&mut probe) {
            Ok(0) => Ok(true),
            Ok(_) => Ok(false),
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => Ok(true),
            Err(e) => Err(e.into()),
        };
        self.stream.set_nonblocking(false)?;
        result
    }
}

/// An in-memory transport used only by the test harness: an input queue a
/// test fills up front, and an output buffer a test inspects afterward.
#[derive(Debug, Default)]
pub struct MemoryTransport {
    input: std::collections::VecDeque<u8>,
    pub output: Vec<u8>,
    closed: bool,
}

impl MemoryTransport {
    /// An empty transport with no queued input.
    pub fn new() -> Self {
        MemoryTransport::default()
    }

    /// Queues `bytes` to be returned by future `read` calls.
    pub fn feed(&mut self, bytes: &[u8]) {
        self.input.extend(bytes.iter().copied());
    }
}

impl Transport for MemoryTransport {
    fn wait_for_data(&mut self, _timeout: Duration) -> Result<bool, TransportError> {
        Ok(!self.input.is_empty())
    }

    fn read(&mut self, buf: &mut [u8], mode: ReadMode) -> Result<usize, TransportError> {
        match mode {
            ReadMode::Once => {
                let n = buf.len().min(self.input.len());
                for slot in buf.iter_mut().take(n) {
                    *slot = self.input.pop_front().unwrap();
                }
                Ok(n)
            }
            ReadMode::Exact => {
                if self.input.len() < buf.len() {
                    return Err(TransportError::Closed);
                }
                for slot in buf.iter_mut() {
                    *slot = self.input.pop_front().unwrap();
                }
                Ok(buf.len())
            }
        }
    }

    fn write(&mut self, bytes: &[u8]) -> Result<(), TransportError> {
        self.output.extend_from_slice(bytes);
        Ok(())
    }

    fn flush(&mut self) -> Result<(), TransportError> {
        Ok(())
    }

    fn close(&mut self) -> Result<(), TransportError> {
        self.closed = true;
        Ok(())
    }

    fn is_empty(&mut self) -> Result<bool, TransportError> {
        Ok(self.input.is_empty())
    }
}
