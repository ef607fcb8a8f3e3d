//! Explicit, typed server configuration.

use std::time::Duration;

/// Tunable limits and timeouts, mirroring the reference framework's
/// preference for a small explicit options struct over a stringly-typed
/// map. Construct with [`Config::new`] (equivalent to [`Config::default`])
/// and override fields with the builder methods.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config {
    max_header_bytes: usize,
    max_body_bytes: usize,
    header_read_timeout_seconds: u64,
    body_read_timeout_seconds: u64,
    initial_header_buffer: usize,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            max_header_bytes: 16 * 1024,
            max_body_bytes: 16 * 1024 * 1024,
            header_read_timeout_seconds: 120,
            body_read_timeout_seconds: 120,
            initial_header_buffer: 2 * 1024,
        }
    }
}

impl Config {
    /// The documented default configuration.
    pub fn new() -> Self {
        Config::default()
    }

    /// The header-section byte ceiling before `431` is returned.
    pub fn max_header_bytes(&self) -> usize {
        self.max_header_bytes
    }

    /// Overrides the header-section byte ceiling.
    pub fn set_max_header_bytes(&mut self, value: usize) -> &mut Self {
        self.max_header_bytes = value;
        self
    }

    /// The request-body byte ceiling before `413` is returned.
    pub fn max_body_bytes(&self) -> usize {
        self.max_body_bytes
    }

    /// Overrides the request-body byte ceiling.
    pub fn set_max_body_bytes(&mut self, value: usize) -> &mut Self {
        self.max_body_bytes = value;
        self
    }

    /// The idle timeout while waiting for header bytes.
    pub fn header_read_timeout(&self) -> Duration {
        Duration::from_secs(self.header_read_timeout_seconds)
    }

    /// Overrides the header read timeout, in seconds.
    pub fn set_header_read_timeout_seconds(&mut self, value: u64) -> &mut Self {
        self.header_read_timeout_seconds = value;
        self
    }

    /// The idle timeout while waiting for body bytes.
    pub fn body_read_timeout(&self) -> Duration {
        Duration::from_secs(self.body_read_timeout_seconds)
    }

    /// Overrides the body read timeout, in seconds.
    pub fn set_body_read_timeout_seconds(&mut self, value: u64) -> &mut Self {
        self.body_read_timeout_seconds = value;
        self
    }

    /// The initial size of the chunk read while waiting for the header
    /// section to complete; the read size doubles on each `NEED_MORE`, up
    /// to [`Config::max_header_bytes`].
    pub fn initial_header_buffer(&self) -> usize {
        self.initial_header_buffer
    }

    /// Overrides the initial header-buffer capacity.
    pub fn set_initial_header_buffer(&mut self, value: usize) -> &mut Self {
        self.initial_header_buffer = value;
        self
    }
}
