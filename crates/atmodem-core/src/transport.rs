//! Transport trait for modem communication.
//!
//! The [`Transport`] trait abstracts over the byte channel to the modem's
//! AT command port. Implementations exist for serial devices
//! (`atmodem-transport`) and for mock channels used in tests
//! (`atmodem-test-harness`).
//!
//! The AT transaction engine in `atmodem-at` operates on a `Transport`
//! rather than directly on a serial port, so the framing, timeout, and
//! retry logic can be tested deterministically without hardware.

use async_trait::async_trait;
use std::time::Duration;

use crate::error::Result;

/// Asynchronous byte-level transport to a modem.
///
/// Implementations handle the physical layer only. Response framing,
/// terminator detection, and retry policy are the transaction engine's
/// concern.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send raw bytes to the modem.
    ///
    /// Implementations should not return until all bytes have been handed
    /// to the underlying channel (serial TX buffer, mock queue, etc.).
    async fn send(&mut self, data: &[u8]) -> Result<()>;

    /// Receive bytes from the modem into the provided buffer.
    ///
    /// Returns the number of bytes actually read. Waits up to `timeout`
    /// for data to arrive; returns
    /// [`Error::ReadTimeout`](crate::error::Error::ReadTimeout) if nothing
    /// was received within the deadline. A single read may return any
    /// number of bytes -- a response can arrive split across several reads.
    async fn receive(&mut self, buf: &mut [u8], timeout: Duration) -> Result<usize>;

    /// Close the transport connection.
    ///
    /// After calling `close()`, subsequent `send()` and `receive()` calls
    /// should return [`Error::NotConnected`](crate::error::Error::NotConnected).
    async fn close(&mut self) -> Result<()>;

    /// Check whether the transport is currently connected.
    fn is_connected(&self) -> bool;
}
