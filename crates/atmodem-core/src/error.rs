//! Error types for atmodem.
//!
//! All fallible operations across the workspace return [`Result<T>`], which
//! uses [`Error`] as the error type. Transport-layer and protocol-layer
//! failures are all captured here.

/// The error type for all atmodem operations.
///
/// Variants cover the failure modes encountered when talking to a modem's
/// AT command port: device-open failures, transport errors, response
/// timeouts, and malformed replies.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A transport-level error (serial port gone, line error).
    #[error("transport error: {0}")]
    Transport(String),

    /// No response terminator was observed within the full retry budget.
    ///
    /// Carries the command that was sent and everything read across all
    /// attempts, so the failure can be diagnosed from the error alone.
    /// This typically means the modem is still booting, the wrong device
    /// node was given, or the command is not supported by this firmware.
    #[error(
        "timeout waiting for response to {:?}: read {:?}",
        String::from_utf8_lossy(.command),
        String::from_utf8_lossy(.history)
    )]
    Timeout {
        /// The command bytes that were sent (including the trailing `\r`).
        command: Vec<u8>,
        /// Everything read across all attempts, in order.
        history: Vec<u8>,
    },

    /// A single bounded read produced no data before its deadline.
    ///
    /// Used between the transport and the transaction engine; the engine
    /// converts read-level timeouts into retries and ultimately into
    /// [`Error::Timeout`]. Callers of the engine never see this variant.
    #[error("read timed out")]
    ReadTimeout,

    /// The response did not contain the expected prefix, or carried no
    /// value after it. Malformed replies are not retried.
    #[error("invalid response: {0:?}")]
    InvalidResponse(String),

    /// The device could not be opened within the bounded retry budget.
    #[error("failed to open {device} after {attempts} attempts: {reason}")]
    Open {
        /// Path of the device node that was being opened.
        device: String,
        /// Number of open attempts made before giving up.
        attempts: u32,
        /// The last underlying open error.
        reason: String,
    },

    /// No connection to the modem has been established.
    #[error("not connected")]
    NotConnected,

    /// The connection to the modem was lost unexpectedly.
    #[error("connection lost")]
    ConnectionLost,

    /// An underlying I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// A convenience `Result` alias using [`Error`] as the error type.
pub type Result<T> = std::result::Result<T, Error>;
