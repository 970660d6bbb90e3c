//! atmodem-at: AT command protocol engine and modem driver.
//!
//! This crate implements the line-oriented AT command protocol spoken by
//! cellular modems over their serial command port. It provides:
//!
//! - **Protocol codec** ([`protocol`]) -- command encoding, `OK`-terminator
//!   framing over an accumulating byte buffer, and payload extraction from
//!   echoed or tagged responses.
//! - **Transaction engine** ([`engine`]) -- send one command and collect its
//!   terminated response within a bounded time, re-sending on timeout up to
//!   the policy's retry budget.
//! - **Command builders** ([`commands`]) -- construct the AT command byte
//!   sequences for the supported operations (GNSS control, non-volatile
//!   storage, identity reads) together with their timing policies.
//! - **Modem driver** ([`modem`]) -- high-level [`Modem`] type that ties the
//!   engine to a [`Transport`](atmodem_core::Transport).
//!
//! # Wire format
//!
//! Commands are ASCII terminated by `\r`. Responses are ASCII terminated by
//! the literal sequence `OK\r`. Many modems echo the request before
//! answering; others prefix the answer with a tag such as `+QGPS:`. Framing
//! and terminator search stay in the byte domain; text decoding happens only
//! during payload extraction, after framing is complete.
//!
//! # Example
//!
//! ```
//! use atmodem_at::protocol::{encode_command, find_terminator, strip_prefix};
//!
//! // Build a "read IMSI" command.
//! let cmd = encode_command("at+cimi");
//! assert_eq!(cmd, b"at+cimi\r");
//!
//! // Simulate a reply from the modem: echo, value, terminator.
//! let reply = b"at+cimi\r123456789012345\r\nOK\r";
//! let end = find_terminator(reply).unwrap();
//! let value = strip_prefix(&cmd, &reply[..end]).unwrap();
//! assert_eq!(value, "123456789012345");
//! ```

pub mod commands;
pub mod engine;
pub mod modem;
pub mod protocol;

// Re-export the primary types for ergonomic `use atmodem_at::*`.
pub use commands::GpsState;
pub use engine::ResponsePolicy;
pub use modem::Modem;
