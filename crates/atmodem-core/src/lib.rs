//! atmodem-core: core traits and error definitions for atmodem.
//!
//! This crate defines the transport abstraction and error types shared by
//! the atmodem crates. The AT protocol engine in `atmodem-at` operates on
//! a [`Transport`] rather than directly on a serial port, enabling both
//! real hardware control and deterministic unit testing with
//! `MockTransport` from the `atmodem-test-harness` crate.

pub mod error;
pub mod transport;

pub use error::{Error, Result};
pub use transport::Transport;
