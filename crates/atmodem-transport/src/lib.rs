//! atmodem-transport: serial transport for modem communication.
//!
//! Provides [`SerialTransport`], the [`Transport`](atmodem_core::Transport)
//! implementation for the USB virtual COM ports that cellular modems
//! expose as their AT command interface.

pub mod serial;

pub use serial::SerialTransport;
