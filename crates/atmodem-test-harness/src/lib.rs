//! atmodem-test-harness: mock transport for deterministic protocol tests.
//!
//! Provides [`MockTransport`], a scripted [`Transport`](atmodem_core::Transport)
//! implementation with pre-loaded request/response pairs. Protocol and
//! driver tests use it to exercise command framing, terminator detection,
//! and retry behavior without a real modem attached.

pub mod mock_serial;

pub use mock_serial::MockTransport;
