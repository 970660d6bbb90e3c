//! Mock transport for deterministic testing of the AT protocol engine.
//!
//! [`MockTransport`] implements the [`Transport`] trait with pre-loaded
//! request/response pairs. This lets you test command encoding, response
//! framing, and retry behavior without real hardware.
//!
//! # Example
//!
//! ```
//! use atmodem_test_harness::MockTransport;
//!
//! let mut mock = MockTransport::new();
//! // Pre-load: when the engine sends this request, return this response.
//! mock.expect(b"at+cimi\r", b"at+cimi\r123456789012345\r\nOK\r");
//! ```

use async_trait::async_trait;
use std::collections::VecDeque;
use std::time::Duration;

use atmodem_core::error::{Error, Result};
use atmodem_core::transport::Transport;

/// A pre-loaded request/response pair for the mock transport.
#[derive(Debug, Clone)]
struct Expectation {
    /// The exact bytes we expect to be sent.
    request: Vec<u8>,
    /// Response chunks, each returned by one `receive()` call.
    chunks: VecDeque<Vec<u8>>,
}

/// A mock [`Transport`] for testing protocol code without hardware.
///
/// Expectations are consumed in order. When `send()` is called, the sent
/// data is recorded and matched against the next expectation. The
/// corresponding response is then returned by subsequent `receive()`
/// calls -- either all at once, or chunk by chunk when loaded with
/// [`expect_chunks`](MockTransport::expect_chunks), which lets tests
/// split a response terminator across two reads.
///
/// Once the pending response is exhausted, `receive()` returns
/// [`Error::ReadTimeout`], which is what a silent modem looks like to
/// the transaction engine.
#[derive(Debug)]
pub struct MockTransport {
    /// Ordered queue of expected request/response pairs.
    expectations: VecDeque<Expectation>,
    /// Chunks pending for upcoming `receive()` calls.
    pending: VecDeque<Vec<u8>>,
    /// Whether the transport is "connected".
    connected: bool,
    /// Log of all bytes sent through this transport.
    sent_log: Vec<Vec<u8>>,
}

impl MockTransport {
    /// Create a new mock transport in the connected state.
    pub fn new() -> Self {
        MockTransport {
            expectations: VecDeque::new(),
            pending: VecDeque::new(),
            connected: true,
            sent_log: Vec::new(),
        }
    }

    /// Add an expected request/response pair.
    ///
    /// When `send()` is called with data matching `request`, subsequent
    /// `receive()` calls return `response`. An empty response means the
    /// modem stays silent: the next `receive()` times out.
    pub fn expect(&mut self, request: &[u8], response: &[u8]) {
        self.expect_chunks(request, &[response]);
    }

    /// Add an expected request whose response arrives in separate reads.
    ///
    /// Each chunk is returned by one `receive()` call (subject to the
    /// caller's buffer size). Use this to verify that a terminator split
    /// across two reads is still detected.
    pub fn expect_chunks(&mut self, request: &[u8], chunks: &[&[u8]]) {
        self.expectations.push_back(Expectation {
            request: request.to_vec(),
            chunks: chunks.iter().map(|c| c.to_vec()).collect(),
        });
    }

    /// Return a reference to all data that has been sent through this transport.
    ///
    /// Each element is the byte slice from one `send()` call.
    pub fn sent_data(&self) -> &[Vec<u8>] {
        &self.sent_log
    }

    /// Return the number of expectations that have not yet been consumed.
    pub fn remaining_expectations(&self) -> usize {
        self.expectations.len()
    }

    /// Set the connected state of the mock transport.
    ///
    /// When set to `false`, subsequent `send()` and `receive()` calls will
    /// return [`Error::NotConnected`].
    pub fn set_connected(&mut self, connected: bool) {
        self.connected = connected;
    }
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn send(&mut self, data: &[u8]) -> Result<()> {
        if !self.connected {
            return Err(Error::NotConnected);
        }

        // Record what was sent.
        self.sent_log.push(data.to_vec());

        // Match against the next expectation.
        if let Some(expectation) = self.expectations.pop_front() {
            if data != expectation.request.as_slice() {
                return Err(Error::Transport(format!(
                    "unexpected send data: expected {:02X?}, got {:02X?}",
                    expectation.request, data
                )));
            }
            self.pending = expectation.chunks;
            Ok(())
        } else {
            Err(Error::Transport(
                "no more expectations in mock transport".into(),
            ))
        }
    }

    async fn receive(&mut self, buf: &mut [u8], _timeout: Duration) -> Result<usize> {
        if !self.connected {
            return Err(Error::NotConnected);
        }

        match self.pending.pop_front() {
            Some(chunk) if chunk.is_empty() => Err(Error::ReadTimeout),
            Some(chunk) => {
                let n = chunk.len().min(buf.len());
                buf[..n].copy_from_slice(&chunk[..n]);
                if n < chunk.len() {
                    // Caller's buffer was smaller than the chunk; keep
                    // the remainder for the next read.
                    self.pending.push_front(chunk[n..].to_vec());
                }
                Ok(n)
            }
            None => Err(Error::ReadTimeout),
        }
    }

    async fn close(&mut self) -> Result<()> {
        self.connected = false;
        self.pending.clear();
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.connected
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use atmodem_core::transport::Transport;

    #[tokio::test]
    async fn mock_transport_basic_send_receive() {
        let mut mock = MockTransport::new();
        let request = b"at+qgps?\r";
        let response = b"+QGPS: 0\r\nOK\r";

        mock.expect(request, response);

        // Send the expected request.
        mock.send(request).await.unwrap();

        // Receive the pre-loaded response.
        let mut buf = [0u8; 64];
        let n = mock
            .receive(&mut buf, Duration::from_millis(100))
            .await
            .unwrap();

        assert_eq!(n, response.len());
        assert_eq!(&buf[..n], response);
    }

    #[tokio::test]
    async fn mock_transport_tracks_sent_data() {
        let mut mock = MockTransport::new();
        let req1 = b"at\r";
        let req2 = b"at+gsn\r";

        mock.expect(req1, b"OK\r");
        mock.expect(req2, b"860000000000000\r\nOK\r");

        mock.send(req1).await.unwrap();
        mock.send(req2).await.unwrap();

        assert_eq!(mock.sent_data().len(), 2);
        assert_eq!(mock.sent_data()[0], req1);
        assert_eq!(mock.sent_data()[1], req2);
    }

    #[tokio::test]
    async fn mock_transport_wrong_data_errors() {
        let mut mock = MockTransport::new();
        mock.expect(b"at\r", b"OK\r");

        let result = mock.send(b"atz\r").await;
        assert!(result.is_err());
        assert!(matches!(result.unwrap_err(), Error::Transport(_)));
    }

    #[tokio::test]
    async fn mock_transport_no_expectations_errors() {
        let mut mock = MockTransport::new();

        let result = mock.send(b"at\r").await;
        assert!(result.is_err());
        assert!(matches!(result.unwrap_err(), Error::Transport(_)));
    }

    #[tokio::test]
    async fn mock_transport_receive_without_send_times_out() {
        let mut mock = MockTransport::new();
        let mut buf = [0u8; 64];

        let result = mock.receive(&mut buf, Duration::from_millis(10)).await;
        assert!(matches!(result.unwrap_err(), Error::ReadTimeout));
    }

    #[tokio::test]
    async fn mock_transport_empty_response_times_out() {
        let mut mock = MockTransport::new();
        mock.expect(b"at\r", b"");

        mock.send(b"at\r").await.unwrap();

        let mut buf = [0u8; 64];
        let result = mock.receive(&mut buf, Duration::from_millis(10)).await;
        assert!(matches!(result.unwrap_err(), Error::ReadTimeout));
    }

    #[tokio::test]
    async fn mock_transport_chunked_response() {
        let mut mock = MockTransport::new();
        mock.expect_chunks(b"at\r", &[b"at\r\r\nO", b"K\r"]);

        mock.send(b"at\r").await.unwrap();

        let mut buf = [0u8; 64];
        let n = mock
            .receive(&mut buf, Duration::from_millis(10))
            .await
            .unwrap();
        assert_eq!(&buf[..n], b"at\r\r\nO");

        let n = mock
            .receive(&mut buf, Duration::from_millis(10))
            .await
            .unwrap();
        assert_eq!(&buf[..n], b"K\r");

        // Chunks exhausted: back to silence.
        let result = mock.receive(&mut buf, Duration::from_millis(10)).await;
        assert!(matches!(result.unwrap_err(), Error::ReadTimeout));
    }

    #[tokio::test]
    async fn mock_transport_partial_receive() {
        let mut mock = MockTransport::new();
        let request = b"at+qgmr\r";
        let response = b"EG25GGBR07A08M2G\r\nOK\r";
        mock.expect(request, response);

        mock.send(request).await.unwrap();

        // Read with a buffer smaller than the response.
        let mut buf = [0u8; 8];
        let n = mock
            .receive(&mut buf, Duration::from_millis(100))
            .await
            .unwrap();
        assert_eq!(n, 8);
        assert_eq!(&buf[..n], &response[..8]);

        // The remainder arrives on subsequent reads.
        let mut rest = Vec::new();
        loop {
            match mock.receive(&mut buf, Duration::from_millis(100)).await {
                Ok(n) => rest.extend_from_slice(&buf[..n]),
                Err(Error::ReadTimeout) => break,
                Err(e) => panic!("unexpected error: {e}"),
            }
        }
        assert_eq!(rest, &response[8..]);
    }

    #[tokio::test]
    async fn mock_transport_disconnect() {
        let mut mock = MockTransport::new();
        assert!(mock.is_connected());

        mock.close().await.unwrap();
        assert!(!mock.is_connected());

        // Operations after close should fail.
        let result = mock.send(b"at\r").await;
        assert!(matches!(result.unwrap_err(), Error::NotConnected));
    }

    #[tokio::test]
    async fn mock_transport_set_connected() {
        let mut mock = MockTransport::new();
        mock.set_connected(false);
        assert!(!mock.is_connected());

        let result = mock.send(b"at\r").await;
        assert!(matches!(result.unwrap_err(), Error::NotConnected));

        let mut buf = [0u8; 8];
        let result = mock.receive(&mut buf, Duration::from_millis(10)).await;
        assert!(matches!(result.unwrap_err(), Error::NotConnected));
    }

    #[tokio::test]
    async fn mock_transport_remaining_expectations() {
        let mut mock = MockTransport::new();
        mock.expect(b"at\r", b"OK\r");
        mock.expect(b"at+cimi\r", b"123\r\nOK\r");
        assert_eq!(mock.remaining_expectations(), 2);

        mock.send(b"at\r").await.unwrap();
        assert_eq!(mock.remaining_expectations(), 1);

        mock.send(b"at+cimi\r").await.unwrap();
        assert_eq!(mock.remaining_expectations(), 0);
    }
}
