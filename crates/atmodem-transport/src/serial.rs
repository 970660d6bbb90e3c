//! Serial port transport for modem communication.
//!
//! This module provides [`SerialTransport`], which implements the
//! [`Transport`] trait for the USB virtual COM ports that cellular modems
//! expose as their AT command interface (e.g. `/dev/ttyUSB2` on a Quectel
//! EG25-G).
//!
//! Opening is retried for a short while: after a hot-plug event the device
//! node may not exist yet, or ModemManager may still be probing the port
//! and holding it locked.
//!
//! # Example
//!
//! ```no_run
//! use atmodem_transport::SerialTransport;
//! use atmodem_core::transport::Transport;
//! use std::time::Duration;
//!
//! # async fn example() -> atmodem_core::Result<()> {
//! // Open the AT command port at 115200 baud.
//! let mut transport = SerialTransport::open("/dev/ttyUSB2", 115_200).await?;
//!
//! // Send an AT command.
//! transport.send(b"at\r").await?;
//!
//! // Receive the response with a 300 ms timeout.
//! let mut buf = [0u8; 128];
//! let n = transport.receive(&mut buf, Duration::from_millis(300)).await?;
//! # Ok(())
//! # }
//! ```

use async_trait::async_trait;
use atmodem_core::error::{Error, Result};
use atmodem_core::transport::Transport;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio_serial::{SerialPort, SerialPortBuilderExt, SerialStream};

/// How many times a failed open is retried before giving up.
const OPEN_RETRIES: u32 = 20;

/// Delay between open attempts.
const OPEN_RETRY_DELAY: Duration = Duration::from_millis(100);

/// Serial port transport for modem communication.
///
/// Implements the [`Transport`] trait over a USB virtual COM port or
/// physical UART, configured 8N1 with no flow control and exclusive
/// access.
pub struct SerialTransport {
    /// The underlying serial port stream.
    port: Option<SerialStream>,
    /// Port name for logging/debugging.
    port_name: String,
}

impl std::fmt::Debug for SerialTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SerialTransport")
            .field("port_name", &self.port_name)
            .field("open", &self.port.is_some())
            .finish()
    }
}

impl SerialTransport {
    /// Open the modem's AT command device with bounded retry.
    ///
    /// The port is configured 8N1 with no flow control and claimed for
    /// exclusive access. A failed open is retried every
    /// 100 ms up to 20 times before the last error is propagated --
    /// right after a hot-plug the device node may not be registered yet,
    /// or another process may briefly hold the port. All transient causes
    /// are retried identically.
    ///
    /// # Arguments
    ///
    /// * `device` - Serial device path (e.g. `/dev/ttyUSB2` on Linux, `COM4` on Windows)
    /// * `baud_rate` - Baud rate (115200 for most cellular modems)
    pub async fn open(device: &str, baud_rate: u32) -> Result<Self> {
        tracing::debug!(device = %device, baud_rate, "Opening modem device");

        let mut attempt = 0u32;
        loop {
            attempt += 1;
            match Self::try_open(device, baud_rate) {
                Ok(stream) => {
                    tracing::info!(
                        device = %device,
                        baud_rate,
                        attempt,
                        "Modem device opened"
                    );
                    return Ok(Self {
                        port: Some(stream),
                        port_name: device.to_string(),
                    });
                }
                Err(e) if attempt > OPEN_RETRIES => {
                    tracing::error!(device = %device, error = %e, "Failed to open modem device");
                    return Err(Error::Open {
                        device: device.to_string(),
                        attempts: attempt,
                        reason: e.to_string(),
                    });
                }
                Err(e) => {
                    tracing::debug!(
                        device = %device,
                        attempt,
                        error = %e,
                        "Open failed, retrying"
                    );
                    tokio::time::sleep(OPEN_RETRY_DELAY).await;
                }
            }
        }
    }

    /// One open attempt: configure, open, and claim the port.
    fn try_open(device: &str, baud_rate: u32) -> tokio_serial::Result<SerialStream> {
        let mut stream = tokio_serial::new(device, baud_rate)
            .data_bits(tokio_serial::DataBits::Eight)
            .stop_bits(tokio_serial::StopBits::One)
            .parity(tokio_serial::Parity::None)
            .flow_control(tokio_serial::FlowControl::None)
            .open_native_async()?;

        // Only one owner at a time: a second opener gets EBUSY instead of
        // interleaving bytes with us.
        #[cfg(unix)]
        stream.set_exclusive(true)?;

        // Assert DTR after opening. Modems treat a dropped DTR as "host
        // went away" and may hang up or enter sleep.
        if let Err(e) = stream.write_data_terminal_ready(true) {
            tracing::warn!(device = %device, error = %e, "Failed to assert DTR");
        }

        Ok(stream)
    }

    /// Get the name of the serial device.
    pub fn port_name(&self) -> &str {
        &self.port_name
    }
}

#[async_trait]
impl Transport for SerialTransport {
    async fn send(&mut self, data: &[u8]) -> Result<()> {
        let port = self.port.as_mut().ok_or(Error::NotConnected)?;

        tracing::trace!(
            port = %self.port_name,
            bytes = data.len(),
            data = ?data,
            "Sending data"
        );

        port.write_all(data).await.map_err(|e| {
            tracing::error!(port = %self.port_name, error = %e, "Failed to send data");
            if e.kind() == std::io::ErrorKind::BrokenPipe
                || e.kind() == std::io::ErrorKind::NotConnected
            {
                Error::ConnectionLost
            } else {
                Error::Io(e)
            }
        })?;

        // Flush so the command leaves the TX buffer immediately.
        port.flush().await.map_err(|e| {
            tracing::error!(port = %self.port_name, error = %e, "Failed to flush serial port");
            Error::Io(e)
        })?;

        Ok(())
    }

    async fn receive(&mut self, buf: &mut [u8], timeout: Duration) -> Result<usize> {
        let port = self.port.as_mut().ok_or(Error::NotConnected)?;

        tracing::trace!(
            port = %self.port_name,
            buf_len = buf.len(),
            timeout_ms = timeout.as_millis(),
            "Waiting for data"
        );

        let result = tokio::time::timeout(timeout, port.read(buf)).await;

        match result {
            Ok(Ok(0)) => {
                // EOF from a serial port means the device went away.
                tracing::error!(port = %self.port_name, "Serial port returned EOF");
                Err(Error::ConnectionLost)
            }
            Ok(Ok(n)) => {
                tracing::trace!(
                    port = %self.port_name,
                    bytes = n,
                    data = ?&buf[..n],
                    "Received data"
                );
                Ok(n)
            }
            Ok(Err(e)) => {
                tracing::error!(port = %self.port_name, error = %e, "Failed to receive data");
                if e.kind() == std::io::ErrorKind::BrokenPipe
                    || e.kind() == std::io::ErrorKind::NotConnected
                {
                    Err(Error::ConnectionLost)
                } else {
                    Err(Error::Io(e))
                }
            }
            Err(_) => Err(Error::ReadTimeout),
        }
    }

    async fn close(&mut self) -> Result<()> {
        if let Some(mut port) = self.port.take() {
            tracing::debug!(port = %self.port_name, "Closing modem device");

            // Flush any pending data before closing.
            if let Err(e) = port.flush().await {
                tracing::warn!(
                    port = %self.port_name,
                    error = %e,
                    "Failed to flush before closing (continuing anyway)"
                );
            }

            // The port is dropped here, which closes it.
        }

        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.port.is_some()
    }
}

impl Drop for SerialTransport {
    fn drop(&mut self) {
        if self.port.is_some() {
            tracing::debug!(port = %self.port_name, "SerialTransport dropped, closing port");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn open_nonexistent_device_fails_with_open_error() {
        // Retries 20 times at 100 ms, so give it a moment; the path can
        // never appear, and the error must name the device and attempts.
        let result =
            SerialTransport::open("/dev/atmodem-test-does-not-exist", 115_200).await;
        match result {
            Err(Error::Open {
                device, attempts, ..
            }) => {
                assert_eq!(device, "/dev/atmodem-test-does-not-exist");
                assert_eq!(attempts, OPEN_RETRIES + 1);
            }
            other => panic!("expected Error::Open, got {other:?}"),
        }
    }

    #[test]
    fn retry_budget_constants() {
        assert_eq!(OPEN_RETRIES, 20);
        assert_eq!(OPEN_RETRY_DELAY, Duration::from_millis(100));
    }
}
