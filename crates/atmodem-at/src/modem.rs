//! Modem -- the high-level driver over the AT transaction engine.
//!
//! This module ties the command builders ([`commands`]) and the
//! transaction engine ([`engine`]) to a [`Transport`] to produce the
//! operations the tool exposes: GNSS control, non-volatile storage
//! access, and identity reads.
//!
//! The modem owns the transport exclusively for the process lifetime;
//! there is exactly one transaction in flight at a time, so no locking
//! is needed.

use tracing::debug;

use atmodem_core::error::Result;
use atmodem_core::transport::Transport;

use crate::commands::{self, GpsState};
use crate::engine::{self, ResponsePolicy};
use crate::protocol;

/// A connected modem controlled over its AT command port.
///
/// All communication goes through the [`Transport`] provided at
/// construction time, which makes the driver testable against
/// `MockTransport` from `atmodem-test-harness`.
pub struct Modem {
    transport: Box<dyn Transport>,
}

impl Modem {
    /// Create a new driver over an open transport.
    pub fn new(transport: Box<dyn Transport>) -> Self {
        Modem { transport }
    }

    /// Run one transaction against the modem.
    async fn execute(&mut self, command: &[u8], policy: &ResponsePolicy) -> Result<Vec<u8>> {
        engine::execute(self.transport.as_mut(), command, policy).await
    }

    /// Verify the modem answers a bare `at` before issuing feature commands.
    ///
    /// Right after power-up the command port can stay silent for a while;
    /// the query policy's retries absorb that window.
    pub async fn probe(&mut self) -> Result<()> {
        self.execute(&commands::cmd_probe(), &commands::QUERY_POLICY)
            .await?;
        debug!("modem answered AT probe");
        Ok(())
    }

    /// Read the current GNSS engine state.
    pub async fn gps_state(&mut self) -> Result<GpsState> {
        let payload = self
            .execute(&commands::cmd_read_gps_state(), &commands::QUERY_POLICY)
            .await?;
        let value = protocol::strip_prefix(commands::TAG_GPS_STATE, &payload)?;
        commands::parse_gps_state(&value)
    }

    /// Start the GNSS engine.
    ///
    /// The modem only accepts this while the engine is off; read
    /// [`gps_state`](Self::gps_state) first.
    pub async fn start_gps(&mut self) -> Result<()> {
        self.execute(&commands::cmd_start_gps(), &commands::CONFIG_POLICY)
            .await?;
        Ok(())
    }

    /// Stop the GNSS engine.
    ///
    /// The modem only accepts this while the engine is on.
    pub async fn stop_gps(&mut self) -> Result<()> {
        self.execute(&commands::cmd_stop_gps(), &commands::CONFIG_POLICY)
            .await?;
        Ok(())
    }

    /// Read a non-volatile configuration item by name.
    pub async fn nv_read(&mut self, item: &str) -> Result<String> {
        let payload = self
            .execute(&commands::cmd_nv_read(item), &commands::CONFIG_POLICY)
            .await?;
        protocol::strip_prefix(commands::TAG_NV_READ, &payload)
    }

    /// Write a non-volatile configuration item.
    pub async fn nv_write(&mut self, item: &str, value: &str) -> Result<()> {
        self.execute(&commands::cmd_nv_write(item, value), &commands::CONFIG_POLICY)
            .await?;
        Ok(())
    }

    /// Read the SIM IMSI.
    pub async fn imsi(&mut self) -> Result<String> {
        // The modem echoes the request before the value; strip the echo.
        let command = commands::cmd_read_imsi();
        let payload = self.execute(&command, &commands::QUERY_POLICY).await?;
        protocol::strip_prefix(&command, &payload)
    }

    /// Read the modem IMEI.
    pub async fn imei(&mut self) -> Result<String> {
        let command = commands::cmd_read_imei();
        let payload = self.execute(&command, &commands::QUERY_POLICY).await?;
        protocol::strip_prefix(&command, &payload)
    }

    /// Read the SIM ICCID.
    pub async fn iccid(&mut self) -> Result<String> {
        let payload = self
            .execute(&commands::cmd_read_iccid(), &commands::QUERY_POLICY)
            .await?;
        protocol::strip_prefix(commands::TAG_ICCID, &payload)
    }

    /// Read the modem firmware version.
    pub async fn firmware_version(&mut self) -> Result<String> {
        let command = commands::cmd_read_firmware();
        let payload = self.execute(&command, &commands::FIRMWARE_POLICY).await?;
        protocol::strip_prefix(&command, &payload)
    }

    /// Close the underlying transport.
    pub async fn close(&mut self) -> Result<()> {
        self.transport.close().await
    }
}
