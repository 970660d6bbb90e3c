//! AT command builders, response tags, and timing policies.
//!
//! This module provides functions to construct the command byte sequences
//! for the supported modem operations (GNSS control, non-volatile storage,
//! identity reads) and to parse the corresponding response values.
//!
//! All functions are pure -- they produce or consume byte vectors / string
//! slices without performing any I/O. The caller is responsible for sending
//! the bytes through the transaction engine and feeding the framed payload
//! back into the parsers.
//!
//! # Command reference
//!
//! The GNSS (`+QGPS`), non-volatile storage (`+QNVFR`/`+QNVFW`), ICCID
//! (`+QCCID`), and firmware (`+QGMR`) commands follow the Quectel
//! EC2x/EG2x AT command manuals. IMSI (`+CIMI`) and IMEI (`+GSN`) are
//! standard 3GPP TS 27.007 commands.

use std::time::Duration;

use atmodem_core::error::{Error, Result};

use crate::engine::ResponsePolicy;
use crate::protocol::encode_command;

// ---------------------------------------------------------------
// Response tags
// ---------------------------------------------------------------

/// Tag prefixing the GNSS state response (`+QGPS: 0`).
pub const TAG_GPS_STATE: &[u8] = b"+QGPS:";

/// Tag prefixing a non-volatile read response.
pub const TAG_NV_READ: &[u8] = b"+QNVFR:";

/// Tag prefixing the ICCID response.
pub const TAG_ICCID: &[u8] = b"+QCCID:";

// ---------------------------------------------------------------
// Timing policies
// ---------------------------------------------------------------

/// Policy for quick queries: the modem answers within tens of
/// milliseconds once it is up, but may drop commands entirely right
/// after power-on, so retries do the heavy lifting.
pub const QUERY_POLICY: ResponsePolicy = ResponsePolicy::new(Duration::from_millis(300), 5);

/// Policy for state-changing operations (GNSS start/stop, non-volatile
/// access): a single attempt with a generous deadline. These commands are
/// never re-sent, so a half-applied write is not repeated blindly.
pub const CONFIG_POLICY: ResponsePolicy = ResponsePolicy::new(Duration::from_secs(5), 1);

/// Policy for the firmware version read, which is slower than the other
/// queries on some firmware revisions.
pub const FIRMWARE_POLICY: ResponsePolicy = ResponsePolicy::new(Duration::from_secs(1), 5);

// ---------------------------------------------------------------
// Command builders
// ---------------------------------------------------------------

/// Build the bare `at` probe used to check the modem is answering at all.
pub fn cmd_probe() -> Vec<u8> {
    encode_command("at")
}

/// Build a "read GNSS engine state" command (`at+qgps?`).
///
/// The modem answers `+QGPS: 0` (off) or `+QGPS: 1` (on).
pub fn cmd_read_gps_state() -> Vec<u8> {
    encode_command("at+qgps?")
}

/// Build a "start GNSS engine" command (`at+qgps=1`).
///
/// Only valid while the engine is off; the modem rejects it otherwise.
pub fn cmd_start_gps() -> Vec<u8> {
    encode_command("at+qgps=1")
}

/// Build a "stop GNSS engine" command (`at+qgpsend`).
///
/// Only valid while the engine is on.
pub fn cmd_stop_gps() -> Vec<u8> {
    encode_command("at+qgpsend")
}

/// Build a "read non-volatile item" command (`at+qnvfr="<item>"`).
pub fn cmd_nv_read(item: &str) -> Vec<u8> {
    encode_command(&format!("at+qnvfr=\"{item}\""))
}

/// Build a "write non-volatile item" command (`at+qnvfw="<item>",<value>`).
///
/// The value is passed through verbatim; the modem expects hex-encoded
/// data for most items.
pub fn cmd_nv_write(item: &str, value: &str) -> Vec<u8> {
    encode_command(&format!("at+qnvfw=\"{item}\",{value}"))
}

/// Build a "read SIM IMSI" command (`at+cimi`).
///
/// The modem echoes the command and answers with the bare IMSI digits.
pub fn cmd_read_imsi() -> Vec<u8> {
    encode_command("at+cimi")
}

/// Build a "read modem IMEI" command (`at+gsn`).
pub fn cmd_read_imei() -> Vec<u8> {
    encode_command("at+gsn")
}

/// Build a "read SIM ICCID" command (`at+qccid`).
pub fn cmd_read_iccid() -> Vec<u8> {
    encode_command("at+qccid")
}

/// Build a "read firmware version" command (`at+qgmr`).
pub fn cmd_read_firmware() -> Vec<u8> {
    encode_command("at+qgmr")
}

// ---------------------------------------------------------------
// Response parsers
// ---------------------------------------------------------------

/// State of the modem's GNSS engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GpsState {
    /// GNSS engine is off.
    Off,
    /// GNSS engine is on.
    On,
}

impl std::fmt::Display for GpsState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GpsState::Off => write!(f, "off"),
            GpsState::On => write!(f, "on"),
        }
    }
}

/// Parse the value of a `+QGPS:` response into a [`GpsState`].
///
/// # Errors
///
/// Returns [`Error::InvalidResponse`] if the value is neither `0` nor `1`.
pub fn parse_gps_state(value: &str) -> Result<GpsState> {
    match value {
        "0" => Ok(GpsState::Off),
        "1" => Ok(GpsState::On),
        other => Err(Error::InvalidResponse(format!(
            "unexpected GNSS state: {other:?}"
        ))),
    }
}
