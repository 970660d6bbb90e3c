//! AT response framing and payload extraction.
//!
//! All functions are pure -- they operate on byte buffers without
//! performing any I/O. The transaction engine feeds accumulated reads into
//! [`find_terminator`] and hands the framed payload to [`strip_prefix`].
//!
//! Framing and terminator search stay in the byte domain; text decoding
//! only happens in [`strip_prefix`], once framing is complete, so encoding
//! never interferes with terminator detection.

use atmodem_core::error::{Error, Result};

/// The byte that terminates every AT command.
pub const COMMAND_TERMINATOR: u8 = b'\r';

/// The byte sequence that terminates a successful AT response.
pub const RESPONSE_TERMINATOR: &[u8] = b"OK\r";

/// Encode an AT command body into the bytes sent on the wire.
///
/// Appends the `\r` command terminator.
///
/// # Examples
///
/// ```
/// use atmodem_at::protocol::encode_command;
///
/// assert_eq!(encode_command("at+qgps?"), b"at+qgps?\r");
/// ```
pub fn encode_command(body: &str) -> Vec<u8> {
    let mut cmd = Vec::with_capacity(body.len() + 1);
    cmd.extend_from_slice(body.as_bytes());
    cmd.push(COMMAND_TERMINATOR);
    cmd
}

/// Find the response terminator in an accumulated buffer.
///
/// Returns the offset of the first occurrence of `OK\r`, or `None` if the
/// buffer does not yet contain a complete response. The payload is
/// everything before the returned offset.
///
/// Callers must pass the *whole* accumulated buffer on every call, not
/// just newly read bytes: the terminator may straddle two reads.
pub fn find_terminator(buf: &[u8]) -> Option<usize> {
    find(buf, RESPONSE_TERMINATOR)
}

/// Extract the semantic value from a framed response payload.
///
/// Modems either echo the request before answering or prefix the answer
/// with a response tag (e.g. `+QGPS: 0`). The caller specifies which exact
/// byte sequence to strip; there is no heuristic auto-detection. Everything
/// after the first occurrence of `prefix` is decoded as text and returned
/// with surrounding whitespace (including trailing `\r`/`\n`) trimmed.
///
/// # Errors
///
/// Returns [`Error::InvalidResponse`] if `prefix` does not occur in
/// `message`, if nothing follows it (an echoed-but-empty reply is invalid,
/// not an empty success), or if the remainder is not valid text.
pub fn strip_prefix(prefix: &[u8], message: &[u8]) -> Result<String> {
    let invalid = || Error::InvalidResponse(String::from_utf8_lossy(message).into_owned());

    let begin = find(message, prefix).ok_or_else(invalid)?;
    let value = &message[begin + prefix.len()..];
    if value.is_empty() {
        return Err(invalid());
    }

    let text = std::str::from_utf8(value).map_err(|_| invalid())?;
    Ok(text.trim().to_string())
}

/// Offset of the first occurrence of `needle` in `haystack`.
fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() {
        return Some(0);
    }
    haystack.windows(needle.len()).position(|w| w == needle)
}
