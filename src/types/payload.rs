// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Typed request and notification payloads.

use std::fmt;

use crate::error::ValueError;

/// Command sent to the indicator control method.
///
/// # Examples
///
/// ```
/// use devctl_lib::types::ControlCommand;
///
/// let cmd = ControlCommand::decode(&[1]).unwrap();
/// assert_eq!(cmd, ControlCommand::Activate);
/// assert_eq!(cmd.level(), b"1");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ControlCommand {
    /// Turn the indicator on.
    Activate,
    /// Turn the indicator off.
    Deactivate,
}

impl ControlCommand {
    /// Returns the wire value.
    #[must_use]
    pub const fn as_byte(&self) -> u8 {
        match self {
            Self::Activate => 1,
            Self::Deactivate => 2,
        }
    }

    /// Returns the text written to the indicator file.
    #[must_use]
    pub const fn level(&self) -> &'static [u8] {
        match self {
            Self::Activate => b"1",
            Self::Deactivate => b"0",
        }
    }

    /// Decodes a command payload.
    ///
    /// # Errors
    ///
    /// Returns `ValueError::PayloadLength` when the payload is empty and
    /// `ValueError::InvalidCommand` for unknown command bytes.
    pub fn decode(payload: &[u8]) -> Result<Self, ValueError> {
        let Some(&byte) = payload.first() else {
            return Err(ValueError::PayloadLength {
                expected: 1,
                actual: 0,
            });
        };
        Self::try_from(byte)
    }
}

impl TryFrom<u8> for ControlCommand {
    type Error = ValueError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Self::Activate),
            2 => Ok(Self::Deactivate),
            other => Err(ValueError::InvalidCommand(other)),
        }
    }
}

impl fmt::Display for ControlCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Activate => f.write_str("activate"),
            Self::Deactivate => f.write_str("deactivate"),
        }
    }
}

/// A "get next chunk" request.
///
/// Encoded as a big-endian `u32` holding the requested chunk size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkRequest {
    /// Maximum number of bytes the client accepts in the reply.
    pub requested_size: u32,
}

impl ChunkRequest {
    /// Wire length of an encoded request.
    pub const ENCODED_LEN: usize = 4;

    /// Creates a chunk request.
    #[must_use]
    pub const fn new(requested_size: u32) -> Self {
        Self { requested_size }
    }

    /// Encodes the request.
    #[must_use]
    pub fn encode(&self) -> Vec<u8> {
        self.requested_size.to_be_bytes().to_vec()
    }

    /// Decodes a request payload.
    ///
    /// # Errors
    ///
    /// Returns `ValueError::PayloadLength` if the payload is not exactly
    /// four bytes.
    pub fn decode(payload: &[u8]) -> Result<Self, ValueError> {
        let bytes: [u8; Self::ENCODED_LEN] =
            payload.try_into().map_err(|_| ValueError::PayloadLength {
                expected: Self::ENCODED_LEN,
                actual: payload.len(),
            })?;
        Ok(Self::new(u32::from_be_bytes(bytes)))
    }
}

/// Encodes a boolean state as the one-byte monitored-state payload.
#[must_use]
pub fn encode_flag(on: bool) -> Vec<u8> {
    vec![u8::from(on)]
}

/// Decodes the one-byte monitored-state payload.
///
/// Any non-zero byte reads as on.
///
/// # Errors
///
/// Returns `ValueError::PayloadLength` for an empty payload.
pub fn decode_flag(payload: &[u8]) -> Result<bool, ValueError> {
    payload
        .first()
        .map(|&b| b != 0)
        .ok_or(ValueError::PayloadLength {
            expected: 1,
            actual: 0,
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn control_command_decode() {
        assert_eq!(ControlCommand::decode(&[1]).unwrap(), ControlCommand::Activate);
        assert_eq!(
            ControlCommand::decode(&[2]).unwrap(),
            ControlCommand::Deactivate
        );
        assert_eq!(
            ControlCommand::decode(&[3]).unwrap_err(),
            ValueError::InvalidCommand(3)
        );
        assert!(matches!(
            ControlCommand::decode(&[]),
            Err(ValueError::PayloadLength { actual: 0, .. })
        ));
    }

    #[test]
    fn control_command_levels() {
        assert_eq!(ControlCommand::Activate.level(), b"1");
        assert_eq!(ControlCommand::Deactivate.level(), b"0");
    }

    #[test]
    fn chunk_request_is_big_endian() {
        assert_eq!(ChunkRequest::new(10).encode(), vec![0, 0, 0, 10]);
        assert_eq!(
            ChunkRequest::decode(&[0, 0, 1, 0]).unwrap(),
            ChunkRequest::new(256)
        );
    }

    #[test]
    fn chunk_request_rejects_short_payload() {
        assert_eq!(
            ChunkRequest::decode(&[10]).unwrap_err(),
            ValueError::PayloadLength {
                expected: 4,
                actual: 1
            }
        );
    }

    #[test]
    fn flag_payload() {
        assert_eq!(encode_flag(true), vec![1]);
        assert_eq!(encode_flag(false), vec![0]);
        assert!(decode_flag(&[1]).unwrap());
        assert!(!decode_flag(&[0]).unwrap());
        assert!(decode_flag(&[]).is_err());
    }
}
