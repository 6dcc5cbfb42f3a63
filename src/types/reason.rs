// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Reply reason codes.

use std::fmt;

use crate::error::ValueError;

/// A failure reason carried in an error reply.
///
/// Reason codes are part of the wire contract: each is encoded as a single
/// byte and delivered as an ordinary reply so the client can branch on it.
///
/// # Examples
///
/// ```
/// use devctl_lib::types::ReasonCode;
///
/// assert_eq!(ReasonCode::EndOfResource.as_byte(), 3);
/// assert_eq!(ReasonCode::try_from(1).unwrap(), ReasonCode::ResourceNotConfigured);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReasonCode {
    /// No resource path has been configured.
    ResourceNotConfigured,
    /// The backing resource could not be opened.
    OpenFailed,
    /// The transfer reached the end of the resource.
    EndOfResource,
    /// The requested chunk size is zero or above the cap.
    InvalidChunkSize,
    /// Applying a command to the backing resource failed.
    WriteFailed,
    /// The command payload was not understood.
    InvalidCommand,
}

impl ReasonCode {
    /// Returns the wire value.
    #[must_use]
    pub const fn as_byte(&self) -> u8 {
        match self {
            Self::ResourceNotConfigured => 1,
            Self::OpenFailed => 2,
            Self::EndOfResource => 3,
            Self::InvalidChunkSize => 4,
            Self::WriteFailed => 5,
            Self::InvalidCommand => 6,
        }
    }

    /// Returns a short lowercase label for logs.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::ResourceNotConfigured => "resource not configured",
            Self::OpenFailed => "open failed",
            Self::EndOfResource => "end of resource",
            Self::InvalidChunkSize => "invalid chunk size",
            Self::WriteFailed => "write failed",
            Self::InvalidCommand => "invalid command",
        }
    }
}

impl fmt::Display for ReasonCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<u8> for ReasonCode {
    type Error = ValueError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Self::ResourceNotConfigured),
            2 => Ok(Self::OpenFailed),
            3 => Ok(Self::EndOfResource),
            4 => Ok(Self::InvalidChunkSize),
            5 => Ok(Self::WriteFailed),
            6 => Ok(Self::InvalidCommand),
            other => Err(ValueError::InvalidReasonCode(other)),
        }
    }
}

impl From<ReasonCode> for u8 {
    fn from(code: ReasonCode) -> Self {
        code.as_byte()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transfer_codes_match_wire_contract() {
        assert_eq!(ReasonCode::ResourceNotConfigured.as_byte(), 1);
        assert_eq!(ReasonCode::OpenFailed.as_byte(), 2);
        assert_eq!(ReasonCode::EndOfResource.as_byte(), 3);
    }

    #[test]
    fn every_code_decodes_to_itself() {
        for code in [
            ReasonCode::ResourceNotConfigured,
            ReasonCode::OpenFailed,
            ReasonCode::EndOfResource,
            ReasonCode::InvalidChunkSize,
            ReasonCode::WriteFailed,
            ReasonCode::InvalidCommand,
        ] {
            assert_eq!(ReasonCode::try_from(code.as_byte()).unwrap(), code);
        }
    }

    #[test]
    fn unknown_code_is_rejected() {
        assert_eq!(
            ReasonCode::try_from(0).unwrap_err(),
            ValueError::InvalidReasonCode(0)
        );
        assert!(ReasonCode::try_from(42).is_err());
    }

    #[test]
    fn display() {
        assert_eq!(ReasonCode::OpenFailed.to_string(), "open failed");
    }
}
