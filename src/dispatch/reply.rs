// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Method replies.

use crate::error::ValueError;
use crate::types::ReasonCode;

/// Status carried in the reply header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReplyStatus {
    /// The payload is the result.
    Ok,
    /// The payload is a one-byte [`ReasonCode`].
    Error,
}

/// The result of one command.
///
/// Failures a client must be able to branch on travel as
/// [`Reply::Error`] with a [`ReasonCode`], never as a transport fault.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// Success with a result payload (possibly empty).
    Ok(Vec<u8>),
    /// Failure with a wire reason code.
    Error(ReasonCode),
}

impl Reply {
    /// Creates a success reply.
    #[must_use]
    pub fn ok(payload: impl Into<Vec<u8>>) -> Self {
        Self::Ok(payload.into())
    }

    /// Returns `true` for a success reply.
    #[must_use]
    pub fn is_ok(&self) -> bool {
        matches!(self, Self::Ok(_))
    }

    /// Returns the reason code of a failure reply.
    #[must_use]
    pub fn reason(&self) -> Option<ReasonCode> {
        match self {
            Self::Ok(_) => None,
            Self::Error(code) => Some(*code),
        }
    }

    /// Splits the reply into a header status and a wire payload.
    #[must_use]
    pub fn into_wire(self) -> (ReplyStatus, Vec<u8>) {
        match self {
            Self::Ok(payload) => (ReplyStatus::Ok, payload),
            Self::Error(code) => (ReplyStatus::Error, vec![code.as_byte()]),
        }
    }

    /// Rebuilds a reply from a header status and a wire payload.
    ///
    /// # Errors
    ///
    /// Returns `ValueError::PayloadLength` if an error payload is not exactly
    /// one byte, or `ValueError::InvalidReasonCode` for an unknown code.
    pub fn from_wire(status: ReplyStatus, payload: &[u8]) -> Result<Self, ValueError> {
        match status {
            ReplyStatus::Ok => Ok(Self::Ok(payload.to_vec())),
            ReplyStatus::Error => match payload {
                [code] => Ok(Self::Error(ReasonCode::try_from(*code)?)),
                _ => Err(ValueError::PayloadLength {
                    expected: 1,
                    actual: payload.len(),
                }),
            },
        }
    }
}

impl From<ReasonCode> for Reply {
    fn from(code: ReasonCode) -> Self {
        Self::Error(code)
    }
}

impl From<Result<Vec<u8>, ReasonCode>> for Reply {
    fn from(result: Result<Vec<u8>, ReasonCode>) -> Self {
        match result {
            Ok(payload) => Self::Ok(payload),
            Err(code) => Self::Error(code),
        }
    }
}
