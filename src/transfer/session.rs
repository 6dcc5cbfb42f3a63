// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Transfer session bookkeeping.

use std::fmt;
use std::path::PathBuf;

use uuid::Uuid;

/// Unique identifier of one transfer session.
///
/// A new session starts every time the engine opens its resource; the ID
/// correlates the chunk requests of one pass through the resource in logs.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionId(Uuid);

impl SessionId {
    /// Creates a new unique session identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Returns the underlying UUID.
    #[must_use]
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Show only first 8 characters for readability
        let short = &self.0.to_string()[..8];
        write!(f, "SessionId({short}...)")
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Position of a pass through the configured resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferSession {
    /// Session identifier.
    pub id: SessionId,
    /// The resource being transferred.
    pub resource_path: PathBuf,
    /// Offset of the next byte to deliver.
    pub cursor: u64,
    /// Whether the resource handle is open.
    pub is_open: bool,
    /// Whether the end of the resource has been reported.
    pub is_exhausted: bool,
}

impl TransferSession {
    pub(crate) fn opened(resource_path: PathBuf) -> Self {
        Self {
            id: SessionId::new(),
            resource_path,
            cursor: 0,
            is_open: true,
            is_exhausted: false,
        }
    }
}

/// Transfer engine state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransferState {
    /// No resource path configured.
    NoResource,
    /// A resource is configured but not opened.
    Closed,
    /// The resource is open and chunks are being delivered.
    Open,
    /// The end of the resource has been reported.
    Exhausted,
}

impl TransferState {
    /// Returns the state name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::NoResource => "NoResource",
            Self::Closed => "Closed",
            Self::Open => "Open",
            Self::Exhausted => "Exhausted",
        }
    }
}

impl fmt::Display for TransferState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
