// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Probes reading the externally observable value of a resource.

use std::fmt;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};

use crate::error::ResourceError;
use crate::resource::ResourceAccessor;

/// Reads the current value of a watched resource.
pub trait Probe: Send {
    /// The observed value type.
    type Value: Clone + PartialEq + fmt::Debug + Send;

    /// The watched resource.
    fn path(&self) -> &Path;

    /// Observes the current value.
    ///
    /// # Errors
    ///
    /// Returns a `ResourceError` if the resource is inaccessible or its
    /// content cannot be decoded.
    fn observe(&self) -> Result<Self::Value, ResourceError>;

    /// Decides whether `current` is a transition away from `previous`.
    fn is_change(&self, previous: &Self::Value, current: &Self::Value) -> bool {
        previous != current
    }
}

/// Observes a resource's modification timestamp.
///
/// Only a timestamp moving forward counts as a change, so restoring an
/// older file does not announce it as new.
#[derive(Debug, Clone)]
pub struct ModifiedTimeProbe<A> {
    accessor: A,
    path: PathBuf,
}

impl<A: ResourceAccessor> ModifiedTimeProbe<A> {
    /// Creates a probe on `path`.
    pub fn new(accessor: A, path: impl Into<PathBuf>) -> Self {
        Self {
            accessor,
            path: path.into(),
        }
    }
}

impl<A: ResourceAccessor> Probe for ModifiedTimeProbe<A> {
    type Value = DateTime<Utc>;

    fn path(&self) -> &Path {
        &self.path
    }

    fn observe(&self) -> Result<Self::Value, ResourceError> {
        Ok(self.accessor.stat(&self.path)?.modified)
    }

    fn is_change(&self, previous: &Self::Value, current: &Self::Value) -> bool {
        current > previous
    }
}

/// Observes a resource holding a decimal level, such as an LED brightness
/// file. Any level above zero reads as on.
#[derive(Debug, Clone)]
pub struct FlagProbe<A> {
    accessor: A,
    path: PathBuf,
}

impl<A: ResourceAccessor> FlagProbe<A> {
    /// Creates a probe on `path`.
    pub fn new(accessor: A, path: impl Into<PathBuf>) -> Self {
        Self {
            accessor,
            path: path.into(),
        }
    }
}

impl<A: ResourceAccessor> Probe for FlagProbe<A> {
    type Value = bool;

    fn path(&self) -> &Path {
        &self.path
    }

    fn observe(&self) -> Result<bool, ResourceError> {
        let raw = self.accessor.read_all(&self.path)?;
        let text = String::from_utf8_lossy(&raw);
        let trimmed = text.trim();
        trimmed
            .parse::<i64>()
            .map(|level| level > 0)
            .map_err(|_| ResourceError::Decode {
                path: self.path.clone(),
                content: trimmed.to_string(),
            })
    }
}
