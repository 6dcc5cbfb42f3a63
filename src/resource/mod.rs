// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Access to byte-oriented backing resources.
//!
//! Hardware and firmware state is exposed to the service as plain files: an
//! LED brightness file, a staged firmware image. The service logic never
//! touches the filesystem directly; it goes through a [`ResourceAccessor`]
//! so tests and simulations can substitute [`MemoryAccessor`].
//!
//! # Implementations
//!
//! - [`FileAccessor`] - `std::fs` backed, used on the device
//! - [`MemoryAccessor`] - in-memory map with failure injection

mod file;
mod memory;

use std::path::Path;

use chrono::{DateTime, Utc};

use crate::error::ResourceError;

pub use file::FileAccessor;
pub use memory::MemoryAccessor;

/// Metadata of a backing resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResourceStat {
    /// Total length in bytes.
    pub len: u64,
    /// Last modification time.
    pub modified: DateTime<Utc>,
}

/// An opened resource.
///
/// Dropping the handle closes the resource.
pub trait OpenResource: Send {
    /// Reads up to `buf.len()` bytes starting at `offset`.
    ///
    /// Returns the number of bytes read. Fewer bytes than requested are only
    /// returned at the end of the resource; `0` means the offset is at or
    /// past the end.
    ///
    /// # Errors
    ///
    /// Returns `ResourceError::Read` if the underlying read fails.
    fn read_at(&mut self, offset: u64, buf: &mut [u8]) -> Result<usize, ResourceError>;
}

/// Open, read, stat and write primitives over backing resources.
pub trait ResourceAccessor: Send + Sync {
    /// Opens a resource for reading.
    ///
    /// # Errors
    ///
    /// Returns `ResourceError::Open` if the resource cannot be opened.
    fn open(&self, path: &Path) -> Result<Box<dyn OpenResource>, ResourceError>;

    /// Returns resource metadata.
    ///
    /// # Errors
    ///
    /// Returns `ResourceError::Stat` if the resource is inaccessible.
    fn stat(&self, path: &Path) -> Result<ResourceStat, ResourceError>;

    /// Replaces the resource content.
    ///
    /// # Errors
    ///
    /// Returns `ResourceError::Write` if the write fails.
    fn write(&self, path: &Path, contents: &[u8]) -> Result<(), ResourceError>;

    /// Reads the whole resource.
    ///
    /// # Errors
    ///
    /// Returns `ResourceError::Open` or `ResourceError::Read`.
    fn read_all(&self, path: &Path) -> Result<Vec<u8>, ResourceError> {
        let mut handle = self.open(path)?;
        let mut contents = Vec::new();
        let mut buf = [0u8; 512];
        loop {
            let n = handle.read_at(contents.len() as u64, &mut buf)?;
            if n == 0 {
                return Ok(contents);
            }
            contents.extend_from_slice(&buf[..n]);
        }
    }
}

impl<A: ResourceAccessor + ?Sized> ResourceAccessor for std::sync::Arc<A> {
    fn open(&self, path: &Path) -> Result<Box<dyn OpenResource>, ResourceError> {
        (**self).open(path)
    }

    fn stat(&self, path: &Path) -> Result<ResourceStat, ResourceError> {
        (**self).stat(path)
    }

    fn write(&self, path: &Path, contents: &[u8]) -> Result<(), ResourceError> {
        (**self).write(path, contents)
    }

    fn read_all(&self, path: &Path) -> Result<Vec<u8>, ResourceError> {
        (**self).read_all(path)
    }
}
