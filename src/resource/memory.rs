// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! In-memory resource accessor for tests and simulation.

use std::collections::{HashMap, HashSet};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, TimeDelta, Utc};
use parking_lot::RwLock;

use super::{OpenResource, ResourceAccessor, ResourceStat};
use crate::error::ResourceError;

#[derive(Debug, Clone)]
struct Entry {
    contents: Arc<Vec<u8>>,
    modified: DateTime<Utc>,
}

#[derive(Debug, Default)]
struct Inner {
    entries: HashMap<PathBuf, Entry>,
    read_only: HashSet<PathBuf>,
    unreadable: HashSet<PathBuf>,
    /// Logical clock; each write moves modification time forward by 1s.
    clock: i64,
}

/// Resource accessor backed by an in-memory map.
///
/// Every write advances a logical clock, so modification times strictly
/// increase regardless of the wall clock resolution. Paths can be marked
/// read-only or unreadable to simulate permission errors.
///
/// Clones share the same storage.
///
/// # Examples
///
/// ```
/// use std::path::Path;
/// use devctl_lib::resource::{MemoryAccessor, ResourceAccessor};
///
/// let accessor = MemoryAccessor::new();
/// accessor.insert("firmware.bin", vec![0u8; 25]);
/// assert_eq!(accessor.stat(Path::new("firmware.bin")).unwrap().len, 25);
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemoryAccessor {
    inner: Arc<RwLock<Inner>>,
}

impl MemoryAccessor {
    /// Creates an empty accessor.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates or replaces a resource.
    pub fn insert(&self, path: impl Into<PathBuf>, contents: impl Into<Vec<u8>>) {
        let mut inner = self.inner.write();
        inner.clock += 1;
        let modified = DateTime::<Utc>::UNIX_EPOCH + TimeDelta::seconds(inner.clock);
        inner.entries.insert(
            path.into(),
            Entry {
                contents: Arc::new(contents.into()),
                modified,
            },
        );
    }

    /// Removes a resource. Returns `true` if it existed.
    pub fn remove(&self, path: impl AsRef<Path>) -> bool {
        self.inner.write().entries.remove(path.as_ref()).is_some()
    }

    /// Makes writes to `path` fail with a permission error.
    pub fn set_read_only(&self, path: impl Into<PathBuf>, read_only: bool) {
        let path = path.into();
        let mut inner = self.inner.write();
        if read_only {
            inner.read_only.insert(path);
        } else {
            inner.read_only.remove(&path);
        }
    }

    /// Makes opens and stats of `path` fail with a permission error.
    pub fn set_unreadable(&self, path: impl Into<PathBuf>, unreadable: bool) {
        let path = path.into();
        let mut inner = self.inner.write();
        if unreadable {
            inner.unreadable.insert(path);
        } else {
            inner.unreadable.remove(&path);
        }
    }

    /// Returns a copy of the resource content.
    #[must_use]
    pub fn contents(&self, path: impl AsRef<Path>) -> Option<Vec<u8>> {
        self.inner
            .read()
            .entries
            .get(path.as_ref())
            .map(|entry| entry.contents.as_ref().clone())
    }

    fn lookup(&self, path: &Path) -> Result<Entry, std::io::Error> {
        let inner = self.inner.read();
        if inner.unreadable.contains(path) {
            return Err(std::io::Error::from(ErrorKind::PermissionDenied));
        }
        inner
            .entries
            .get(path)
            .cloned()
            .ok_or_else(|| std::io::Error::from(ErrorKind::NotFound))
    }
}

struct MemoryHandle {
    contents: Arc<Vec<u8>>,
}

impl OpenResource for MemoryHandle {
    fn read_at(&mut self, offset: u64, buf: &mut [u8]) -> Result<usize, ResourceError> {
        let len = self.contents.len();
        let start = usize::try_from(offset).unwrap_or(len).min(len);
        let n = buf.len().min(len - start);
        buf[..n].copy_from_slice(&self.contents[start..start + n]);
        Ok(n)
    }
}

impl ResourceAccessor for MemoryAccessor {
    fn open(&self, path: &Path) -> Result<Box<dyn OpenResource>, ResourceError> {
        // The handle keeps a snapshot: replacing the resource does not
        // disturb a reader that already opened it.
        let entry = self.lookup(path).map_err(|source| ResourceError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Box::new(MemoryHandle {
            contents: entry.contents,
        }))
    }

    fn stat(&self, path: &Path) -> Result<ResourceStat, ResourceError> {
        let entry = self.lookup(path).map_err(|source| ResourceError::Stat {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(ResourceStat {
            len: entry.contents.len() as u64,
            modified: entry.modified,
        })
    }

    fn write(&self, path: &Path, contents: &[u8]) -> Result<(), ResourceError> {
        if self.inner.read().read_only.contains(path) {
            return Err(ResourceError::Write {
                path: path.to_path_buf(),
                source: std::io::Error::from(ErrorKind::PermissionDenied),
            });
        }
        self.insert(path, contents);
        Ok(())
    }
}
