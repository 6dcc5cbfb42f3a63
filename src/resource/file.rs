// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Filesystem backed resource accessor.

use std::fs::File;
use std::io::{ErrorKind, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};

use super::{OpenResource, ResourceAccessor, ResourceStat};
use crate::error::ResourceError;

/// Resource accessor over the local filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct FileAccessor;

impl FileAccessor {
    /// Creates a filesystem accessor.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

struct OpenFile {
    path: PathBuf,
    file: File,
    position: u64,
}

impl OpenResource for OpenFile {
    fn read_at(&mut self, offset: u64, buf: &mut [u8]) -> Result<usize, ResourceError> {
        let read_err = |source| ResourceError::Read {
            path: self.path.clone(),
            source,
        };

        if offset != self.position {
            self.file.seek(SeekFrom::Start(offset)).map_err(read_err)?;
            self.position = offset;
        }

        // Fill the buffer unless the file ends first.
        let mut filled = 0;
        while filled < buf.len() {
            match self.file.read(&mut buf[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == ErrorKind::Interrupted => {}
                Err(e) => return Err(read_err(e)),
            }
        }
        self.position += filled as u64;
        Ok(filled)
    }
}

impl ResourceAccessor for FileAccessor {
    fn open(&self, path: &Path) -> Result<Box<dyn OpenResource>, ResourceError> {
        let file = File::open(path).map_err(|source| ResourceError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::trace!(path = %path.display(), "Opened resource");
        Ok(Box::new(OpenFile {
            path: path.to_path_buf(),
            file,
            position: 0,
        }))
    }

    fn stat(&self, path: &Path) -> Result<ResourceStat, ResourceError> {
        let stat_err = |source| ResourceError::Stat {
            path: path.to_path_buf(),
            source,
        };
        let metadata = std::fs::metadata(path).map_err(stat_err)?;
        let modified = metadata.modified().map_err(stat_err)?;
        Ok(ResourceStat {
            len: metadata.len(),
            modified: DateTime::<Utc>::from(modified),
        })
    }

    fn write(&self, path: &Path, contents: &[u8]) -> Result<(), ResourceError> {
        std::fs::write(path, contents).map_err(|source| ResourceError::Write {
            path: path.to_path_buf(),
            source,
        })
    }
}
