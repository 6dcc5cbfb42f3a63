// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Pull-based chunked delivery of a backing resource.

use std::path::{Path, PathBuf};

use super::session::{TransferSession, TransferState};
use crate::resource::{OpenResource, ResourceAccessor};
use crate::types::ReasonCode;

/// Default cap on a single chunk, in bytes.
pub const DEFAULT_MAX_CHUNK_SIZE: u32 = 64 * 1024;

/// Result of one chunk request: the bytes, or the reason code to reply with.
pub type ChunkResult = Result<Vec<u8>, ReasonCode>;

/// Delivers a resource as a sequence of bounded chunks.
///
/// The client repeatedly asks for "the next chunk of at most N bytes"; the
/// engine keeps the cursor. State machine:
///
/// ```text
///  NoResource ──configure──▶ Closed ──request──▶ Open ──zero-byte read──▶ Exhausted
///                              ▲  │ open failed                              │
///                              │  └──────────▶ (stays Closed)                │
///                              └──────────────── configure ◀─────────────────┘
/// ```
///
/// The engine is stateful and single-session: one consumer drives it. Callers
/// sharing an engine between threads must serialize requests. Delivery is not
/// retry-safe; if a reply carrying bytes is lost, the cursor has already
/// moved and a retry returns the following chunk.
///
/// # Examples
///
/// ```
/// use devctl_lib::resource::MemoryAccessor;
/// use devctl_lib::transfer::TransferEngine;
/// use devctl_lib::types::ReasonCode;
///
/// let accessor = MemoryAccessor::new();
/// accessor.insert("firmware.bin", vec![0xAB; 25]);
///
/// let mut engine = TransferEngine::new(accessor);
/// assert_eq!(engine.next_chunk(10), Err(ReasonCode::ResourceNotConfigured));
///
/// engine.configure("firmware.bin");
/// assert_eq!(engine.next_chunk(10).unwrap().len(), 10);
/// assert_eq!(engine.next_chunk(10).unwrap().len(), 10);
/// assert_eq!(engine.next_chunk(10).unwrap().len(), 5);
/// assert_eq!(engine.next_chunk(10), Err(ReasonCode::EndOfResource));
/// ```
pub struct TransferEngine<A> {
    accessor: A,
    max_chunk_size: u32,
    resource_path: Option<PathBuf>,
    session: Option<TransferSession>,
    handle: Option<Box<dyn OpenResource>>,
}

impl<A: ResourceAccessor> TransferEngine<A> {
    /// Creates an engine with no resource configured.
    pub fn new(accessor: A) -> Self {
        Self {
            accessor,
            max_chunk_size: DEFAULT_MAX_CHUNK_SIZE,
            resource_path: None,
            session: None,
            handle: None,
        }
    }

    /// Sets the largest chunk a client may request.
    #[must_use]
    pub fn with_max_chunk_size(mut self, max_chunk_size: u32) -> Self {
        self.max_chunk_size = max_chunk_size.max(1);
        self
    }

    /// Stages a resource for transfer.
    ///
    /// Any session in progress is discarded: the handle is closed and the
    /// next request starts at offset 0.
    pub fn configure(&mut self, path: impl Into<PathBuf>) {
        let path = path.into();
        if let Some(session) = self.end_session() {
            tracing::info!(
                session = %session.id,
                cursor = session.cursor,
                "Discarding transfer session for reconfiguration"
            );
        }
        tracing::debug!(path = %path.display(), "Transfer resource configured");
        self.resource_path = Some(path);
    }

    /// Removes the configured resource.
    pub fn clear(&mut self) {
        self.end_session();
        self.resource_path = None;
    }

    /// Returns the configured resource path.
    #[must_use]
    pub fn resource_path(&self) -> Option<&Path> {
        self.resource_path.as_deref()
    }

    /// Returns `true` when a resource is staged for download.
    #[must_use]
    pub fn download_ready(&self) -> bool {
        self.resource_path.is_some()
    }

    /// Returns the current session, if one was started since the last
    /// configuration.
    #[must_use]
    pub fn session(&self) -> Option<&TransferSession> {
        self.session.as_ref()
    }

    /// Returns the largest chunk a client may request.
    #[must_use]
    pub fn max_chunk_size(&self) -> u32 {
        self.max_chunk_size
    }

    /// Returns the engine state.
    #[must_use]
    pub fn state(&self) -> TransferState {
        match (&self.resource_path, &self.session) {
            (None, _) => TransferState::NoResource,
            (Some(_), None) => TransferState::Closed,
            (Some(_), Some(s)) if s.is_exhausted => TransferState::Exhausted,
            (Some(_), Some(s)) if s.is_open => TransferState::Open,
            (Some(_), Some(_)) => TransferState::Closed,
        }
    }

    /// Delivers the next chunk of at most `requested_size` bytes.
    ///
    /// # Errors
    ///
    /// Returns the reason code to reply with:
    ///
    /// - `ResourceNotConfigured` if no resource is staged
    /// - `InvalidChunkSize` if the size is zero or above the cap
    /// - `OpenFailed` if the resource cannot be opened
    /// - `EndOfResource` once every byte has been delivered, and on every
    ///   request after that until the resource is reconfigured
    pub fn next_chunk(&mut self, requested_size: u32) -> ChunkResult {
        let Some(path) = self.resource_path.clone() else {
            return Err(ReasonCode::ResourceNotConfigured);
        };

        if requested_size == 0 || requested_size > self.max_chunk_size {
            tracing::debug!(
                requested_size,
                max = self.max_chunk_size,
                "Rejecting chunk request"
            );
            return Err(ReasonCode::InvalidChunkSize);
        }

        if self.session.as_ref().is_some_and(|s| s.is_exhausted) {
            return Err(ReasonCode::EndOfResource);
        }

        if self.handle.is_none() {
            self.open(path)?;
        }

        self.read_next(requested_size)
    }

    fn open(&mut self, path: PathBuf) -> Result<(), ReasonCode> {
        match self.accessor.open(&path) {
            Ok(handle) => {
                let session = TransferSession::opened(path);
                tracing::info!(
                    session = %session.id,
                    path = %session.resource_path.display(),
                    "Transfer session opened"
                );
                self.handle = Some(handle);
                self.session = Some(session);
                Ok(())
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to open transfer resource");
                self.session = None;
                Err(ReasonCode::OpenFailed)
            }
        }
    }

    fn read_next(&mut self, requested_size: u32) -> ChunkResult {
        let (Some(handle), Some(session)) = (self.handle.as_mut(), self.session.as_mut()) else {
            return Err(ReasonCode::OpenFailed);
        };

        let mut buf = vec![0u8; requested_size as usize];
        let read = handle.read_at(session.cursor, &mut buf);

        match read {
            Ok(0) => {
                tracing::info!(
                    session = %session.id,
                    total = session.cursor,
                    "Transfer complete"
                );
                self.exhaust();
                Err(ReasonCode::EndOfResource)
            }
            Ok(n) => {
                buf.truncate(n);
                session.cursor += n as u64;
                tracing::trace!(session = %session.id, bytes = n, cursor = session.cursor, "Chunk delivered");
                Ok(buf)
            }
            Err(e) => {
                tracing::warn!(session = %session.id, error = %e, "Transfer read failed, ending session");
                self.exhaust();
                Err(ReasonCode::EndOfResource)
            }
        }
    }

    fn exhaust(&mut self) {
        self.handle = None;
        if let Some(session) = self.session.as_mut() {
            session.is_open = false;
            session.is_exhausted = true;
        }
    }

    fn end_session(&mut self) -> Option<TransferSession> {
        self.handle = None;
        self.session.take()
    }
}

impl<A> std::fmt::Debug for TransferEngine<A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransferEngine")
            .field("max_chunk_size", &self.max_chunk_size)
            .field("resource_path", &self.resource_path)
            .field("session", &self.session)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::MemoryAccessor;

    fn engine_with(len: usize) -> (MemoryAccessor, TransferEngine<MemoryAccessor>) {
        let accessor = MemoryAccessor::new();
        let contents: Vec<u8> = (0..len).map(|i| (i % 251) as u8).collect();
        accessor.insert("firmware.bin", contents);
        let mut engine = TransferEngine::new(accessor.clone());
        engine.configure("firmware.bin");
        (accessor, engine)
    }

    fn drain(engine: &mut TransferEngine<MemoryAccessor>, size: u32) -> Vec<u8> {
        let mut out = Vec::new();
        loop {
            match engine.next_chunk(size) {
                Ok(chunk) => {
                    assert!(!chunk.is_empty());
                    assert!(chunk.len() <= size as usize);
                    out.extend(chunk);
                }
                Err(ReasonCode::EndOfResource) => return out,
                Err(other) => panic!("unexpected reason {other}"),
            }
        }
    }

    #[test]
    fn firmware_scenario_25_bytes_by_10() {
        let (_, mut engine) = engine_with(25);

        assert_eq!(engine.next_chunk(10).unwrap().len(), 10);
        assert_eq!(engine.state(), TransferState::Open);
        assert_eq!(engine.next_chunk(10).unwrap().len(), 10);
        assert_eq!(engine.next_chunk(10).unwrap().len(), 5);
        assert_eq!(engine.next_chunk(10), Err(ReasonCode::EndOfResource));
        assert_eq!(engine.state(), TransferState::Exhausted);
    }

    #[test]
    fn concatenated_chunks_equal_resource() {
        for len in [0usize, 1, 9, 10, 11, 25, 1000] {
            for size in [1u32, 3, 10, 64, 4096] {
                let (accessor, mut engine) = engine_with(len);
                let expected = accessor.contents("firmware.bin").unwrap();
                assert_eq!(drain(&mut engine, size), expected, "len={len} size={size}");
            }
        }
    }

    #[test]
    fn cursor_never_exceeds_length() {
        let (_, mut engine) = engine_with(7);
        drain(&mut engine, 4);
        assert_eq!(engine.session().unwrap().cursor, 7);
    }

    #[test]
    fn no_resource_always_not_configured() {
        let mut engine = TransferEngine::new(MemoryAccessor::new());
        assert_eq!(engine.state(), TransferState::NoResource);
        for size in [0, 1, 10, u32::MAX] {
            assert_eq!(engine.next_chunk(size), Err(ReasonCode::ResourceNotConfigured));
        }
        assert!(!engine.download_ready());
    }

    #[test]
    fn open_failure_stays_closed() {
        let mut engine = TransferEngine::new(MemoryAccessor::new());
        engine.configure("missing.bin");

        assert_eq!(engine.next_chunk(10), Err(ReasonCode::OpenFailed));
        assert_eq!(engine.state(), TransferState::Closed);
        assert!(engine.session().is_none());
    }

    #[test]
    fn open_retried_after_resource_appears() {
        let accessor = MemoryAccessor::new();
        let mut engine = TransferEngine::new(accessor.clone());
        engine.configure("firmware.bin");
        assert_eq!(engine.next_chunk(4), Err(ReasonCode::OpenFailed));

        accessor.insert("firmware.bin", b"abcdef".to_vec());
        assert_eq!(engine.next_chunk(4).unwrap(), b"abcd");
    }

    #[test]
    fn exhausted_is_sticky_until_reconfigured() {
        let (_, mut engine) = engine_with(3);
        drain(&mut engine, 10);

        assert_eq!(engine.next_chunk(10), Err(ReasonCode::EndOfResource));
        assert_eq!(engine.next_chunk(10), Err(ReasonCode::EndOfResource));
        assert!(!engine.session().unwrap().is_open);
    }

    #[test]
    fn reconfigure_after_end_restarts_at_zero() {
        let (accessor, mut engine) = engine_with(12);
        let first = drain(&mut engine, 5);

        engine.configure("firmware.bin");
        assert_eq!(engine.state(), TransferState::Closed);
        let second = drain(&mut engine, 5);

        assert_eq!(first, second);
        assert_eq!(second, accessor.contents("firmware.bin").unwrap());
    }

    #[test]
    fn reconfigure_mid_transfer_discards_position() {
        let (accessor, mut engine) = engine_with(20);
        engine.next_chunk(8).unwrap();
        let old_session = engine.session().unwrap().id;

        accessor.insert("staged.bin", b"new image".to_vec());
        engine.configure("staged.bin");
        assert!(engine.session().is_none());

        assert_eq!(engine.next_chunk(3).unwrap(), b"new");
        assert_ne!(engine.session().unwrap().id, old_session);
    }

    #[test]
    fn invalid_sizes_leave_state_untouched() {
        let (_, mut engine) = engine_with(10);
        engine.next_chunk(4).unwrap();

        assert_eq!(engine.next_chunk(0), Err(ReasonCode::InvalidChunkSize));
        assert_eq!(
            engine.next_chunk(DEFAULT_MAX_CHUNK_SIZE + 1),
            Err(ReasonCode::InvalidChunkSize)
        );
        assert_eq!(engine.session().unwrap().cursor, 4);
        assert_eq!(engine.next_chunk(4).unwrap().len(), 4);
    }

    #[test]
    fn custom_cap() {
        let (_, engine) = engine_with(10);
        let mut engine = engine.with_max_chunk_size(8);
        assert_eq!(engine.next_chunk(9), Err(ReasonCode::InvalidChunkSize));
        assert_eq!(engine.next_chunk(8).unwrap().len(), 8);
    }

    #[test]
    fn clear_returns_to_no_resource() {
        let (_, mut engine) = engine_with(10);
        engine.next_chunk(4).unwrap();
        engine.clear();

        assert_eq!(engine.state(), TransferState::NoResource);
        assert_eq!(engine.next_chunk(4), Err(ReasonCode::ResourceNotConfigured));
    }
}
