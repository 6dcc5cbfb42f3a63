// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Firmware download: chunked image transfer plus a new-image event.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use super::ids::{
    FIRMWARE_AVAILABLE_EVENT, FIRMWARE_GET_CHUNK_METHOD, FIRMWARE_REQUEST_DOWNLOAD_METHOD,
};
use crate::dispatch::{CommandDispatcher, DispatcherBuilder, Reply};
use crate::error::DispatchError;
use crate::resource::ResourceAccessor;
use crate::subscription::SubscriptionManager;
use crate::transfer::{TransferEngine, TransferState};
use crate::types::{ChunkRequest, ClientHandle, ReasonCode, encode_flag};
use crate::watcher::{ModifiedTimeProbe, StateWatcher, spawn_poll_loop};

type ImageWatcher<A> = StateWatcher<ModifiedTimeProbe<A>>;

/// Serves a staged firmware image in chunks and announces new images.
///
/// All chunk requests go through one [`TransferEngine`] behind a mutex, so
/// concurrent requests are serialized. When the staged file's modification
/// time moves forward the engine is restaged (the next chunk request starts
/// at offset 0) and subscribers receive the version label.
///
/// Locks are always taken watcher first, then engine.
pub struct FirmwareService<A: ResourceAccessor + Clone> {
    accessor: A,
    engine: Mutex<TransferEngine<A>>,
    watcher: Mutex<Option<ImageWatcher<A>>>,
    version: Mutex<String>,
    subscriptions: Arc<SubscriptionManager>,
}

impl<A: ResourceAccessor + Clone> FirmwareService<A> {
    /// Creates a service with no image staged.
    pub fn new(
        accessor: A,
        max_chunk_size: u32,
        version: impl Into<String>,
        subscriptions: Arc<SubscriptionManager>,
    ) -> Self {
        Self {
            engine: Mutex::new(
                TransferEngine::new(accessor.clone()).with_max_chunk_size(max_chunk_size),
            ),
            accessor,
            watcher: Mutex::new(None),
            version: Mutex::new(version.into()),
            subscriptions,
        }
    }

    /// Stages `path` for download and starts watching it.
    ///
    /// The file's current modification time becomes the baseline, so staging
    /// does not announce the image by itself.
    pub fn stage(&self, path: impl Into<PathBuf>) {
        let path = path.into();
        let mut watcher = self.watcher.lock();
        *watcher = Some(StateWatcher::primed(ModifiedTimeProbe::new(
            self.accessor.clone(),
            &path,
        )));
        self.engine.lock().configure(&path);
        drop(watcher);
        tracing::info!(path = %path.display(), "Firmware staged");
    }

    /// Withdraws the staged image.
    pub fn unstage(&self) {
        let mut watcher = self.watcher.lock();
        *watcher = None;
        self.engine.lock().clear();
        drop(watcher);
        tracing::info!("Firmware withdrawn");
    }

    /// Sets the label announced with the next new image.
    pub fn set_version(&self, version: impl Into<String>) {
        *self.version.lock() = version.into();
    }

    /// Returns the label announced with new images.
    pub fn version(&self) -> String {
        self.version.lock().clone()
    }

    /// Returns the staged image path.
    pub fn staged_path(&self) -> Option<PathBuf> {
        self.engine.lock().resource_path().map(Path::to_path_buf)
    }

    /// Returns the transfer state.
    pub fn transfer_state(&self) -> TransferState {
        self.engine.lock().state()
    }

    // ========================================================================
    // Methods
    // ========================================================================

    /// Replies `[1]` if an image is staged, `[0]` otherwise.
    pub fn request_download(&self, client: ClientHandle) -> Reply {
        let ready = self.engine.lock().download_ready();
        tracing::info!(%client, ready, "Download requested");
        Reply::ok(encode_flag(ready))
    }

    /// Delivers the next chunk.
    pub fn get_chunk(&self, client: ClientHandle, payload: &[u8]) -> Reply {
        let request = match ChunkRequest::decode(payload) {
            Ok(request) => request,
            Err(e) => {
                tracing::warn!(%client, error = %e, "Malformed chunk request");
                return Reply::Error(ReasonCode::InvalidChunkSize);
            }
        };
        self.engine.lock().next_chunk(request.requested_size).into()
    }

    /// Registers both firmware methods.
    ///
    /// # Errors
    ///
    /// Returns `DispatchError::DuplicateMethod` if the builder already
    /// handles one of them.
    pub fn register(
        self: Arc<Self>,
        builder: DispatcherBuilder,
    ) -> Result<DispatcherBuilder, DispatchError>
    where
        A: 'static,
    {
        let download = Arc::clone(&self);
        builder
            .register(
                FIRMWARE_REQUEST_DOWNLOAD_METHOD,
                move |client: ClientHandle, _: &[u8]| download.request_download(client),
            )?
            .register(
                FIRMWARE_GET_CHUNK_METHOD,
                move |client: ClientHandle, payload: &[u8]| self.get_chunk(client, payload),
            )
    }

    /// Builds a dispatcher serving only this service.
    ///
    /// # Errors
    ///
    /// See [`FirmwareService::register`].
    pub fn dispatcher(self: Arc<Self>) -> Result<CommandDispatcher, DispatchError>
    where
        A: 'static,
    {
        Ok(self.register(CommandDispatcher::builder())?.build())
    }

    // ========================================================================
    // Watching
    // ========================================================================

    /// Runs one watch cycle.
    ///
    /// Returns `true` if a new image was detected and announced.
    pub fn poll_once(&self) -> bool {
        let path = {
            let mut guard = self.watcher.lock();
            let Some(watcher) = guard.as_mut() else {
                return false;
            };
            if watcher.poll().is_none() {
                return false;
            }
            let path = watcher.state().path.clone();
            self.engine.lock().configure(&path);
            path
        };

        let version = self.version();
        let delivered = self
            .subscriptions
            .notify_event(FIRMWARE_AVAILABLE_EVENT, version.as_bytes());
        tracing::info!(path = %path.display(), %version, delivered, "New firmware available");
        true
    }

    /// Polls every `period` until `cancel` fires.
    pub fn spawn(self: Arc<Self>, period: Duration, cancel: CancellationToken) -> JoinHandle<()>
    where
        A: 'static,
    {
        spawn_poll_loop("firmware-watcher", period, cancel, move || {
            self.poll_once();
        })
    }
}

impl<A: ResourceAccessor + Clone> std::fmt::Debug for FirmwareService<A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FirmwareService")
            .field("engine", &*self.engine.lock())
            .field("version", &*self.version.lock())
            .finish_non_exhaustive()
    }
}
