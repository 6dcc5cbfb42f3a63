// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Indicator control: one method that switches an LED on or off.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::ids::CONTROL_SET_METHOD;
use crate::dispatch::{CommandDispatcher, DispatcherBuilder, MethodHandler, Reply};
use crate::error::{DispatchError, ResourceError};
use crate::resource::ResourceAccessor;
use crate::types::{ClientHandle, ControlCommand, ReasonCode};

/// Payload of a successful control reply.
pub const CONTROL_OK: u8 = 1;

/// Applies a control command to the physical indicator.
pub trait IndicatorSink: Send + Sync {
    /// Drives the indicator to the command's level.
    ///
    /// # Errors
    ///
    /// Returns a `ResourceError` if the indicator cannot be written.
    fn apply(&self, command: ControlCommand) -> Result<(), ResourceError>;
}

/// An indicator backed by a brightness file.
#[derive(Debug, Clone)]
pub struct FileIndicator<A> {
    accessor: A,
    path: PathBuf,
}

impl<A: ResourceAccessor> FileIndicator<A> {
    /// Creates an indicator writing to `path`.
    pub fn new(accessor: A, path: impl Into<PathBuf>) -> Self {
        Self {
            accessor,
            path: path.into(),
        }
    }

    /// Returns the brightness file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl<A: ResourceAccessor> IndicatorSink for FileIndicator<A> {
    fn apply(&self, command: ControlCommand) -> Result<(), ResourceError> {
        self.accessor.write(&self.path, command.level())
    }
}

/// Handles the set-indicator method.
///
/// Replies `[1]` once the indicator was written, `InvalidCommand` for an
/// unknown command byte and `WriteFailed` if the write fails.
#[derive(Debug)]
pub struct ControlService<S> {
    indicator: S,
}

impl<S: IndicatorSink> ControlService<S> {
    /// Creates the service.
    pub fn new(indicator: S) -> Self {
        Self { indicator }
    }

    /// Returns the indicator sink.
    pub fn indicator(&self) -> &S {
        &self.indicator
    }

    /// Executes one control request.
    pub fn set(&self, client: ClientHandle, payload: &[u8]) -> Reply {
        let command = match ControlCommand::decode(payload) {
            Ok(command) => command,
            Err(e) => {
                tracing::warn!(%client, error = %e, "Rejecting control request");
                return Reply::Error(ReasonCode::InvalidCommand);
            }
        };

        match self.indicator.apply(command) {
            Ok(()) => {
                tracing::info!(%client, %command, "Indicator set");
                Reply::ok(vec![CONTROL_OK])
            }
            Err(e) => {
                tracing::warn!(%client, %command, error = %e, "Indicator write failed");
                Reply::Error(ReasonCode::WriteFailed)
            }
        }
    }

    /// Registers the service's method.
    ///
    /// # Errors
    ///
    /// Returns `DispatchError::DuplicateMethod` if the builder already
    /// handles the control method.
    pub fn register(
        self: Arc<Self>,
        builder: DispatcherBuilder,
    ) -> Result<DispatcherBuilder, DispatchError>
    where
        S: 'static,
    {
        builder.register(CONTROL_SET_METHOD, ControlHandler(self))
    }

    /// Builds a dispatcher serving only this service.
    ///
    /// # Errors
    ///
    /// Never fails in practice; see [`ControlService::register`].
    pub fn dispatcher(self: Arc<Self>) -> Result<CommandDispatcher, DispatchError>
    where
        S: 'static,
    {
        Ok(self.register(CommandDispatcher::builder())?.build())
    }
}

struct ControlHandler<S>(Arc<ControlService<S>>);

impl<S: IndicatorSink> MethodHandler for ControlHandler<S> {
    fn call(&self, client: ClientHandle, payload: &[u8]) -> Reply {
        self.0.set(client, payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::MemoryAccessor;

    const CLIENT: ClientHandle = ClientHandle::new(0x0101);

    fn service() -> (MemoryAccessor, ControlService<FileIndicator<MemoryAccessor>>) {
        let accessor = MemoryAccessor::new();
        accessor.insert("brightness", b"0".to_vec());
        let service = ControlService::new(FileIndicator::new(accessor.clone(), "brightness"));
        (accessor, service)
    }

    #[test]
    fn activate_writes_one() {
        let (accessor, service) = service();
        assert_eq!(service.set(CLIENT, &[1]), Reply::Ok(vec![1]));
        assert_eq!(accessor.contents("brightness"), Some(b"1".to_vec()));
    }

    #[test]
    fn deactivate_writes_zero() {
        let (accessor, service) = service();
        service.set(CLIENT, &[1]);
        assert_eq!(service.set(CLIENT, &[2]), Reply::Ok(vec![1]));
        assert_eq!(accessor.contents("brightness"), Some(b"0".to_vec()));
    }

    #[test]
    fn unknown_command_is_rejected_without_writing() {
        let (accessor, service) = service();
        assert_eq!(
            service.set(CLIENT, &[9]),
            Reply::Error(ReasonCode::InvalidCommand)
        );
        assert_eq!(
            service.set(CLIENT, &[]),
            Reply::Error(ReasonCode::InvalidCommand)
        );
        assert_eq!(accessor.contents("brightness"), Some(b"0".to_vec()));
    }

    #[test]
    fn failed_write_is_reported() {
        let (accessor, service) = service();
        accessor.set_read_only("brightness", true);
        assert_eq!(
            service.set(CLIENT, &[1]),
            Reply::Error(ReasonCode::WriteFailed)
        );
    }

    #[test]
    fn dispatcher_routes_set_method() {
        let (_, service) = service();
        let dispatcher = Arc::new(service).dispatcher().unwrap();
        assert_eq!(dispatcher.methods(), vec![CONTROL_SET_METHOD]);
        assert_eq!(
            dispatcher.handle(CONTROL_SET_METHOD, CLIENT, &[1]),
            Ok(Reply::Ok(vec![1]))
        );
    }
}
