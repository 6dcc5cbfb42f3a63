// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Method routing.

use std::collections::HashMap;
use std::sync::Arc;

use super::reply::Reply;
use crate::error::DispatchError;
use crate::lifecycle::LifecycleHandle;
use crate::types::{ClientHandle, MethodId};

/// Handles one method.
///
/// Handlers run synchronously on the caller's thread. A handler that owns
/// mutable state serializes access to it internally.
pub trait MethodHandler: Send + Sync {
    /// Produces the reply for one request.
    fn call(&self, client: ClientHandle, payload: &[u8]) -> Reply;
}

impl<F> MethodHandler for F
where
    F: Fn(ClientHandle, &[u8]) -> Reply + Send + Sync,
{
    fn call(&self, client: ClientHandle, payload: &[u8]) -> Reply {
        self(client, payload)
    }
}

/// Collects handlers before the dispatcher goes live.
#[derive(Default)]
pub struct DispatcherBuilder {
    handlers: HashMap<MethodId, Arc<dyn MethodHandler>>,
    lifecycle: Option<LifecycleHandle>,
}

impl DispatcherBuilder {
    /// Creates an empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the handler for `method`.
    ///
    /// # Errors
    ///
    /// Returns `DispatchError::DuplicateMethod` if `method` already has one.
    pub fn register(
        mut self,
        method: MethodId,
        handler: impl MethodHandler + 'static,
    ) -> Result<Self, DispatchError> {
        self.register_shared(method, Arc::new(handler))?;
        Ok(self)
    }

    /// Registers a handler shared with other methods or owners.
    ///
    /// # Errors
    ///
    /// Returns `DispatchError::DuplicateMethod` if `method` already has one.
    pub fn register_shared(
        &mut self,
        method: MethodId,
        handler: Arc<dyn MethodHandler>,
    ) -> Result<(), DispatchError> {
        if self.handlers.contains_key(&method) {
            return Err(DispatchError::DuplicateMethod(method));
        }
        self.handlers.insert(method, handler);
        Ok(())
    }

    /// Refuses calls until the service has registered.
    #[must_use]
    pub fn with_lifecycle(mut self, lifecycle: LifecycleHandle) -> Self {
        self.lifecycle = Some(lifecycle);
        self
    }

    /// Freezes the handler table.
    #[must_use]
    pub fn build(self) -> CommandDispatcher {
        CommandDispatcher {
            handlers: self.handlers,
            lifecycle: self.lifecycle,
        }
    }
}

/// Routes incoming method calls to their handlers.
///
/// # Examples
///
/// ```
/// use devctl_lib::dispatch::{CommandDispatcher, Reply};
/// use devctl_lib::types::{ClientHandle, MethodId};
///
/// let dispatcher = CommandDispatcher::builder()
///     .register(MethodId::new(1), |_client, payload: &[u8]| Reply::ok(payload.to_vec()))
///     .unwrap()
///     .build();
///
/// let reply = dispatcher.handle(MethodId::new(1), ClientHandle::new(7), &[42]).unwrap();
/// assert_eq!(reply, Reply::Ok(vec![42]));
/// ```
pub struct CommandDispatcher {
    handlers: HashMap<MethodId, Arc<dyn MethodHandler>>,
    lifecycle: Option<LifecycleHandle>,
}

impl CommandDispatcher {
    /// Starts building a dispatcher.
    #[must_use]
    pub fn builder() -> DispatcherBuilder {
        DispatcherBuilder::new()
    }

    /// Routes one call.
    ///
    /// # Errors
    ///
    /// Returns `DispatchError::NotReady` before registration, or
    /// `DispatchError::UnknownMethod` if no handler is registered.
    pub fn handle(
        &self,
        method: MethodId,
        client: ClientHandle,
        payload: &[u8],
    ) -> Result<Reply, DispatchError> {
        if let Some(lifecycle) = &self.lifecycle
            && !lifecycle.is_registered()
        {
            tracing::debug!(method = %method, %client, state = %lifecycle.state(), "Call before registration");
            return Err(DispatchError::NotReady);
        }

        let Some(handler) = self.handlers.get(&method) else {
            tracing::debug!(method = %method, %client, "Unknown method");
            return Err(DispatchError::UnknownMethod(method));
        };

        let reply = handler.call(client, payload);
        tracing::debug!(
            method = %method,
            %client,
            len = payload.len(),
            reason = ?reply.reason(),
            "Dispatched"
        );
        Ok(reply)
    }

    /// Returns `true` if `method` has a handler.
    #[must_use]
    pub fn has_method(&self, method: MethodId) -> bool {
        self.handlers.contains_key(&method)
    }

    /// Returns the registered methods, sorted.
    #[must_use]
    pub fn methods(&self) -> Vec<MethodId> {
        let mut methods: Vec<_> = self.handlers.keys().copied().collect();
        methods.sort_unstable();
        methods
    }
}

impl std::fmt::Debug for CommandDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandDispatcher")
            .field("methods", &self.methods())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lifecycle::LifecycleController;
    use crate::transport::MemoryTransport;
    use crate::types::{InstanceId, ReasonCode, ServiceId, ServiceIdentity};

    const ECHO: MethodId = MethodId::new(1);
    const FAIL: MethodId = MethodId::new(2);

    fn echo(_: ClientHandle, payload: &[u8]) -> Reply {
        Reply::ok(payload.to_vec())
    }

    fn dispatcher() -> CommandDispatcher {
        CommandDispatcher::builder()
            .register(ECHO, echo)
            .unwrap()
            .register(FAIL, |_: ClientHandle, _: &[u8]| {
                Reply::Error(ReasonCode::InvalidCommand)
            })
            .unwrap()
            .build()
    }

    #[test]
    fn routes_to_handler() {
        let reply = dispatcher()
            .handle(ECHO, ClientHandle::new(1), b"abc")
            .unwrap();
        assert_eq!(reply, Reply::Ok(b"abc".to_vec()));
    }

    #[test]
    fn handler_reason_is_a_reply() {
        let reply = dispatcher().handle(FAIL, ClientHandle::new(1), &[]).unwrap();
        assert_eq!(reply.reason(), Some(ReasonCode::InvalidCommand));
    }

    #[test]
    fn unknown_method() {
        let err = dispatcher()
            .handle(MethodId::new(0x42), ClientHandle::new(1), &[])
            .unwrap_err();
        assert_eq!(err, DispatchError::UnknownMethod(MethodId::new(0x42)));
    }

    #[test]
    fn duplicate_registration() {
        let result = CommandDispatcher::builder()
            .register(ECHO, echo)
            .unwrap()
            .register(ECHO, echo);
        assert!(matches!(result, Err(DispatchError::DuplicateMethod(m)) if m == ECHO));
    }

    #[test]
    fn methods_are_listed() {
        let dispatcher = dispatcher();
        assert_eq!(dispatcher.methods(), vec![ECHO, FAIL]);
        assert!(dispatcher.has_method(ECHO));
        assert!(!dispatcher.has_method(MethodId::new(3)));
    }

    #[test]
    fn not_ready_until_registered() {
        let transport = Arc::new(MemoryTransport::new());
        let identity = ServiceIdentity::new(ServiceId::new(0x1111), InstanceId::new(1));
        let controller = LifecycleController::server(transport, identity);

        let dispatcher = CommandDispatcher::builder()
            .register(ECHO, echo)
            .unwrap()
            .with_lifecycle(controller.watch())
            .build();

        assert_eq!(
            dispatcher.handle(ECHO, ClientHandle::new(1), &[]),
            Err(DispatchError::NotReady)
        );

        controller.begin_registration().unwrap();
        assert_eq!(
            dispatcher.handle(ECHO, ClientHandle::new(1), &[]),
            Err(DispatchError::NotReady)
        );

        controller.on_registration_changed(true).unwrap();
        assert!(dispatcher.handle(ECHO, ClientHandle::new(1), &[]).is_ok());
    }
}
