// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! One offered service: lifecycle, dispatcher and subscriptions together.

use std::sync::Arc;

use crate::dispatch::{CommandDispatcher, DispatcherBuilder, Reply};
use crate::error::{DispatchError, Error};
use crate::lifecycle::{LifecycleController, LifecycleState};
use crate::subscription::SubscriptionManager;
use crate::transport::BusTransport;
use crate::types::{ClientHandle, EventGroupId, EventId, MethodId, ServiceIdentity};

/// A server-role service endpoint.
///
/// This is the surface a transport integration drives: it forwards
/// registration and availability reports, incoming requests and
/// subscription traffic to the matching component. Declared events are
/// offered to the bus and made subscribable in one step.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use devctl_lib::dispatch::{CommandDispatcher, Reply};
/// use devctl_lib::service::ServiceEndpoint;
/// use devctl_lib::transport::MemoryTransport;
/// use devctl_lib::types::*;
///
/// let transport = Arc::new(MemoryTransport::new());
/// let identity = ServiceIdentity::new(ServiceId::new(0x4444), InstanceId::new(1));
/// let methods = CommandDispatcher::builder()
///     .register(MethodId::new(1), |_: ClientHandle, _: &[u8]| Reply::ok(vec![1]))
///     .unwrap();
/// let endpoint = ServiceEndpoint::new(transport, identity).with_methods(methods);
///
/// endpoint.start().unwrap();
/// endpoint.on_registration_changed(true).unwrap();
///
/// let reply = endpoint.on_request(MethodId::new(1), ClientHandle::new(9), &[]).unwrap();
/// assert_eq!(reply, Reply::Ok(vec![1]));
/// ```
pub struct ServiceEndpoint {
    lifecycle: LifecycleController,
    dispatcher: CommandDispatcher,
    subscriptions: Arc<SubscriptionManager>,
}

impl ServiceEndpoint {
    /// Creates an endpoint with no methods and no events.
    #[must_use]
    pub fn new(transport: Arc<dyn BusTransport>, identity: ServiceIdentity) -> Self {
        let lifecycle = LifecycleController::server(transport.clone(), identity);
        let subscriptions = Arc::new(
            SubscriptionManager::new(identity, transport).with_lifecycle(lifecycle.watch()),
        );
        let dispatcher = CommandDispatcher::builder()
            .with_lifecycle(lifecycle.watch())
            .build();
        Self {
            lifecycle,
            dispatcher,
            subscriptions,
        }
    }

    /// Declares an event published to `group`.
    #[must_use]
    pub fn with_event(mut self, event: EventId, group: EventGroupId) -> Self {
        self.lifecycle = self.lifecycle.with_event(event, vec![group]);
        self.subscriptions.offer_event(event, [group]);
        self
    }

    /// Installs the method handlers.
    #[must_use]
    pub fn with_methods(mut self, methods: DispatcherBuilder) -> Self {
        self.dispatcher = methods.with_lifecycle(self.lifecycle.watch()).build();
        self
    }

    /// Returns the service identity.
    #[must_use]
    pub fn identity(&self) -> ServiceIdentity {
        self.lifecycle.identity()
    }

    /// Returns the lifecycle controller.
    #[must_use]
    pub fn lifecycle(&self) -> &LifecycleController {
        &self.lifecycle
    }

    /// Returns the current lifecycle state.
    #[must_use]
    pub fn state(&self) -> LifecycleState {
        self.lifecycle.state()
    }

    /// Returns the subscription manager, shared with event publishers.
    #[must_use]
    pub fn subscriptions(&self) -> &Arc<SubscriptionManager> {
        &self.subscriptions
    }

    /// Returns the dispatcher.
    #[must_use]
    pub fn dispatcher(&self) -> &CommandDispatcher {
        &self.dispatcher
    }

    /// Starts registration.
    ///
    /// # Errors
    ///
    /// See [`LifecycleController::begin_registration`].
    pub fn start(&self) -> Result<(), Error> {
        self.lifecycle.begin_registration()
    }

    // ========================================================================
    // Inbound transport traffic
    // ========================================================================

    /// Forwards a registration report; offers the service on registration.
    ///
    /// # Errors
    ///
    /// See [`LifecycleController::on_registration_changed`].
    pub fn on_registration_changed(&self, registered: bool) -> Result<(), Error> {
        self.lifecycle.on_registration_changed(registered)
    }

    /// Forwards an availability report.
    pub fn on_availability_changed(&self, available: bool) {
        self.lifecycle.on_availability_changed(available);
    }

    /// Forwards loss of the transport connection and drops every
    /// subscription; clients subscribe again once the service is back.
    pub fn on_transport_disconnected(&self) {
        self.lifecycle.on_transport_disconnected();
        self.subscriptions.clear_members();
    }

    /// Routes an incoming request.
    ///
    /// # Errors
    ///
    /// See [`CommandDispatcher::handle`].
    pub fn on_request(
        &self,
        method: MethodId,
        client: ClientHandle,
        payload: &[u8],
    ) -> Result<Reply, DispatchError> {
        self.dispatcher.handle(method, client, payload)
    }

    /// Handles a subscription request; `false` means negative acknowledgement.
    pub fn on_subscribe(&self, group: EventGroupId, client: ClientHandle) -> bool {
        self.subscriptions.on_subscribe(group, client)
    }

    /// Handles an unsubscription.
    pub fn on_unsubscribe(&self, group: EventGroupId, client: ClientHandle) {
        self.subscriptions.on_unsubscribe(group, client);
    }

    /// Drops a disconnected client from every group.
    pub fn on_client_disconnected(&self, client: ClientHandle) {
        self.subscriptions.on_client_disconnected(client);
    }
}

impl std::fmt::Debug for ServiceEndpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceEndpoint")
            .field("lifecycle", &self.lifecycle)
            .field("dispatcher", &self.dispatcher)
            .field("subscriptions", &self.subscriptions)
            .finish()
    }
}
