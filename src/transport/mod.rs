// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The bus runtime seen from the service core.
//!
//! Service discovery, marshalling and routing belong to the bus runtime.
//! The core only needs the handful of calls below, invoked at well-defined
//! points:
//!
//! | Call | Invoked by |
//! |------|------------|
//! | [`BusTransport::register`] | lifecycle controller, on startup |
//! | [`BusTransport::offer_service`] / [`BusTransport::offer_event`] | lifecycle controller, once registered (server) |
//! | [`BusTransport::request_service`] | lifecycle controller, once registered (client) |
//! | [`BusTransport::subscribe`] | service proxy, when the service becomes available |
//! | [`BusTransport::send_request`] | service proxy, while available |
//! | [`NotificationSink::send_notification`] | subscription manager fan-out |
//!
//! Inbound traffic flows the other way: the transport integration calls the
//! lifecycle controller's `on_*` methods, the dispatcher's `handle` and the
//! subscription manager's `on_subscribe`/`on_unsubscribe`.

mod memory;

use crate::error::TransportError;
use crate::types::{ClientHandle, EventGroupId, EventId, MethodId, ServiceIdentity};

pub use memory::{MemoryTransport, TransportCall};

/// Delivers event notifications to one client.
pub trait NotificationSink: Send + Sync {
    /// Sends one notification to `client`.
    ///
    /// # Errors
    ///
    /// Returns `TransportError::SendFailed` if the message cannot be queued.
    fn send_notification(
        &self,
        client: ClientHandle,
        identity: ServiceIdentity,
        event: EventId,
        payload: &[u8],
    ) -> Result<(), TransportError>;
}

/// Registration, offer/request and send primitives of the bus runtime.
pub trait BusTransport: NotificationSink {
    /// Starts registration with the routing manager.
    ///
    /// Completion is reported asynchronously through the lifecycle
    /// controller's `on_registration_changed`.
    ///
    /// # Errors
    ///
    /// Returns `TransportError::RegistrationFailed` if the request cannot
    /// be issued.
    fn register(&self) -> Result<(), TransportError>;

    /// Announces a service instance.
    ///
    /// # Errors
    ///
    /// Returns a `TransportError` if the offer cannot be issued.
    fn offer_service(&self, identity: ServiceIdentity) -> Result<(), TransportError>;

    /// Declares an event and the groups it is published to.
    ///
    /// # Errors
    ///
    /// Returns a `TransportError` if the offer cannot be issued.
    fn offer_event(
        &self,
        identity: ServiceIdentity,
        event: EventId,
        groups: &[EventGroupId],
    ) -> Result<(), TransportError>;

    /// Asks the bus to find a remote service instance.
    ///
    /// # Errors
    ///
    /// Returns a `TransportError` if the request cannot be issued.
    fn request_service(&self, identity: ServiceIdentity) -> Result<(), TransportError>;

    /// Subscribes to an event group of a remote service.
    ///
    /// # Errors
    ///
    /// Returns a `TransportError` if the subscription cannot be issued.
    fn subscribe(&self, identity: ServiceIdentity, group: EventGroupId)
    -> Result<(), TransportError>;

    /// Sends a method request to a remote service.
    ///
    /// # Errors
    ///
    /// Returns `TransportError::SendFailed` if the message cannot be queued.
    fn send_request(
        &self,
        identity: ServiceIdentity,
        method: MethodId,
        payload: &[u8],
    ) -> Result<(), TransportError>;
}
