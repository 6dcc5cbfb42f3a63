// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! In-memory transport that records every call.

use std::collections::HashSet;

use parking_lot::{Mutex, RwLock};

use super::{BusTransport, NotificationSink};
use crate::error::TransportError;
use crate::types::{ClientHandle, EventGroupId, EventId, MethodId, ServiceIdentity};

/// One call made by the core into the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportCall {
    /// Registration requested.
    Register,
    /// Service offered.
    OfferService(ServiceIdentity),
    /// Event offered.
    OfferEvent {
        /// The offering service.
        identity: ServiceIdentity,
        /// The offered event.
        event: EventId,
        /// Groups the event is published to.
        groups: Vec<EventGroupId>,
    },
    /// Remote service requested.
    RequestService(ServiceIdentity),
    /// Remote event group subscribed.
    Subscribe {
        /// The remote service.
        identity: ServiceIdentity,
        /// The subscribed group.
        group: EventGroupId,
    },
    /// Method request sent.
    Request {
        /// The remote service.
        identity: ServiceIdentity,
        /// The invoked method.
        method: MethodId,
        /// Request payload.
        payload: Vec<u8>,
    },
    /// Notification delivered to one client.
    Notify {
        /// Destination client.
        client: ClientHandle,
        /// The publishing service.
        identity: ServiceIdentity,
        /// The event.
        event: EventId,
        /// Notification payload.
        payload: Vec<u8>,
    },
}

/// A transport that records calls instead of touching a bus.
///
/// Used for tests and host-side simulation. Sends to clients marked
/// unreachable fail with `TransportError::SendFailed`.
///
/// # Examples
///
/// ```
/// use devctl_lib::transport::{MemoryTransport, NotificationSink};
/// use devctl_lib::types::{ClientHandle, EventId, InstanceId, ServiceId, ServiceIdentity};
///
/// let transport = MemoryTransport::new();
/// let identity = ServiceIdentity::new(ServiceId::new(0x2222), InstanceId::new(1));
/// transport
///     .send_notification(ClientHandle::new(7), identity, EventId::new(0x8001), &[1])
///     .unwrap();
///
/// assert_eq!(transport.notifications_for(ClientHandle::new(7)), vec![vec![1]]);
/// ```
#[derive(Debug, Default)]
pub struct MemoryTransport {
    calls: Mutex<Vec<TransportCall>>,
    unreachable: RwLock<HashSet<ClientHandle>>,
    refuse_registration: RwLock<bool>,
}

impl MemoryTransport {
    /// Creates an empty transport.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes sends to `client` fail.
    pub fn set_unreachable(&self, client: ClientHandle, unreachable: bool) {
        let mut set = self.unreachable.write();
        if unreachable {
            set.insert(client);
        } else {
            set.remove(&client);
        }
    }

    /// Makes [`BusTransport::register`] fail.
    pub fn refuse_registration(&self, refuse: bool) {
        *self.refuse_registration.write() = refuse;
    }

    /// Returns every recorded call in order.
    #[must_use]
    pub fn calls(&self) -> Vec<TransportCall> {
        self.calls.lock().clone()
    }

    /// Returns the payloads of notifications delivered to `client`.
    #[must_use]
    pub fn notifications_for(&self, client: ClientHandle) -> Vec<Vec<u8>> {
        self.calls
            .lock()
            .iter()
            .filter_map(|call| match call {
                TransportCall::Notify {
                    client: c, payload, ..
                } if *c == client => Some(payload.clone()),
                _ => None,
            })
            .collect()
    }

    /// Returns the number of notifications delivered to anyone.
    #[must_use]
    pub fn notification_count(&self) -> usize {
        self.calls
            .lock()
            .iter()
            .filter(|call| matches!(call, TransportCall::Notify { .. }))
            .count()
    }

    /// Forgets every recorded call.
    pub fn clear(&self) {
        self.calls.lock().clear();
    }

    fn record(&self, call: TransportCall) {
        self.calls.lock().push(call);
    }
}

impl NotificationSink for MemoryTransport {
    fn send_notification(
        &self,
        client: ClientHandle,
        identity: ServiceIdentity,
        event: EventId,
        payload: &[u8],
    ) -> Result<(), TransportError> {
        if self.unreachable.read().contains(&client) {
            return Err(TransportError::SendFailed {
                client,
                reason: "client unreachable".to_string(),
            });
        }
        self.record(TransportCall::Notify {
            client,
            identity,
            event,
            payload: payload.to_vec(),
        });
        Ok(())
    }
}

impl BusTransport for MemoryTransport {
    fn register(&self) -> Result<(), TransportError> {
        if *self.refuse_registration.read() {
            return Err(TransportError::RegistrationFailed(
                "routing manager unreachable".to_string(),
            ));
        }
        self.record(TransportCall::Register);
        Ok(())
    }

    fn offer_service(&self, identity: ServiceIdentity) -> Result<(), TransportError> {
        self.record(TransportCall::OfferService(identity));
        Ok(())
    }

    fn offer_event(
        &self,
        identity: ServiceIdentity,
        event: EventId,
        groups: &[EventGroupId],
    ) -> Result<(), TransportError> {
        self.record(TransportCall::OfferEvent {
            identity,
            event,
            groups: groups.to_vec(),
        });
        Ok(())
    }

    fn request_service(&self, identity: ServiceIdentity) -> Result<(), TransportError> {
        self.record(TransportCall::RequestService(identity));
        Ok(())
    }

    fn subscribe(
        &self,
        identity: ServiceIdentity,
        group: EventGroupId,
    ) -> Result<(), TransportError> {
        self.record(TransportCall::Subscribe { identity, group });
        Ok(())
    }

    fn send_request(
        &self,
        identity: ServiceIdentity,
        method: MethodId,
        payload: &[u8],
    ) -> Result<(), TransportError> {
        self.record(TransportCall::Request {
            identity,
            method,
            payload: payload.to_vec(),
        });
        Ok(())
    }
}
