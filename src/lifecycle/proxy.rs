// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Client-side access to a remote service.

use std::sync::Arc;

use super::controller::LifecycleController;
use super::state::LifecycleState;
use crate::error::Error;
use crate::transport::BusTransport;
use crate::types::{EventGroupId, MethodId, ServiceIdentity};

/// A requested remote service.
///
/// Sends are rejected with [`Error::ServiceUnavailable`] unless the service
/// is available. When availability comes on, the proxy subscribes to every
/// configured event group.
pub struct ServiceProxy {
    controller: LifecycleController,
    transport: Arc<dyn BusTransport>,
    groups: Vec<EventGroupId>,
}

impl ServiceProxy {
    /// Creates a proxy for `identity`.
    #[must_use]
    pub fn new(transport: Arc<dyn BusTransport>, identity: ServiceIdentity) -> Self {
        Self {
            controller: LifecycleController::client(transport.clone(), identity),
            transport,
            groups: Vec::new(),
        }
    }

    /// Adds an event group to subscribe to once available.
    #[must_use]
    pub fn with_group(mut self, group: EventGroupId) -> Self {
        self.groups.push(group);
        self
    }

    /// Returns the client-role controller behind the proxy.
    #[must_use]
    pub fn controller(&self) -> &LifecycleController {
        &self.controller
    }

    /// Starts registration.
    ///
    /// # Errors
    ///
    /// See [`LifecycleController::begin_registration`].
    pub fn start(&self) -> Result<(), Error> {
        self.controller.begin_registration()
    }

    /// Forwards a registration report.
    ///
    /// # Errors
    ///
    /// See [`LifecycleController::on_registration_changed`].
    pub fn on_registration_changed(&self, registered: bool) -> Result<(), Error> {
        self.controller.on_registration_changed(registered)
    }

    /// Forwards an availability report, subscribing on availability.
    ///
    /// Subscription failures are logged; the next availability report
    /// retries them.
    pub fn on_availability_changed(&self, available: bool) {
        let was = self.controller.state();
        self.controller.on_availability_changed(available);

        if was != LifecycleState::Available && self.controller.is_available() {
            let identity = self.controller.identity();
            for group in &self.groups {
                if let Err(e) = self.transport.subscribe(identity, *group) {
                    tracing::warn!(service = %identity, group = %group, error = %e, "Subscribe failed");
                }
            }
        }
    }

    /// Sends a method request.
    ///
    /// # Errors
    ///
    /// Returns `Error::ServiceUnavailable` unless the service is available,
    /// or the transport error if the send fails.
    pub fn call(&self, method: MethodId, payload: &[u8]) -> Result<(), Error> {
        self.controller.ensure_available()?;
        self.transport
            .send_request(self.controller.identity(), method, payload)?;
        tracing::debug!(
            service = %self.controller.identity(),
            method = %method,
            len = payload.len(),
            "Request sent"
        );
        Ok(())
    }
}

impl std::fmt::Debug for ServiceProxy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceProxy")
            .field("controller", &self.controller)
            .field("groups", &self.groups)
            .finish_non_exhaustive()
    }
}
