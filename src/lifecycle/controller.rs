// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Registration and availability state machine.

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::watch;

use super::state::{LifecycleHandle, LifecycleState, Role};
use crate::error::{Error, LifecycleError};
use crate::transport::BusTransport;
use crate::types::{EventGroupId, EventId, ServiceIdentity};

/// Drives one service endpoint through registration, offer/request and
/// availability.
///
/// Transitions are serialized by an internal lock; the current state is
/// published through a `watch` channel so other components can observe it
/// without holding the controller.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use devctl_lib::lifecycle::{LifecycleController, LifecycleState};
/// use devctl_lib::transport::MemoryTransport;
/// use devctl_lib::types::{InstanceId, ServiceId, ServiceIdentity};
///
/// let transport = Arc::new(MemoryTransport::new());
/// let identity = ServiceIdentity::new(ServiceId::new(0x1111), InstanceId::new(1));
/// let controller = LifecycleController::server(transport, identity);
///
/// controller.begin_registration().unwrap();
/// controller.on_registration_changed(true).unwrap();
/// assert_eq!(controller.state(), LifecycleState::Offered);
/// ```
pub struct LifecycleController {
    identity: ServiceIdentity,
    role: Role,
    transport: Arc<dyn BusTransport>,
    events: Vec<(EventId, Vec<EventGroupId>)>,
    transition: Mutex<()>,
    state_tx: watch::Sender<LifecycleState>,
}

impl LifecycleController {
    /// Creates a controller for a service this application offers.
    #[must_use]
    pub fn server(transport: Arc<dyn BusTransport>, identity: ServiceIdentity) -> Self {
        Self::new(transport, identity, Role::Server)
    }

    /// Creates a controller for a remote service this application requests.
    #[must_use]
    pub fn client(transport: Arc<dyn BusTransport>, identity: ServiceIdentity) -> Self {
        Self::new(transport, identity, Role::Client)
    }

    fn new(transport: Arc<dyn BusTransport>, identity: ServiceIdentity, role: Role) -> Self {
        let (state_tx, _) = watch::channel(LifecycleState::Unregistered);
        Self {
            identity,
            role,
            transport,
            events: Vec::new(),
            transition: Mutex::new(()),
            state_tx,
        }
    }

    /// Declares an event to offer alongside the service (server role).
    ///
    /// Events are offered in the same step as the service itself.
    #[must_use]
    pub fn with_event(mut self, event: EventId, groups: impl Into<Vec<EventGroupId>>) -> Self {
        self.events.push((event, groups.into()));
        self
    }

    /// Returns the service this controller manages.
    #[must_use]
    pub fn identity(&self) -> ServiceIdentity {
        self.identity
    }

    /// Returns the role.
    #[must_use]
    pub fn role(&self) -> Role {
        self.role
    }

    /// Returns the current state.
    #[must_use]
    pub fn state(&self) -> LifecycleState {
        *self.state_tx.borrow()
    }

    /// Returns `true` if the service is available.
    #[must_use]
    pub fn is_available(&self) -> bool {
        self.state().is_available()
    }

    /// Returns a read-only handle that follows the state.
    #[must_use]
    pub fn watch(&self) -> LifecycleHandle {
        LifecycleHandle::new(self.state_tx.subscribe())
    }

    /// Fails with `Error::ServiceUnavailable` unless the service is available.
    ///
    /// # Errors
    ///
    /// Returns `Error::ServiceUnavailable` in every state but `Available`.
    pub fn ensure_available(&self) -> Result<(), Error> {
        if self.is_available() {
            Ok(())
        } else {
            Err(Error::ServiceUnavailable)
        }
    }

    // ========================================================================
    // Outbound steps
    // ========================================================================

    /// Asks the transport to register the application.
    ///
    /// # Errors
    ///
    /// Returns `LifecycleError::AlreadyRegistering` unless unregistered, or
    /// the transport error if the request could not be issued (the state
    /// then returns to `Unregistered`).
    pub fn begin_registration(&self) -> Result<(), Error> {
        let _guard = self.transition.lock();
        let current = self.state();
        if current != LifecycleState::Unregistered {
            return Err(LifecycleError::AlreadyRegistering(current.to_string()).into());
        }

        self.set_state(LifecycleState::Registering);
        if let Err(e) = self.transport.register() {
            tracing::warn!(service = %self.identity, error = %e, "Registration request failed");
            self.set_state(LifecycleState::Unregistered);
            return Err(e.into());
        }
        Ok(())
    }

    /// Offers the service and its events (server role).
    ///
    /// Called automatically when registration completes; calling it again
    /// once offered is a no-op.
    ///
    /// # Errors
    ///
    /// Returns `LifecycleError::WrongRole` for a client controller,
    /// `LifecycleError::NotReady` before registration completes, or the
    /// transport error.
    pub fn offer_service(&self) -> Result<(), Error> {
        let _guard = self.transition.lock();
        self.offer_locked()
    }

    /// Requests the remote service (client role).
    ///
    /// Called automatically when registration completes.
    ///
    /// # Errors
    ///
    /// Returns `LifecycleError::WrongRole` for a server controller,
    /// `LifecycleError::NotReady` before registration completes, or the
    /// transport error.
    pub fn request_service(&self) -> Result<(), Error> {
        let _guard = self.transition.lock();
        self.request_locked()
    }

    fn offer_locked(&self) -> Result<(), Error> {
        if self.role != Role::Server {
            return Err(LifecycleError::WrongRole(self.role.as_str()).into());
        }
        let current = self.state();
        match current {
            LifecycleState::Registered => {}
            LifecycleState::Offered | LifecycleState::Available => return Ok(()),
            _ => return Err(LifecycleError::NotReady(current.to_string()).into()),
        }

        self.transport.offer_service(self.identity)?;
        for (event, groups) in &self.events {
            self.transport.offer_event(self.identity, *event, groups)?;
        }
        self.set_state(LifecycleState::Offered);
        tracing::info!(service = %self.identity, events = self.events.len(), "Service offered");
        Ok(())
    }

    fn request_locked(&self) -> Result<(), Error> {
        if self.role != Role::Client {
            return Err(LifecycleError::WrongRole(self.role.as_str()).into());
        }
        let current = self.state();
        match current {
            LifecycleState::Registered => {}
            LifecycleState::Requested | LifecycleState::Available => return Ok(()),
            _ => return Err(LifecycleError::NotReady(current.to_string()).into()),
        }

        self.transport.request_service(self.identity)?;
        self.set_state(LifecycleState::Requested);
        tracing::info!(service = %self.identity, "Service requested");
        Ok(())
    }

    // ========================================================================
    // Transport callbacks
    // ========================================================================

    /// Handles a registration state change reported by the transport.
    ///
    /// On registration the controller moves to `Registered` and immediately
    /// offers (server) or requests (client) the service. On deregistration
    /// it returns to `Unregistered`.
    ///
    /// # Errors
    ///
    /// Returns the error of the follow-up offer or request; the state then
    /// stays `Registered` and the step may be retried.
    pub fn on_registration_changed(&self, registered: bool) -> Result<(), Error> {
        let _guard = self.transition.lock();
        let current = self.state();

        if !registered {
            if current != LifecycleState::Unregistered {
                tracing::info!(service = %self.identity, from = %current, "Deregistered");
                self.set_state(LifecycleState::Unregistered);
            }
            return Ok(());
        }

        if current != LifecycleState::Registering {
            tracing::debug!(
                service = %self.identity,
                state = %current,
                "Ignoring registration report outside of Registering"
            );
            return Ok(());
        }

        self.set_state(LifecycleState::Registered);
        tracing::info!(service = %self.identity, role = self.role.as_str(), "Registered");

        match self.role {
            Role::Server => self.offer_locked(),
            Role::Client => self.request_locked(),
        }
    }

    /// Handles an availability report for the managed service.
    ///
    /// Reports that do not match the current state are ignored.
    pub fn on_availability_changed(&self, available: bool) {
        let _guard = self.transition.lock();
        let current = self.state();

        let next = match (available, current) {
            (true, LifecycleState::Offered | LifecycleState::Requested) => {
                LifecycleState::Available
            }
            (false, LifecycleState::Available) => match self.role {
                Role::Server => LifecycleState::Offered,
                Role::Client => LifecycleState::Requested,
            },
            _ => {
                tracing::debug!(
                    service = %self.identity,
                    available,
                    state = %current,
                    "Ignoring availability report"
                );
                return;
            }
        };

        tracing::info!(service = %self.identity, from = %current, to = %next, "Availability changed");
        self.set_state(next);
    }

    /// Handles loss of the transport connection.
    ///
    /// Every state collapses to `Unregistered`.
    pub fn on_transport_disconnected(&self) {
        let _guard = self.transition.lock();
        let current = self.state();
        if current != LifecycleState::Unregistered {
            tracing::warn!(service = %self.identity, from = %current, "Transport disconnected");
            self.set_state(LifecycleState::Unregistered);
        }
    }

    fn set_state(&self, state: LifecycleState) {
        self.state_tx.send_replace(state);
    }
}

impl std::fmt::Debug for LifecycleController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LifecycleController")
            .field("identity", &self.identity)
            .field("role", &self.role)
            .field("state", &self.state())
            .field("events", &self.events)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::{MemoryTransport, TransportCall};
    use crate::types::{InstanceId, ServiceId};

    fn identity() -> ServiceIdentity {
        ServiceIdentity::new(ServiceId::new(0x2222), InstanceId::new(1))
    }

    fn server() -> (Arc<MemoryTransport>, LifecycleController) {
        let transport = Arc::new(MemoryTransport::new());
        let controller = LifecycleController::server(transport.clone(), identity())
            .with_event(EventId::new(0x8001), vec![EventGroupId::new(1)]);
        (transport, controller)
    }

    fn client() -> (Arc<MemoryTransport>, LifecycleController) {
        let transport = Arc::new(MemoryTransport::new());
        let controller = LifecycleController::client(transport.clone(), identity());
        (transport, controller)
    }

    #[test]
    fn server_happy_path() {
        let (transport, controller) = server();
        assert_eq!(controller.state(), LifecycleState::Unregistered);

        controller.begin_registration().unwrap();
        assert_eq!(controller.state(), LifecycleState::Registering);

        controller.on_registration_changed(true).unwrap();
        assert_eq!(controller.state(), LifecycleState::Offered);

        controller.on_availability_changed(true);
        assert!(controller.is_available());

        assert_eq!(
            transport.calls(),
            vec![
                TransportCall::Register,
                TransportCall::OfferService(identity()),
                TransportCall::OfferEvent {
                    identity: identity(),
                    event: EventId::new(0x8001),
                    groups: vec![EventGroupId::new(1)],
                },
            ]
        );
    }

    #[test]
    fn client_requests_after_registration() {
        let (transport, controller) = client();
        controller.begin_registration().unwrap();
        controller.on_registration_changed(true).unwrap();

        assert_eq!(controller.state(), LifecycleState::Requested);
        assert!(transport
            .calls()
            .contains(&TransportCall::RequestService(identity())));
    }

    #[test]
    fn offer_before_registration_is_refused() {
        let (transport, controller) = server();

        let err = controller.offer_service().unwrap_err();
        assert!(matches!(err, Error::Lifecycle(LifecycleError::NotReady(_))));

        controller.begin_registration().unwrap();
        let err = controller.offer_service().unwrap_err();
        assert!(matches!(err, Error::Lifecycle(LifecycleError::NotReady(_))));

        assert!(!transport
            .calls()
            .iter()
            .any(|c| matches!(c, TransportCall::OfferService(_))));
    }

    #[test]
    fn request_before_registration_is_refused() {
        let (_, controller) = client();
        let err = controller.request_service().unwrap_err();
        assert!(matches!(err, Error::Lifecycle(LifecycleError::NotReady(_))));
    }

    #[test]
    fn wrong_role_is_refused() {
        let (_, controller) = client();
        let err = controller.offer_service().unwrap_err();
        assert!(matches!(
            err,
            Error::Lifecycle(LifecycleError::WrongRole("client"))
        ));

        let (_, controller) = server();
        let err = controller.request_service().unwrap_err();
        assert!(matches!(
            err,
            Error::Lifecycle(LifecycleError::WrongRole("server"))
        ));
    }

    #[test]
    fn second_offer_is_noop() {
        let (transport, controller) = server();
        controller.begin_registration().unwrap();
        controller.on_registration_changed(true).unwrap();
        controller.offer_service().unwrap();

        let offers = transport
            .calls()
            .iter()
            .filter(|c| matches!(c, TransportCall::OfferService(_)))
            .count();
        assert_eq!(offers, 1);
    }

    #[test]
    fn double_registration_is_refused() {
        let (_, controller) = server();
        controller.begin_registration().unwrap();
        let err = controller.begin_registration().unwrap_err();
        assert!(matches!(
            err,
            Error::Lifecycle(LifecycleError::AlreadyRegistering(_))
        ));
    }

    #[test]
    fn failed_registration_rolls_back() {
        let (transport, controller) = server();
        transport.refuse_registration(true);

        assert!(matches!(
            controller.begin_registration(),
            Err(Error::Transport(_))
        ));
        assert_eq!(controller.state(), LifecycleState::Unregistered);

        transport.refuse_registration(false);
        controller.begin_registration().unwrap();
    }

    #[test]
    fn availability_toggles() {
        let (_, controller) = client();
        controller.begin_registration().unwrap();
        controller.on_registration_changed(true).unwrap();

        controller.on_availability_changed(true);
        assert_eq!(controller.state(), LifecycleState::Available);
        controller.on_availability_changed(false);
        assert_eq!(controller.state(), LifecycleState::Requested);
    }

    #[test]
    fn stray_reports_are_ignored() {
        let (_, controller) = server();
        controller.on_availability_changed(true);
        assert_eq!(controller.state(), LifecycleState::Unregistered);

        controller.on_registration_changed(true).unwrap();
        assert_eq!(controller.state(), LifecycleState::Unregistered);
    }

    #[test]
    fn disconnect_collapses_to_unregistered() {
        let (_, controller) = server();
        controller.begin_registration().unwrap();
        controller.on_registration_changed(true).unwrap();
        controller.on_availability_changed(true);

        controller.on_transport_disconnected();
        assert_eq!(controller.state(), LifecycleState::Unregistered);
        assert!(controller.ensure_available().is_err());

        controller.begin_registration().unwrap();
    }

    #[test]
    fn deregistration_returns_to_unregistered() {
        let (_, controller) = server();
        controller.begin_registration().unwrap();
        controller.on_registration_changed(true).unwrap();
        controller.on_registration_changed(false).unwrap();
        assert_eq!(controller.state(), LifecycleState::Unregistered);
    }

    #[test]
    fn ensure_available() {
        let (_, controller) = server();
        assert!(matches!(
            controller.ensure_available(),
            Err(Error::ServiceUnavailable)
        ));

        controller.begin_registration().unwrap();
        controller.on_registration_changed(true).unwrap();
        controller.on_availability_changed(true);
        controller.ensure_available().unwrap();
    }

    #[tokio::test]
    async fn watch_handle_observes_transitions() {
        let (_, controller) = server();
        let controller = Arc::new(controller);
        let mut handle = controller.watch();

        let driver = {
            let controller = controller.clone();
            tokio::spawn(async move {
                controller.begin_registration().unwrap();
                controller.on_registration_changed(true).unwrap();
                controller.on_availability_changed(true);
            })
        };

        let state = handle.wait_for(LifecycleState::is_available).await;
        assert_eq!(state, Some(LifecycleState::Available));
        driver.await.unwrap();
    }
}
