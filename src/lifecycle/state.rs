// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Lifecycle states and the read-only state handle.

use std::fmt;

use tokio::sync::watch;

/// Which side of a service this application plays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    /// Offers the service.
    Server,
    /// Requests the service.
    Client,
}

impl Role {
    /// Returns the role name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Server => "server",
            Self::Client => "client",
        }
    }
}

/// Registration and availability state of a service endpoint.
///
/// ```text
///  Unregistered ─▶ Registering ─▶ Registered ─▶ Offered ───┐
///        ▲                                  └─▶ Requested ─┴─▶ Available
///        └──────────────── transport disconnected (from any state)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum LifecycleState {
    /// Not registered with the routing manager.
    Unregistered,
    /// Registration requested, waiting for the transport.
    Registering,
    /// Registered; offering or requesting is now legal.
    Registered,
    /// Service offered (server role).
    Offered,
    /// Service requested (client role).
    Requested,
    /// The transport reports the service available.
    Available,
}

impl LifecycleState {
    /// Returns the state name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Unregistered => "Unregistered",
            Self::Registering => "Registering",
            Self::Registered => "Registered",
            Self::Offered => "Offered",
            Self::Requested => "Requested",
            Self::Available => "Available",
        }
    }

    /// Returns `true` once registration has completed.
    #[must_use]
    pub fn is_registered(&self) -> bool {
        *self >= Self::Registered
    }

    /// Returns `true` if the service is available.
    #[must_use]
    pub fn is_available(&self) -> bool {
        matches!(self, Self::Available)
    }
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Read-only view of a lifecycle controller's state.
///
/// Handed to the dispatcher and the subscription manager so they can refuse
/// traffic before registration without owning the controller.
#[derive(Debug, Clone)]
pub struct LifecycleHandle {
    rx: watch::Receiver<LifecycleState>,
}

impl LifecycleHandle {
    pub(crate) fn new(rx: watch::Receiver<LifecycleState>) -> Self {
        Self { rx }
    }

    /// Returns the current state.
    #[must_use]
    pub fn state(&self) -> LifecycleState {
        *self.rx.borrow()
    }

    /// Returns `true` once registration has completed.
    #[must_use]
    pub fn is_registered(&self) -> bool {
        self.state().is_registered()
    }

    /// Returns `true` if the service is available.
    #[must_use]
    pub fn is_available(&self) -> bool {
        self.state().is_available()
    }

    /// Waits until the state satisfies `predicate`, returning that state.
    ///
    /// Returns `None` if the controller was dropped first.
    pub async fn wait_for(
        &mut self,
        predicate: impl FnMut(&LifecycleState) -> bool,
    ) -> Option<LifecycleState> {
        self.rx.wait_for(predicate).await.ok().map(|state| *state)
    }

    /// Returns a raw watch receiver for use in `select!` loops.
    #[must_use]
    pub fn watch(&self) -> watch::Receiver<LifecycleState> {
        self.rx.clone()
    }
}
