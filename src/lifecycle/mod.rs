// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Service lifecycle: registration, offer/request and availability.
//!
//! A [`LifecycleController`] owns the state of one service endpoint. Other
//! components hold a [`LifecycleHandle`] and refuse traffic until the
//! endpoint has registered. On the client side, [`ServiceProxy`] wraps a
//! controller and gates outgoing requests on availability.

mod controller;
mod proxy;
mod state;

pub use controller::LifecycleController;
pub use proxy::ServiceProxy;
pub use state::{LifecycleHandle, LifecycleState, Role};
