// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Event group subscriptions.
//!
//! - [`SubscriptionManager`] - membership per event group and fan-out
//! - [`SubscriptionPolicy`] - admission control, [`AcceptAll`] by default

mod manager;
mod policy;

pub use manager::SubscriptionManager;
pub use policy::{AcceptAll, SubscriptionPolicy};
