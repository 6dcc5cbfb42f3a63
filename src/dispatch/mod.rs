// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Command dispatch.
//!
//! Incoming method calls are routed by [`MethodId`](crate::types::MethodId)
//! to exactly one [`MethodHandler`]. The table is built once at startup and
//! is read-only afterwards.

mod dispatcher;
mod reply;

pub use dispatcher::{CommandDispatcher, DispatcherBuilder, MethodHandler};
pub use reply::{Reply, ReplyStatus};
