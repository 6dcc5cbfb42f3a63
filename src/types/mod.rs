// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Value types shared by every service component.
//!
//! # Types
//!
//! - [`ServiceIdentity`] - Service and instance pair naming one endpoint
//! - [`MethodId`], [`EventId`], [`EventGroupId`] - Design-time identifiers
//! - [`ClientHandle`] - Transport-supplied peer key
//! - [`ReasonCode`] - One-byte failure reasons carried in replies
//! - [`ControlCommand`], [`ChunkRequest`] - Typed request payloads

mod ids;
mod payload;
mod reason;

pub use ids::{ClientHandle, EventGroupId, EventId, InstanceId, MethodId, ServiceId, ServiceIdentity};
pub use payload::{ChunkRequest, ControlCommand, decode_flag, encode_flag};
pub use reason::ReasonCode;
