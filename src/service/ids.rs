// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Well-known identifiers of the device services.

use crate::types::{EventGroupId, EventId, InstanceId, MethodId, ServiceId, ServiceIdentity};

/// Indicator control service.
pub const CONTROL_SERVICE: ServiceIdentity =
    ServiceIdentity::new(ServiceId::new(0x1111), InstanceId::new(0x0001));
/// Sets the indicator; payload is a [`ControlCommand`](crate::types::ControlCommand).
pub const CONTROL_SET_METHOD: MethodId = MethodId::new(0x0001);

/// Indicator monitor service.
pub const MONITOR_SERVICE: ServiceIdentity =
    ServiceIdentity::new(ServiceId::new(0x2222), InstanceId::new(0x0001));
/// Indicator state changed; payload is one byte, `0` or `1`.
pub const MONITOR_EVENT: EventId = EventId::new(0x8001);
/// Group carrying [`MONITOR_EVENT`].
pub const MONITOR_EVENT_GROUP: EventGroupId = EventGroupId::new(0x0001);

/// Firmware download service.
pub const FIRMWARE_SERVICE: ServiceIdentity =
    ServiceIdentity::new(ServiceId::new(0x3333), InstanceId::new(0x0001));
/// Asks whether an image is staged; replies one byte, `1` if so.
pub const FIRMWARE_REQUEST_DOWNLOAD_METHOD: MethodId = MethodId::new(0x0001);
/// Pulls the next chunk; payload is a [`ChunkRequest`](crate::types::ChunkRequest).
pub const FIRMWARE_GET_CHUNK_METHOD: MethodId = MethodId::new(0x0002);
/// A new image was staged; payload is the UTF-8 version label.
pub const FIRMWARE_AVAILABLE_EVENT: EventId = EventId::new(0x8001);
/// Group carrying [`FIRMWARE_AVAILABLE_EVENT`].
pub const FIRMWARE_EVENT_GROUP: EventGroupId = EventGroupId::new(0x0001);
