// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The device services built on the core components.
//!
//! | Service | Identity | Surface |
//! |---------|----------|---------|
//! | [`ControlService`] | `0x1111.0x0001` | method `0x0001` sets the indicator |
//! | [`MonitorService`] | `0x2222.0x0001` | event `0x8001` (group `0x0001`) on indicator changes |
//! | [`FirmwareService`] | `0x3333.0x0001` | methods `0x0001` request download, `0x0002` get chunk; event `0x8001` new image |
//!
//! [`DeviceServices`] wires all three to one transport from a
//! [`ServiceConfig`](crate::config::ServiceConfig).

mod control;
mod endpoint;
mod firmware;
pub mod ids;
mod monitor;
mod runtime;

pub use control::{CONTROL_OK, ControlService, FileIndicator, IndicatorSink};
pub use endpoint::ServiceEndpoint;
pub use firmware::FirmwareService;
pub use monitor::MonitorService;
pub use runtime::DeviceServices;
