// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! `devctl` Lib - device control services over a service-oriented IPC bus.
//!
//! This library provides the service-side core of a small device: it
//! registers services on a bus, routes method calls, streams large files in
//! chunks, tracks event subscribers and watches hardware state exposed as
//! files.
//!
//! # Components
//!
//! - **Lifecycle**: registration, offer/request and availability per service
//! - **Dispatch**: method calls routed to exactly one handler
//! - **Transfer**: pull-based chunked delivery of a firmware image
//! - **Subscriptions**: event group membership and notification fan-out
//! - **Watchers**: change detection over polled files
//! - **Resources**: file access behind a trait, with an in-memory variant
//!
//! # Services
//!
//! - Indicator control (`0x1111`): switches an LED on or off
//! - Indicator monitor (`0x2222`): notifies subscribers when the LED flips
//! - Firmware download (`0x3333`): serves a staged image in chunks and
//!   announces new images
//!
//! The bus runtime itself (discovery, marshalling, routing) is outside this
//! crate. A transport integration implements [`transport::BusTransport`] and
//! drives each [`service::ServiceEndpoint`] with the traffic it receives.
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use tokio_util::sync::CancellationToken;
//! use devctl_lib::config::ServiceConfig;
//! use devctl_lib::resource::FileAccessor;
//! use devctl_lib::service::{DeviceServices, ids};
//! use devctl_lib::transport::MemoryTransport;
//! use devctl_lib::types::{ClientHandle, ControlCommand};
//!
//! #[tokio::main]
//! async fn main() -> devctl_lib::Result<()> {
//!     let config = ServiceConfig::default().with_firmware_path("firmware.bin");
//!     let services = DeviceServices::new(config, Arc::new(MemoryTransport::new()), FileAccessor)?;
//!
//!     services.start()?;
//!     for endpoint in services.endpoints() {
//!         endpoint.on_registration_changed(true)?;
//!     }
//!
//!     let cancel = CancellationToken::new();
//!     let _watchers = services.spawn_watchers(&cancel);
//!
//!     let reply = services.control().on_request(
//!         ids::CONTROL_SET_METHOD,
//!         ClientHandle::new(0x0101),
//!         &[ControlCommand::Activate.as_byte()],
//!     )?;
//!     println!("control reply: {reply:?}");
//!
//!     cancel.cancel();
//!     Ok(())
//! }
//! ```
//!
//! ## Chunked Transfer
//!
//! ```
//! use devctl_lib::resource::MemoryAccessor;
//! use devctl_lib::transfer::TransferEngine;
//! use devctl_lib::types::ReasonCode;
//!
//! let accessor = MemoryAccessor::new();
//! accessor.insert("firmware.bin", vec![0u8; 25]);
//!
//! let mut engine = TransferEngine::new(accessor);
//! engine.configure("firmware.bin");
//!
//! let mut total = 0;
//! loop {
//!     match engine.next_chunk(10) {
//!         Ok(chunk) => total += chunk.len(),
//!         Err(ReasonCode::EndOfResource) => break,
//!         Err(other) => panic!("transfer failed: {other}"),
//!     }
//! }
//! assert_eq!(total, 25);
//! ```

pub mod config;
pub mod dispatch;
pub mod error;
pub mod lifecycle;
pub mod resource;
pub mod service;
pub mod subscription;
pub mod transfer;
pub mod transport;
pub mod types;
pub mod watcher;

pub use config::ServiceConfig;
pub use dispatch::{CommandDispatcher, DispatcherBuilder, MethodHandler, Reply, ReplyStatus};
pub use error::{
    DispatchError, Error, LifecycleError, ResourceError, Result, TransportError, ValueError,
};
pub use lifecycle::{LifecycleController, LifecycleHandle, LifecycleState, Role, ServiceProxy};
pub use resource::{FileAccessor, MemoryAccessor, ResourceAccessor};
pub use service::{DeviceServices, ServiceEndpoint};
pub use subscription::{SubscriptionManager, SubscriptionPolicy};
pub use transfer::{TransferEngine, TransferState};
pub use transport::{BusTransport, MemoryTransport, NotificationSink};
pub use types::{
    ChunkRequest, ClientHandle, ControlCommand, EventGroupId, EventId, InstanceId, MethodId,
    ReasonCode, ServiceId, ServiceIdentity,
};
pub use watcher::{StateWatcher, spawn_poll_loop};
