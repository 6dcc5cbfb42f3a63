// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Composition of the three device services.

use std::sync::Arc;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use super::control::{ControlService, FileIndicator};
use super::endpoint::ServiceEndpoint;
use super::firmware::FirmwareService;
use super::ids::{
    FIRMWARE_AVAILABLE_EVENT, FIRMWARE_EVENT_GROUP, MONITOR_EVENT, MONITOR_EVENT_GROUP,
};
use super::monitor::MonitorService;
use crate::config::ServiceConfig;
use crate::dispatch::CommandDispatcher;
use crate::error::Error;
use crate::resource::ResourceAccessor;
use crate::transport::BusTransport;
use crate::types::ServiceIdentity;
use crate::watcher::FlagProbe;

/// The control, monitor and firmware services wired to one transport.
///
/// # Examples
///
/// ```no_run
/// use std::sync::Arc;
/// use tokio_util::sync::CancellationToken;
/// use devctl_lib::config::ServiceConfig;
/// use devctl_lib::resource::FileAccessor;
/// use devctl_lib::service::DeviceServices;
/// use devctl_lib::transport::MemoryTransport;
///
/// # async fn example() -> devctl_lib::Result<()> {
/// let config = ServiceConfig::from_json_file("devctl.json")?;
/// let services = DeviceServices::new(config, Arc::new(MemoryTransport::new()), FileAccessor)?;
/// services.start()?;
///
/// let cancel = CancellationToken::new();
/// let watchers = services.spawn_watchers(&cancel);
/// // ... the transport integration now drives services.endpoint(..)
/// cancel.cancel();
/// for watcher in watchers {
///     let _ = watcher.await;
/// }
/// # Ok(())
/// # }
/// ```
pub struct DeviceServices<A: ResourceAccessor + Clone + 'static> {
    config: ServiceConfig,
    control: ServiceEndpoint,
    monitor: ServiceEndpoint,
    firmware: ServiceEndpoint,
    monitor_service: Arc<MonitorService<FlagProbe<A>>>,
    firmware_service: Arc<FirmwareService<A>>,
}

impl<A: ResourceAccessor + Clone + 'static> DeviceServices<A> {
    /// Builds every service from `config`.
    ///
    /// A configured firmware path is staged immediately.
    ///
    /// # Errors
    ///
    /// Returns `Error::Value` if the configuration is invalid.
    pub fn new(
        config: ServiceConfig,
        transport: Arc<dyn BusTransport>,
        accessor: A,
    ) -> Result<Self, Error> {
        config.validate()?;

        let control_service = Arc::new(ControlService::new(FileIndicator::new(
            accessor.clone(),
            &config.indicator_path,
        )));
        let control = ServiceEndpoint::new(transport.clone(), config.control)
            .with_methods(control_service.register(CommandDispatcher::builder())?);

        let monitor = ServiceEndpoint::new(transport.clone(), config.monitor)
            .with_event(MONITOR_EVENT, MONITOR_EVENT_GROUP);
        let monitor_service = Arc::new(MonitorService::new(
            accessor.clone(),
            &config.indicator_path,
            Arc::clone(monitor.subscriptions()),
        ));

        let firmware = ServiceEndpoint::new(transport, config.firmware)
            .with_event(FIRMWARE_AVAILABLE_EVENT, FIRMWARE_EVENT_GROUP);
        let firmware_service = Arc::new(FirmwareService::new(
            accessor,
            config.max_chunk_size,
            config.firmware_version.clone(),
            Arc::clone(firmware.subscriptions()),
        ));
        if let Some(path) = &config.firmware_path {
            firmware_service.stage(path);
        }
        let firmware = firmware.with_methods(
            Arc::clone(&firmware_service).register(CommandDispatcher::builder())?,
        );

        Ok(Self {
            config,
            control,
            monitor,
            firmware,
            monitor_service,
            firmware_service,
        })
    }

    /// Starts registration of every endpoint.
    ///
    /// # Errors
    ///
    /// Returns the first registration error.
    pub fn start(&self) -> Result<(), Error> {
        for endpoint in self.endpoints() {
            endpoint.start()?;
        }
        tracing::info!(
            control = %self.control.identity(),
            monitor = %self.monitor.identity(),
            firmware = %self.firmware.identity(),
            "Device services registering"
        );
        Ok(())
    }

    /// Spawns the indicator monitor and firmware watcher loops.
    ///
    /// Both stop when `cancel` fires. Must be called from within a tokio
    /// runtime.
    pub fn spawn_watchers(&self, cancel: &CancellationToken) -> Vec<JoinHandle<()>> {
        vec![
            Arc::clone(&self.monitor_service)
                .spawn(self.config.monitor_interval, cancel.child_token()),
            Arc::clone(&self.firmware_service)
                .spawn(self.config.firmware_interval, cancel.child_token()),
        ]
    }

    /// Returns the endpoint serving `identity`.
    #[must_use]
    pub fn endpoint(&self, identity: ServiceIdentity) -> Option<&ServiceEndpoint> {
        self.endpoints()
            .into_iter()
            .find(|endpoint| endpoint.identity() == identity)
    }

    /// Returns every endpoint.
    #[must_use]
    pub fn endpoints(&self) -> [&ServiceEndpoint; 3] {
        [&self.control, &self.monitor, &self.firmware]
    }

    /// Forwards loss of the transport connection to every endpoint.
    pub fn on_transport_disconnected(&self) {
        for endpoint in self.endpoints() {
            endpoint.on_transport_disconnected();
        }
    }

    /// The control endpoint.
    #[must_use]
    pub fn control(&self) -> &ServiceEndpoint {
        &self.control
    }

    /// The monitor endpoint.
    #[must_use]
    pub fn monitor(&self) -> &ServiceEndpoint {
        &self.monitor
    }

    /// The firmware endpoint.
    #[must_use]
    pub fn firmware(&self) -> &ServiceEndpoint {
        &self.firmware
    }

    /// The indicator monitor, for manual polling.
    #[must_use]
    pub fn monitor_service(&self) -> &Arc<MonitorService<FlagProbe<A>>> {
        &self.monitor_service
    }

    /// The firmware service, for staging images.
    #[must_use]
    pub fn firmware_service(&self) -> &Arc<FirmwareService<A>> {
        &self.firmware_service
    }

    /// The configuration the services were built from.
    #[must_use]
    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }
}

impl<A: ResourceAccessor + Clone + 'static> std::fmt::Debug for DeviceServices<A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeviceServices")
            .field("control", &self.control)
            .field("monitor", &self.monitor)
            .field("firmware", &self.firmware)
            .finish_non_exhaustive()
    }
}
