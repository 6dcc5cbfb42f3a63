// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Indicator monitor: publishes an event whenever the LED state flips.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use super::ids::{MONITOR_EVENT, MONITOR_EVENT_GROUP};
use crate::resource::ResourceAccessor;
use crate::subscription::SubscriptionManager;
use crate::types::encode_flag;
use crate::watcher::{FlagProbe, Probe, StateWatcher, spawn_poll_loop};

/// Watches an on/off resource and notifies subscribers of transitions.
///
/// The indicator is assumed off at startup, so an indicator that is already
/// on produces a notification on the first poll.
#[derive(Debug)]
pub struct MonitorService<P: Probe<Value = bool>> {
    watcher: Mutex<StateWatcher<P>>,
    subscriptions: Arc<SubscriptionManager>,
}

impl<A: ResourceAccessor> MonitorService<FlagProbe<A>> {
    /// Creates a monitor on a brightness file.
    pub fn new(
        accessor: A,
        path: impl Into<PathBuf>,
        subscriptions: Arc<SubscriptionManager>,
    ) -> Self {
        Self::with_probe(FlagProbe::new(accessor, path), false, subscriptions)
    }
}

impl<P: Probe<Value = bool>> MonitorService<P> {
    /// Creates a monitor over any boolean probe.
    pub fn with_probe(probe: P, baseline: bool, subscriptions: Arc<SubscriptionManager>) -> Self {
        Self {
            watcher: Mutex::new(StateWatcher::new(probe, baseline)),
            subscriptions,
        }
    }

    /// Runs one poll cycle.
    ///
    /// Returns the new state if it changed; subscribers have been notified
    /// by the time this returns.
    pub fn poll_once(&self) -> Option<bool> {
        let changed = self.watcher.lock().poll()?;
        let delivered = self
            .subscriptions
            .notify(MONITOR_EVENT, MONITOR_EVENT_GROUP, &encode_flag(changed));
        tracing::info!(on = changed, delivered, "Indicator changed");
        Some(changed)
    }

    /// Returns the last observed state.
    pub fn current(&self) -> Option<bool> {
        self.watcher.lock().last_value().copied()
    }

    /// Polls every `period` until `cancel` fires.
    pub fn spawn(self: Arc<Self>, period: Duration, cancel: CancellationToken) -> JoinHandle<()>
    where
        P: 'static,
    {
        spawn_poll_loop("indicator-monitor", period, cancel, move || {
            self.poll_once();
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::MemoryAccessor;
    use crate::service::ids::MONITOR_SERVICE;
    use crate::transport::MemoryTransport;
    use crate::types::ClientHandle;

    const CLIENT: ClientHandle = ClientHandle::new(0x0101);

    fn setup() -> (
        MemoryAccessor,
        Arc<MemoryTransport>,
        MonitorService<FlagProbe<MemoryAccessor>>,
    ) {
        let accessor = MemoryAccessor::new();
        accessor.insert("brightness", b"0".to_vec());
        let transport = Arc::new(MemoryTransport::new());
        let subscriptions = Arc::new(SubscriptionManager::new(MONITOR_SERVICE, transport.clone()));
        subscriptions.offer_event(MONITOR_EVENT, [MONITOR_EVENT_GROUP]);
        subscriptions.on_subscribe(MONITOR_EVENT_GROUP, CLIENT);
        let monitor = MonitorService::new(accessor.clone(), "brightness", subscriptions);
        (accessor, transport, monitor)
    }

    #[test]
    fn one_notification_per_transition() {
        let (accessor, transport, monitor) = setup();

        assert_eq!(monitor.poll_once(), None);
        accessor.insert("brightness", b"1".to_vec());
        assert_eq!(monitor.poll_once(), Some(true));
        assert_eq!(monitor.poll_once(), None);
        accessor.insert("brightness", b"0".to_vec());
        assert_eq!(monitor.poll_once(), Some(false));

        assert_eq!(transport.notifications_for(CLIENT), vec![vec![1], vec![0]]);
        assert_eq!(monitor.current(), Some(false));
    }

    #[test]
    fn unreadable_indicator_is_skipped() {
        let (accessor, transport, monitor) = setup();
        accessor.set_unreadable("brightness", true);
        assert_eq!(monitor.poll_once(), None);
        assert_eq!(transport.notification_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn spawned_loop_publishes_changes() {
        let (accessor, transport, monitor) = setup();
        let cancel = CancellationToken::new();
        let handle = Arc::new(monitor).spawn(Duration::from_millis(100), cancel.clone());

        accessor.insert("brightness", b"1".to_vec());
        tokio::time::sleep(Duration::from_millis(250)).await;
        assert_eq!(transport.notifications_for(CLIENT), vec![vec![1]]);

        cancel.cancel();
        handle.await.unwrap();
    }
}
