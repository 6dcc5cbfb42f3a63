// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Event group membership and notification fan-out.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::Arc;

use parking_lot::RwLock;

use super::policy::{AcceptAll, SubscriptionPolicy};
use crate::lifecycle::LifecycleHandle;
use crate::transport::NotificationSink;
use crate::types::{ClientHandle, EventGroupId, EventId, ServiceIdentity};

/// Tracks which clients are subscribed to which event groups of one service,
/// and delivers notifications to them.
///
/// Membership is a set per group: subscribing twice has no extra effect and
/// unsubscribing a non-member is a no-op. Fan-out snapshots the member set
/// and releases the lock before sending, so a slow transport never blocks
/// subscribe/unsubscribe.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use devctl_lib::subscription::SubscriptionManager;
/// use devctl_lib::transport::MemoryTransport;
/// use devctl_lib::types::*;
///
/// let transport = Arc::new(MemoryTransport::new());
/// let identity = ServiceIdentity::new(ServiceId::new(0x2222), InstanceId::new(1));
/// let manager = SubscriptionManager::new(identity, transport.clone());
///
/// let event = EventId::new(0x8001);
/// let group = EventGroupId::new(1);
/// manager.offer_event(event, [group]);
///
/// assert!(manager.on_subscribe(group, ClientHandle::new(7)));
/// assert_eq!(manager.notify(event, group, &[1]), 1);
/// ```
pub struct SubscriptionManager {
    identity: ServiceIdentity,
    sink: Arc<dyn NotificationSink>,
    policy: RwLock<Arc<dyn SubscriptionPolicy>>,
    lifecycle: Option<LifecycleHandle>,
    /// Offered events and the groups each is published to.
    events: RwLock<HashMap<EventId, HashSet<EventGroupId>>>,
    /// Members per offered group.
    groups: RwLock<HashMap<EventGroupId, HashSet<ClientHandle>>>,
}

impl SubscriptionManager {
    /// Creates a manager that accepts every subscription.
    #[must_use]
    pub fn new(identity: ServiceIdentity, sink: Arc<dyn NotificationSink>) -> Self {
        Self {
            identity,
            sink,
            policy: RwLock::new(Arc::new(AcceptAll)),
            lifecycle: None,
            events: RwLock::new(HashMap::new()),
            groups: RwLock::new(HashMap::new()),
        }
    }

    /// Replaces the admission policy.
    #[must_use]
    pub fn with_policy(self, policy: impl SubscriptionPolicy + 'static) -> Self {
        self.set_policy(policy);
        self
    }

    /// Replaces the admission policy. Existing members are kept.
    pub fn set_policy(&self, policy: impl SubscriptionPolicy + 'static) {
        *self.policy.write() = Arc::new(policy);
    }

    /// Refuses subscriptions and suppresses notifications until the service
    /// has registered.
    #[must_use]
    pub fn with_lifecycle(mut self, lifecycle: LifecycleHandle) -> Self {
        self.lifecycle = Some(lifecycle);
        self
    }

    /// Returns the service this manager publishes for.
    #[must_use]
    pub fn identity(&self) -> ServiceIdentity {
        self.identity
    }

    // ========================================================================
    // Offered events
    // ========================================================================

    /// Declares an event and the groups it is published to.
    ///
    /// Groups become subscribable as soon as they are declared here.
    pub fn offer_event(&self, event: EventId, groups: impl IntoIterator<Item = EventGroupId>) {
        let groups: HashSet<EventGroupId> = groups.into_iter().collect();
        {
            let mut members = self.groups.write();
            for group in &groups {
                members.entry(*group).or_default();
            }
        }
        self.events.write().entry(event).or_default().extend(groups);
    }

    /// Returns `true` if `group` has been declared.
    #[must_use]
    pub fn is_offered(&self, group: EventGroupId) -> bool {
        self.groups.read().contains_key(&group)
    }

    // ========================================================================
    // Membership
    // ========================================================================

    /// Handles a subscription request.
    ///
    /// Returns `false` (the transport then sends a negative acknowledgement)
    /// if the group is unknown, the service is not registered, or the policy
    /// refuses the client.
    pub fn on_subscribe(&self, group: EventGroupId, client: ClientHandle) -> bool {
        if !self.is_registered() {
            tracing::debug!(service = %self.identity, group = %group, %client, "Subscription before registration");
            return false;
        }

        if !self.is_offered(group) {
            tracing::debug!(service = %self.identity, group = %group, %client, "Subscription to unknown group");
            return false;
        }

        let policy = self.policy.read().clone();
        if !policy.accept(group, client) {
            tracing::info!(service = %self.identity, group = %group, %client, "Subscription refused by policy");
            return false;
        }

        let inserted = self
            .groups
            .write()
            .get_mut(&group)
            .is_some_and(|members| members.insert(client));
        if inserted {
            tracing::info!(service = %self.identity, group = %group, %client, "Client subscribed");
        }
        true
    }

    /// Handles an unsubscription; a no-op for non-members.
    pub fn on_unsubscribe(&self, group: EventGroupId, client: ClientHandle) {
        let removed = self
            .groups
            .write()
            .get_mut(&group)
            .is_some_and(|members| members.remove(&client));
        if removed {
            tracing::info!(service = %self.identity, group = %group, %client, "Client unsubscribed");
        }
    }

    /// Removes `client` from every group.
    ///
    /// Returns the number of groups the client was removed from.
    pub fn on_client_disconnected(&self, client: ClientHandle) -> usize {
        let removed = self
            .groups
            .write()
            .values_mut()
            .map(|members| members.remove(&client))
            .filter(|removed| *removed)
            .count();
        if removed > 0 {
            tracing::info!(service = %self.identity, %client, groups = removed, "Client disconnected");
        }
        removed
    }

    /// Empties every group. Offered events and groups are kept.
    ///
    /// Returns the number of memberships dropped.
    pub fn clear_members(&self) -> usize {
        let dropped: usize = self
            .groups
            .write()
            .values_mut()
            .map(|members| {
                let count = members.len();
                members.clear();
                count
            })
            .sum();
        if dropped > 0 {
            tracing::info!(service = %self.identity, dropped, "Memberships cleared");
        }
        dropped
    }

    fn is_registered(&self) -> bool {
        self.lifecycle
            .as_ref()
            .is_none_or(LifecycleHandle::is_registered)
    }

    /// Returns the members of `group`, sorted.
    #[must_use]
    pub fn members(&self, group: EventGroupId) -> Vec<ClientHandle> {
        self.groups
            .read()
            .get(&group)
            .map(|members| {
                let mut members: Vec<_> = members.iter().copied().collect();
                members.sort_unstable();
                members
            })
            .unwrap_or_default()
    }

    /// Returns `true` if `client` is a member of `group`.
    #[must_use]
    pub fn is_member(&self, group: EventGroupId, client: ClientHandle) -> bool {
        self.groups
            .read()
            .get(&group)
            .is_some_and(|members| members.contains(&client))
    }

    /// Returns the number of members of `group`.
    #[must_use]
    pub fn member_count(&self, group: EventGroupId) -> usize {
        self.groups.read().get(&group).map_or(0, HashSet::len)
    }

    // ========================================================================
    // Fan-out
    // ========================================================================

    /// Sends `payload` as `event` to every member of `group`.
    ///
    /// Returns the number of clients the notification was delivered to.
    /// A failed send is logged and skipped; it does not affect the other
    /// members. Notifying an event that is not published to `group`, or
    /// notifying while the service is not registered, sends nothing.
    pub fn notify(&self, event: EventId, group: EventGroupId, payload: &[u8]) -> usize {
        if !self.is_registered() {
            tracing::debug!(service = %self.identity, event = %event, "Notification while unregistered");
            return 0;
        }

        let published = self
            .events
            .read()
            .get(&event)
            .is_some_and(|groups| groups.contains(&group));
        if !published {
            tracing::warn!(service = %self.identity, event = %event, group = %group, "Event not offered in group");
            return 0;
        }

        let recipients: Vec<ClientHandle> = self
            .groups
            .read()
            .get(&group)
            .map(|members| members.iter().copied().collect())
            .unwrap_or_default();

        self.deliver(event, recipients, payload)
    }

    /// Sends `payload` as `event` to the members of every group the event is
    /// published to. A client in several of those groups receives it once.
    pub fn notify_event(&self, event: EventId, payload: &[u8]) -> usize {
        if !self.is_registered() {
            tracing::debug!(service = %self.identity, event = %event, "Notification while unregistered");
            return 0;
        }

        let Some(event_groups) = self.events.read().get(&event).cloned() else {
            tracing::warn!(service = %self.identity, event = %event, "Event not offered");
            return 0;
        };

        let recipients: BTreeSet<ClientHandle> = {
            let groups = self.groups.read();
            event_groups
                .iter()
                .filter_map(|group| groups.get(group))
                .flat_map(|members| members.iter().copied())
                .collect()
        };

        self.deliver(event, recipients, payload)
    }

    fn deliver(
        &self,
        event: EventId,
        recipients: impl IntoIterator<Item = ClientHandle>,
        payload: &[u8],
    ) -> usize {
        let mut delivered = 0;
        for client in recipients {
            match self
                .sink
                .send_notification(client, self.identity, event, payload)
            {
                Ok(()) => delivered += 1,
                Err(e) => {
                    tracing::warn!(service = %self.identity, event = %event, %client, error = %e, "Notification failed");
                }
            }
        }
        tracing::debug!(service = %self.identity, event = %event, delivered, "Notification sent");
        delivered
    }
}

impl std::fmt::Debug for SubscriptionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubscriptionManager")
            .field("identity", &self.identity)
            .field("groups", &*self.groups.read())
            .finish_non_exhaustive()
    }
}
