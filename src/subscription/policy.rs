// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Admission control for incoming subscriptions.

use crate::types::{ClientHandle, EventGroupId};

/// Decides whether a client may join an event group.
pub trait SubscriptionPolicy: Send + Sync {
    /// Returns `true` to accept the subscription.
    fn accept(&self, group: EventGroupId, client: ClientHandle) -> bool;
}

/// Accepts every subscription.
#[derive(Debug, Clone, Copy, Default)]
pub struct AcceptAll;

impl SubscriptionPolicy for AcceptAll {
    fn accept(&self, _group: EventGroupId, _client: ClientHandle) -> bool {
        true
    }
}

impl<F> SubscriptionPolicy for F
where
    F: Fn(EventGroupId, ClientHandle) -> bool + Send + Sync,
{
    fn accept(&self, group: EventGroupId, client: ClientHandle) -> bool {
        self(group, client)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn closure_policy() {
        let only_local = |_: EventGroupId, client: ClientHandle| client.value() < 0x0100;
        assert!(only_local.accept(EventGroupId::new(1), ClientHandle::new(0x0010)));
        assert!(!only_local.accept(EventGroupId::new(1), ClientHandle::new(0x0200)));
    }

    #[test]
    fn accept_all() {
        assert!(AcceptAll.accept(EventGroupId::new(9), ClientHandle::new(9)));
    }
}
