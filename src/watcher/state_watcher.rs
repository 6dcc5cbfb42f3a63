// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Change detection over a polled resource.

use std::path::PathBuf;

use chrono::{DateTime, Utc};

use super::Probe;

/// What the watcher last saw.
#[derive(Debug, Clone, PartialEq)]
pub struct WatchedResourceState<V> {
    /// The watched resource.
    pub path: PathBuf,
    /// When the last successful observation happened.
    pub last_observed_stamp: Option<DateTime<Utc>>,
    /// The last observed value, `None` before the first observation.
    pub last_observed_value: Option<V>,
}

/// Detects transitions of a resource's observable value.
///
/// Each [`poll`](Self::poll) observes the resource once and returns the new
/// value only when it differs from the last observed one. A value held
/// steady across many polls is reported exactly once.
///
/// Probe failures are logged and read as "no change" so a temporarily
/// missing file never stops the polling loop. The first failure after a
/// success is logged at `warn`, repeats at `debug`.
///
/// The watcher has no notion of subscribers; callers decide what to do with
/// a detected change.
///
/// # Examples
///
/// ```
/// use devctl_lib::resource::MemoryAccessor;
/// use devctl_lib::watcher::{FlagProbe, StateWatcher};
///
/// let accessor = MemoryAccessor::new();
/// accessor.insert("brightness", b"0".to_vec());
///
/// let mut watcher = StateWatcher::new(FlagProbe::new(accessor.clone(), "brightness"), false);
/// assert_eq!(watcher.poll(), None);
///
/// accessor.insert("brightness", b"1".to_vec());
/// assert_eq!(watcher.poll(), Some(true));
/// assert_eq!(watcher.poll(), None);
/// ```
#[derive(Debug)]
pub struct StateWatcher<P: Probe> {
    probe: P,
    state: WatchedResourceState<P::Value>,
    failing: bool,
}

impl<P: Probe> StateWatcher<P> {
    /// Creates a watcher with a known baseline value.
    pub fn new(probe: P, baseline: P::Value) -> Self {
        let path = probe.path().to_path_buf();
        Self {
            probe,
            state: WatchedResourceState {
                path,
                last_observed_stamp: None,
                last_observed_value: Some(baseline),
            },
            failing: false,
        }
    }

    /// Creates a watcher without a baseline.
    ///
    /// The first successful observation is reported as a change.
    pub fn unprimed(probe: P) -> Self {
        let path = probe.path().to_path_buf();
        Self {
            probe,
            state: WatchedResourceState {
                path,
                last_observed_stamp: None,
                last_observed_value: None,
            },
            failing: false,
        }
    }

    /// Creates a watcher whose baseline is the resource's current value.
    ///
    /// If the resource cannot be observed yet, the watcher starts unprimed.
    pub fn primed(probe: P) -> Self {
        let mut watcher = Self::unprimed(probe);
        let initial = watcher.poll();
        tracing::debug!(
            path = %watcher.state.path.display(),
            initial = ?initial,
            "Primed watcher baseline"
        );
        watcher
    }

    /// Observes the resource and returns the new value on a transition.
    pub fn poll(&mut self) -> Option<P::Value> {
        let current = match self.probe.observe() {
            Ok(value) => value,
            Err(e) => {
                if self.failing {
                    tracing::debug!(error = %e, "Watched resource still inaccessible");
                } else {
                    tracing::warn!(error = %e, "Watched resource inaccessible, skipping cycle");
                    self.failing = true;
                }
                return None;
            }
        };

        if self.failing {
            tracing::info!(path = %self.state.path.display(), "Watched resource accessible again");
            self.failing = false;
        }
        self.state.last_observed_stamp = Some(Utc::now());

        let changed = match &self.state.last_observed_value {
            Some(previous) => self.probe.is_change(previous, &current),
            None => true,
        };
        if !changed {
            return None;
        }

        tracing::debug!(
            path = %self.state.path.display(),
            previous = ?self.state.last_observed_value,
            current = ?current,
            "Watched resource changed"
        );
        self.state.last_observed_value = Some(current.clone());
        Some(current)
    }

    /// Returns the last observed state.
    #[must_use]
    pub fn state(&self) -> &WatchedResourceState<P::Value> {
        &self.state
    }

    /// Returns the last observed value.
    #[must_use]
    pub fn last_value(&self) -> Option<&P::Value> {
        self.state.last_observed_value.as_ref()
    }

    /// Returns `true` while the resource keeps failing to be observed.
    #[must_use]
    pub fn is_failing(&self) -> bool {
        self.failing
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::MemoryAccessor;
    use crate::watcher::{FlagProbe, ModifiedTimeProbe};

    fn flag_watcher(accessor: &MemoryAccessor) -> StateWatcher<FlagProbe<MemoryAccessor>> {
        StateWatcher::new(FlagProbe::new(accessor.clone(), "brightness"), false)
    }

    #[test]
    fn unchanged_value_returns_nothing() {
        let accessor = MemoryAccessor::new();
        accessor.insert("brightness", b"0".to_vec());
        let mut watcher = flag_watcher(&accessor);

        assert_eq!(watcher.poll(), None);
        assert_eq!(watcher.poll(), None);
        assert!(watcher.state().last_observed_stamp.is_some());
    }

    #[test]
    fn transition_reported_once_while_held() {
        let accessor = MemoryAccessor::new();
        accessor.insert("brightness", b"0".to_vec());
        let mut watcher = flag_watcher(&accessor);

        accessor.insert("brightness", b"1".to_vec());
        assert_eq!(watcher.poll(), Some(true));
        for _ in 0..5 {
            assert_eq!(watcher.poll(), None);
        }

        accessor.insert("brightness", b"0".to_vec());
        assert_eq!(watcher.poll(), Some(false));
        assert_eq!(watcher.poll(), None);
    }

    #[test]
    fn failures_are_no_change() {
        let accessor = MemoryAccessor::new();
        let mut watcher = flag_watcher(&accessor);

        assert_eq!(watcher.poll(), None);
        assert!(watcher.is_failing());
        assert_eq!(watcher.last_value(), Some(&false));

        accessor.insert("brightness", b"1".to_vec());
        assert_eq!(watcher.poll(), Some(true));
        assert!(!watcher.is_failing());
    }

    #[test]
    fn failure_between_equal_values_is_not_a_change() {
        let accessor = MemoryAccessor::new();
        accessor.insert("brightness", b"1".to_vec());
        let mut watcher = flag_watcher(&accessor);
        assert_eq!(watcher.poll(), Some(true));

        accessor.set_unreadable("brightness", true);
        assert_eq!(watcher.poll(), None);
        accessor.set_unreadable("brightness", false);
        assert_eq!(watcher.poll(), None);
    }

    #[test]
    fn unprimed_reports_first_observation() {
        let accessor = MemoryAccessor::new();
        accessor.insert("brightness", b"0".to_vec());
        let mut watcher = StateWatcher::unprimed(FlagProbe::new(accessor, "brightness"));

        assert_eq!(watcher.poll(), Some(false));
        assert_eq!(watcher.poll(), None);
    }

    #[test]
    fn primed_swallows_initial_state() {
        let accessor = MemoryAccessor::new();
        accessor.insert("firmware.bin", b"v1".to_vec());
        let mut watcher =
            StateWatcher::primed(ModifiedTimeProbe::new(accessor.clone(), "firmware.bin"));

        assert_eq!(watcher.poll(), None);

        accessor.insert("firmware.bin", b"v2".to_vec());
        assert!(watcher.poll().is_some());
        assert_eq!(watcher.poll(), None);
    }

    #[test]
    fn primed_on_missing_resource_reports_first_appearance() {
        let accessor = MemoryAccessor::new();
        let mut watcher =
            StateWatcher::primed(ModifiedTimeProbe::new(accessor.clone(), "firmware.bin"));
        assert!(watcher.last_value().is_none());

        accessor.insert("firmware.bin", b"v1".to_vec());
        assert!(watcher.poll().is_some());
    }
}
