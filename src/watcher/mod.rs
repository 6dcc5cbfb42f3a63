// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Polling-based watchers for externally changed resources.
//!
//! A [`StateWatcher`] wraps a [`Probe`] and turns repeated observations into
//! discrete transitions. [`spawn_poll_loop`] drives any number of watchers on
//! a fixed cadence with a cooperative stop signal; tests call
//! [`StateWatcher::poll`] directly instead.
//!
//! ```text
//!  interval tick ──▶ StateWatcher::poll() ──▶ Some(new) ──▶ caller notifies
//!                          │
//!                          └── None (unchanged or inaccessible)
//! ```

mod poll_loop;
mod probe;
mod state_watcher;

pub use poll_loop::{FAST_POLL_INTERVAL, SLOW_POLL_INTERVAL, spawn_poll_loop};
pub use probe::{FlagProbe, ModifiedTimeProbe, Probe};
pub use state_watcher::{StateWatcher, WatchedResourceState};
