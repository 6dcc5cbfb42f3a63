// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Fixed-cadence polling task.

use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

/// Cadence for fast-changing hardware state such as an LED.
pub const FAST_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Cadence for slow artifacts such as a staged firmware image.
pub const SLOW_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// Spawns a task that runs `cycle` every `period` until `cancel` fires.
///
/// The first cycle runs one period after spawning. Each cycle completes,
/// including whatever notification fan-out it triggers, before the task
/// waits for the next tick; ticks missed during a slow cycle are delayed
/// rather than burst.
///
/// Must be called from within a tokio runtime.
///
/// # Examples
///
/// ```no_run
/// use std::time::Duration;
/// use tokio_util::sync::CancellationToken;
/// use devctl_lib::watcher::spawn_poll_loop;
///
/// # async fn example() {
/// let cancel = CancellationToken::new();
/// let handle = spawn_poll_loop("example", Duration::from_millis(100), cancel.clone(), || {
///     // poll a watcher here
/// });
///
/// cancel.cancel();
/// handle.await.unwrap();
/// # }
/// ```
pub fn spawn_poll_loop<F>(
    name: &'static str,
    period: Duration,
    cancel: CancellationToken,
    mut cycle: F,
) -> JoinHandle<()>
where
    F: FnMut() + Send + 'static,
{
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        interval.tick().await; // Skip initial tick

        tracing::debug!(poll_loop = name, ?period, "Poll loop started");
        loop {
            tokio::select! {
                () = cancel.cancelled() => break,
                _ = interval.tick() => cycle(),
            }
        }
        tracing::debug!(poll_loop = name, "Poll loop stopped");
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test(start_paused = true)]
    async fn runs_on_cadence_until_cancelled() {
        let cancel = CancellationToken::new();
        let counter = Arc::new(AtomicU32::new(0));
        let counter_clone = counter.clone();

        let handle = spawn_poll_loop("test", Duration::from_millis(100), cancel.clone(), move || {
            counter_clone.fetch_add(1, Ordering::SeqCst);
        });

        tokio::time::sleep(Duration::from_millis(350)).await;
        assert_eq!(counter.load(Ordering::SeqCst), 3);

        cancel.cancel();
        handle.await.unwrap();

        tokio::time::sleep(Duration::from_millis(500)).await;
        assert_eq!(counter.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_before_first_tick() {
        let cancel = CancellationToken::new();
        let counter = Arc::new(AtomicU32::new(0));
        let counter_clone = counter.clone();

        let handle = spawn_poll_loop("test", SLOW_POLL_INTERVAL, cancel.clone(), move || {
            counter_clone.fetch_add(1, Ordering::SeqCst);
        });

        cancel.cancel();
        handle.await.unwrap();
        assert_eq!(counter.load(Ordering::SeqCst), 0);
    }
}
