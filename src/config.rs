// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Service configuration.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, ValueError};
use crate::service::ids;
use crate::transfer::DEFAULT_MAX_CHUNK_SIZE;
use crate::types::ServiceIdentity;
use crate::watcher::{FAST_POLL_INTERVAL, SLOW_POLL_INTERVAL};

/// Default LED brightness file driven by the control service.
pub const DEFAULT_INDICATOR_PATH: &str = "/sys/class/leds/input4::capslock/brightness";

/// Default staged firmware image.
pub const DEFAULT_FIRMWARE_PATH: &str = "firmware.bin";

/// Default version label announced with a new firmware image.
pub const DEFAULT_FIRMWARE_VERSION: &str = "v1.0.0";

/// Configuration for the device services.
///
/// Every field has a default, so a JSON document only needs to name what it
/// overrides. Intervals are milliseconds on the wire.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use devctl_lib::config::ServiceConfig;
///
/// let config = ServiceConfig::from_json_str(r#"{ "max_chunk_size": 4096 }"#).unwrap();
/// assert_eq!(config.max_chunk_size, 4096);
///
/// let config = ServiceConfig::default()
///     .with_indicator_path("/tmp/led")
///     .with_monitor_interval(Duration::from_millis(50));
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Endpoint of the control service.
    pub control: ServiceIdentity,
    /// Endpoint of the monitor service.
    pub monitor: ServiceIdentity,
    /// Endpoint of the firmware service.
    pub firmware: ServiceIdentity,
    /// LED brightness file written by control and read by monitor.
    pub indicator_path: PathBuf,
    /// Staged firmware image, if any.
    pub firmware_path: Option<PathBuf>,
    /// Label sent with the new-firmware notification.
    pub firmware_version: String,
    /// Indicator polling cadence.
    #[serde(with = "duration_ms", rename = "monitor_interval_ms")]
    pub monitor_interval: Duration,
    /// Firmware file polling cadence.
    #[serde(with = "duration_ms", rename = "firmware_interval_ms")]
    pub firmware_interval: Duration,
    /// Cap on one firmware chunk, in bytes.
    pub max_chunk_size: u32,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            control: ids::CONTROL_SERVICE,
            monitor: ids::MONITOR_SERVICE,
            firmware: ids::FIRMWARE_SERVICE,
            indicator_path: PathBuf::from(DEFAULT_INDICATOR_PATH),
            firmware_path: Some(PathBuf::from(DEFAULT_FIRMWARE_PATH)),
            firmware_version: DEFAULT_FIRMWARE_VERSION.to_string(),
            monitor_interval: FAST_POLL_INTERVAL,
            firmware_interval: SLOW_POLL_INTERVAL,
            max_chunk_size: DEFAULT_MAX_CHUNK_SIZE,
        }
    }
}

impl ServiceConfig {
    /// Parses and validates a JSON document.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` for malformed JSON or `Error::Value` if a
    /// field is out of range.
    pub fn from_json_str(json: &str) -> Result<Self, Error> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a JSON file.
    ///
    /// # Errors
    ///
    /// Returns `Error::Resource` if the file cannot be read, otherwise as
    /// [`ServiceConfig::from_json_str`].
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, Error> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| {
            crate::error::ResourceError::Read {
                path: path.to_path_buf(),
                source,
            }
        })?;
        Self::from_json_str(&json)
    }

    /// Checks field ranges.
    ///
    /// # Errors
    ///
    /// Returns `ValueError::EmptyPath` for an empty indicator or firmware
    /// path, or `ValueError::OutOfRange` for a zero interval or chunk size.
    pub fn validate(&self) -> Result<(), ValueError> {
        if self.indicator_path.as_os_str().is_empty() {
            return Err(ValueError::EmptyPath("indicator"));
        }
        if self
            .firmware_path
            .as_ref()
            .is_some_and(|p| p.as_os_str().is_empty())
        {
            return Err(ValueError::EmptyPath("firmware"));
        }
        if self.max_chunk_size == 0 {
            return Err(ValueError::OutOfRange {
                min: 1,
                max: u64::from(u32::MAX),
                actual: 0,
            });
        }
        for interval in [self.monitor_interval, self.firmware_interval] {
            if interval.is_zero() {
                return Err(ValueError::OutOfRange {
                    min: 1,
                    max: u64::MAX,
                    actual: 0,
                });
            }
        }
        Ok(())
    }

    /// Sets the indicator file.
    #[must_use]
    pub fn with_indicator_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.indicator_path = path.into();
        self
    }

    /// Sets the staged firmware image.
    #[must_use]
    pub fn with_firmware_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.firmware_path = Some(path.into());
        self
    }

    /// Starts without a staged firmware image.
    #[must_use]
    pub fn without_firmware(mut self) -> Self {
        self.firmware_path = None;
        self
    }

    /// Sets the label announced with new firmware.
    #[must_use]
    pub fn with_firmware_version(mut self, version: impl Into<String>) -> Self {
        self.firmware_version = version.into();
        self
    }

    /// Sets the indicator polling cadence.
    #[must_use]
    pub fn with_monitor_interval(mut self, interval: Duration) -> Self {
        self.monitor_interval = interval;
        self
    }

    /// Sets the firmware polling cadence.
    #[must_use]
    pub fn with_firmware_interval(mut self, interval: Duration) -> Self {
        self.firmware_interval = interval;
        self
    }

    /// Sets the chunk size cap.
    #[must_use]
    pub fn with_max_chunk_size(mut self, size: u32) -> Self {
        self.max_chunk_size = size;
        self
    }
}

mod duration_ms {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(u64::try_from(value.as_millis()).unwrap_or(u64::MAX))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}
