// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Bus identifiers.
//!
//! All identifiers are 16-bit values assigned at design time. They are
//! wrapped in distinct types so a method ID can never be passed where an
//! event group is expected.

use std::fmt;

use serde::{Deserialize, Serialize};

macro_rules! id_newtype {
    ($(#[$meta:meta])* $name:ident, $label:literal) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(u16);

        impl $name {
            /// Wraps a raw identifier.
            #[must_use]
            pub const fn new(value: u16) -> Self {
                Self(value)
            }

            /// Returns the raw identifier.
            #[must_use]
            pub const fn value(&self) -> u16 {
                self.0
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({:#06x})", stringify!($name), self.0)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($label, "{:#06x}"), self.0)
            }
        }

        impl From<u16> for $name {
            fn from(value: u16) -> Self {
                Self(value)
            }
        }

        impl From<$name> for u16 {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

id_newtype!(
    /// Identifies an offered service on the bus.
    ServiceId,
    ""
);

id_newtype!(
    /// Identifies one instance of a service.
    InstanceId,
    ""
);

id_newtype!(
    /// Identifies one command operation within a service.
    MethodId,
    ""
);

id_newtype!(
    /// Identifies one notification stream within a service.
    EventId,
    ""
);

id_newtype!(
    /// Identifies the subscription group that receives a set of events.
    EventGroupId,
    ""
);

id_newtype!(
    /// Opaque per-peer handle supplied by the transport.
    ///
    /// The core never owns the peer; the handle is only a lookup key for
    /// subscription membership and reply routing.
    ClientHandle,
    "client "
);

/// The endpoint identity of one offered service instance.
///
/// Assigned once at startup and immutable afterwards.
///
/// # Examples
///
/// ```
/// use devctl_lib::types::{InstanceId, ServiceId, ServiceIdentity};
///
/// let identity = ServiceIdentity::new(ServiceId::new(0x1111), InstanceId::new(0x0001));
/// assert_eq!(identity.to_string(), "0x1111.0x0001");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ServiceIdentity {
    /// The service identifier.
    pub service_id: ServiceId,
    /// The instance identifier.
    pub instance_id: InstanceId,
}

impl ServiceIdentity {
    /// Creates a new service identity.
    #[must_use]
    pub const fn new(service_id: ServiceId, instance_id: InstanceId) -> Self {
        Self {
            service_id,
            instance_id,
        }
    }
}

impl fmt::Display for ServiceIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.service_id, self.instance_id)
    }
}
