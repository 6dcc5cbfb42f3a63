// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types for the device service library.
//!
//! This module provides the error hierarchy used across the library: value
//! validation, lifecycle guards, command dispatch, resource access and the
//! bus transport.
//!
//! Errors that a bus client must be able to branch on (resource not
//! configured, end of resource, ...) are not represented here. They travel as
//! [`ReasonCode`](crate::types::ReasonCode) values inside ordinary replies.

use std::path::PathBuf;

use thiserror::Error;

use crate::types::{ClientHandle, MethodId};

/// The main error type for this library.
#[derive(Debug, Error)]
pub enum Error {
    /// Error occurred during value validation.
    #[error("value error: {0}")]
    Value(#[from] ValueError),

    /// A lifecycle guard refused the operation.
    #[error("lifecycle error: {0}")]
    Lifecycle(#[from] LifecycleError),

    /// The dispatcher could not route a command.
    #[error("dispatch error: {0}")]
    Dispatch(#[from] DispatchError),

    /// A backing resource could not be accessed.
    #[error("resource error: {0}")]
    Resource(#[from] ResourceError),

    /// The bus transport reported a failure.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// The configuration could not be parsed.
    #[error("config error: {0}")]
    Config(#[from] serde_json::Error),

    /// The remote service is not available; the send was rejected.
    #[error("service is unavailable")]
    ServiceUnavailable,
}

/// Errors related to value validation and constraints.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValueError {
    /// A numeric value is outside the allowed range.
    #[error("value {actual} is out of range [{min}, {max}]")]
    OutOfRange {
        /// Minimum allowed value.
        min: u64,
        /// Maximum allowed value.
        max: u64,
        /// The actual value that was provided.
        actual: u64,
    },

    /// A payload had the wrong length.
    #[error("expected {expected}-byte payload, got {actual} bytes")]
    PayloadLength {
        /// Required length in bytes.
        expected: usize,
        /// Length that was received.
        actual: usize,
    },

    /// An unknown control command byte.
    #[error("invalid control command: {0}")]
    InvalidCommand(u8),

    /// An unknown reply reason code.
    #[error("invalid reason code: {0}")]
    InvalidReasonCode(u8),

    /// A configured path is empty.
    #[error("empty path for {0}")]
    EmptyPath(&'static str),
}

/// Errors raised by the lifecycle controller's guards.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LifecycleError {
    /// Offer or request attempted before the application registered.
    #[error("application is not registered (state: {0})")]
    NotReady(String),

    /// Registration requested while not unregistered.
    #[error("registration already in progress or complete (state: {0})")]
    AlreadyRegistering(String),

    /// Offer attempted by a client, or request attempted by a server.
    #[error("operation not permitted in the {0} role")]
    WrongRole(&'static str),
}

/// Errors raised by the command dispatcher.
///
/// These are protocol errors: the transport answers them with a negative
/// reply, they never terminate the service.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DispatchError {
    /// No handler is registered for the method.
    #[error("unknown method {0}")]
    UnknownMethod(MethodId),

    /// A handler was registered twice for the same method.
    #[error("duplicate handler for method {0}")]
    DuplicateMethod(MethodId),

    /// The service is not registered yet.
    #[error("dispatcher is not ready")]
    NotReady,
}

/// Errors related to a backing resource (file).
#[derive(Debug, Error)]
pub enum ResourceError {
    /// Opening the resource failed.
    #[error("failed to open {path}: {source}")]
    Open {
        /// The resource path.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },

    /// Reading from the resource failed.
    #[error("failed to read {path}: {source}")]
    Read {
        /// The resource path.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },

    /// Writing to the resource failed.
    #[error("failed to write {path}: {source}")]
    Write {
        /// The resource path.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },

    /// Querying resource metadata failed.
    #[error("failed to stat {path}: {source}")]
    Stat {
        /// The resource path.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },

    /// The resource content could not be decoded.
    #[error("unexpected content in {path}: {content:?}")]
    Decode {
        /// The resource path.
        path: PathBuf,
        /// The offending content, trimmed.
        content: String,
    },
}

/// Errors reported by the bus transport.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// Sending a message failed.
    #[error("send to {client} failed: {reason}")]
    SendFailed {
        /// The destination client.
        client: ClientHandle,
        /// Transport supplied description.
        reason: String,
    },

    /// Registration with the routing manager failed.
    #[error("registration failed: {0}")]
    RegistrationFailed(String),
}

/// A specialized Result type for this library.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn value_error_display() {
        let err = ValueError::OutOfRange {
            min: 1,
            max: 65_536,
            actual: 0,
        };
        assert_eq!(err.to_string(), "value 0 is out of range [1, 65536]");
    }

    #[test]
    fn error_from_lifecycle_error() {
        let err: Error = LifecycleError::NotReady("Registering".to_string()).into();
        assert!(matches!(err, Error::Lifecycle(LifecycleError::NotReady(_))));
    }

    #[test]
    fn dispatch_error_display() {
        let err = DispatchError::UnknownMethod(MethodId::new(0x0042));
        assert_eq!(err.to_string(), "unknown method 0x0042");
    }

    #[test]
    fn resource_error_keeps_source() {
        use std::error::Error as _;

        let err = ResourceError::Open {
            path: PathBuf::from("firmware.bin"),
            source: std::io::Error::from(std::io::ErrorKind::NotFound),
        };
        assert!(err.to_string().starts_with("failed to open firmware.bin"));
        assert!(err.source().is_some());
    }

    #[test]
    fn transport_error_display() {
        let err = TransportError::SendFailed {
            client: ClientHandle::new(0x0103),
            reason: "queue full".to_string(),
        };
        assert_eq!(err.to_string(), "send to client 0x0103 failed: queue full");
    }
}
