//! Error types for sensorlink-core.
//!
//! Every failure of a driver operation is reported as a typed [`Error`];
//! nothing is collapsed into a boolean.
//!
//! # Error Handling Strategies
//!
//! | Error Type | Strategy | Rationale |
//! |------------|----------|-----------|
//! | [`Error::UnsupportedComponent`] | Do not retry | Component is not in the family's table |
//! | [`Error::NotConnected`] | Connect, then retry | The device link is down |
//! | [`Error::Transport`] | Left to the caller | The transport owns retry policy |
//! | [`Error::Decode`] | Do not retry | Payload layout does not match the component |
//! | [`Error::RefcountViolation`] | Do not retry | Unsubscribe without a matching subscribe |
//! | [`Error::DeviceNotFound`] | Do not retry | No device registered under that id |
//! | [`Error::UnsupportedDevice`] | Do not retry | Advertised name matches no family |
//!
//! Transport failures while subscribing roll back the in-memory reference
//! count. Transport failures while unsubscribing are logged and the
//! decrement stands.

use thiserror::Error;

use sensorlink_types::DecodeError;

use crate::transport::TransportError;

/// Errors that can occur when driving a sensor device.
///
/// This enum is marked `#[non_exhaustive]` to allow adding new error variants
/// in future versions without breaking downstream code.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// Component name is absent from the device family's table.
    #[error("Sensor not supported: {component}")]
    UnsupportedComponent {
        /// The requested component.
        component: String,
    },

    /// Operation attempted while the device is not connected.
    #[error("BLE device not connected: {device}")]
    NotConnected {
        /// Device identifier.
        device: String,
    },

    /// The transport failed to perform a read, write, subscribe or unsubscribe.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The payload could not be decoded.
    #[error("Decode failed: {0}")]
    Decode(#[from] DecodeError),

    /// Unsubscribe called for a component with no active subscription.
    #[error("Unsubscribe of {component} without an active subscription")]
    RefcountViolation {
        /// The component whose count was already zero.
        component: String,
    },

    /// No device is registered under the given identifier.
    #[error("Device not found: {0}")]
    DeviceNotFound(String),

    /// The advertised device name matches no known family.
    #[error("No driver matches device '{0}'")]
    UnsupportedDevice(String),

    /// Invalid configuration provided.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl Error {
    /// Create an unsupported component error.
    pub fn unsupported(component: impl Into<String>) -> Self {
        Self::UnsupportedComponent {
            component: component.into(),
        }
    }

    /// Create a not-connected error for a device.
    pub fn not_connected(device: impl Into<String>) -> Self {
        Self::NotConnected {
            device: device.into(),
        }
    }

    /// Create a refcount violation error.
    pub fn refcount_violation(component: impl Into<String>) -> Self {
        Self::RefcountViolation {
            component: component.into(),
        }
    }

    /// Create a device not found error.
    pub fn device_not_found(id: impl Into<String>) -> Self {
        Self::DeviceNotFound(id.into())
    }

    /// Whether the error came from the transport.
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_))
    }
}

/// Result type alias using sensorlink-core's Error type.
pub type Result<T> = std::result::Result<T, Error>;
