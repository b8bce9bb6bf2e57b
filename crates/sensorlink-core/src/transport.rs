//! The radio transport contract consumed by device drivers.
//!
//! The transport performs the actual BLE I/O. Drivers only ever talk to a
//! `dyn Transport`, so the radio stack (a D-Bus protocol service, a native
//! BLE library, or [`MockTransport`](crate::mock::MockTransport) in tests)
//! stays outside this crate.

use core::fmt;

use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;
use tokio::sync::broadcast;

use sensorlink_types::GattProfile;

/// Transport operation that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransportOp {
    /// Establishing the link.
    Connect,
    /// Tearing down the link.
    Disconnect,
    /// Reading a characteristic.
    Read,
    /// Writing a characteristic.
    Write,
    /// Enabling notifications.
    Subscribe,
    /// Disabling notifications.
    Unsubscribe,
}

impl fmt::Display for TransportOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Connect => "connect",
            Self::Disconnect => "disconnect",
            Self::Read => "read",
            Self::Write => "write",
            Self::Subscribe => "subscribe",
            Self::Unsubscribe => "unsubscribe",
        };
        f.write_str(name)
    }
}

/// A failure reported by the transport.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Transport {op} failed for {address}: {message}")]
pub struct TransportError {
    /// The operation that failed.
    pub op: TransportOp,
    /// Device address the operation targeted.
    pub address: String,
    /// Transport-specific description.
    pub message: String,
}

impl TransportError {
    /// Create a transport error.
    pub fn new(op: TransportOp, address: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            op,
            address: address.into(),
            message: message.into(),
        }
    }
}

/// A value-changed notification delivered by the transport.
///
/// Notifications for every device travel on one shared channel; consumers
/// filter on `address`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawNotification {
    /// Address of the originating device.
    pub address: String,
    /// Characteristic the value was reported against.
    pub profile: GattProfile,
    /// Raw characteristic value.
    pub payload: Bytes,
}

impl RawNotification {
    /// Create a notification.
    pub fn new(address: impl Into<String>, profile: GattProfile, payload: impl Into<Bytes>) -> Self {
        Self {
            address: address.into(),
            profile,
            payload: payload.into(),
        }
    }
}

/// Result type for transport calls.
pub type TransportResult<T> = std::result::Result<T, TransportError>;

/// BLE transport performing GATT operations on behalf of drivers.
///
/// Implementations must be safe to call concurrently for different devices.
/// Retry policy, if any, belongs to the implementation.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Establish a link to the device.
    async fn connect(&self, address: &str) -> TransportResult<()>;

    /// Tear down the link to the device.
    async fn disconnect(&self, address: &str) -> TransportResult<()>;

    /// Read a characteristic value.
    async fn read(&self, address: &str, profile: &GattProfile) -> TransportResult<Bytes>;

    /// Write a characteristic value.
    async fn write(&self, address: &str, profile: &GattProfile, payload: &[u8])
    -> TransportResult<()>;

    /// Enable value-changed notifications for a characteristic.
    async fn subscribe(&self, address: &str, profile: &GattProfile) -> TransportResult<()>;

    /// Disable value-changed notifications for a characteristic.
    async fn unsubscribe(&self, address: &str, profile: &GattProfile) -> TransportResult<()>;

    /// Register a listener on the shared notification channel.
    fn notifications(&self) -> broadcast::Receiver<RawNotification>;
}
