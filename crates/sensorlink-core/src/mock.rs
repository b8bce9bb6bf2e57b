//! In-memory transport for testing.
//!
//! [`MockTransport`] implements [`Transport`] without a radio. It records
//! every call it receives, serves configured read values, injects failures
//! on demand and lets tests push notifications onto the shared channel.
//!
//! # Features
//!
//! - **Call log**: Inspect exactly which transport operations a driver issued
//! - **Failure injection**: Fail an operation permanently or a fixed number of times
//! - **Notification injection**: Emit raw notifications as if a peripheral sent them

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use tokio::sync::broadcast;

use sensorlink_types::GattProfile;

use crate::transport::{
    RawNotification, Transport, TransportError, TransportOp, TransportResult,
};

/// One call received by a [`MockTransport`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportCall {
    /// `connect(address)`.
    Connect { address: String },
    /// `disconnect(address)`.
    Disconnect { address: String },
    /// `read(address, profile)`.
    Read { address: String, profile: GattProfile },
    /// `write(address, profile, payload)`.
    Write {
        address: String,
        profile: GattProfile,
        payload: Vec<u8>,
    },
    /// `subscribe(address, profile)`.
    Subscribe { address: String, profile: GattProfile },
    /// `unsubscribe(address, profile)`.
    Unsubscribe { address: String, profile: GattProfile },
}

impl TransportCall {
    /// The operation this call performed.
    pub fn op(&self) -> TransportOp {
        match self {
            Self::Connect { .. } => TransportOp::Connect,
            Self::Disconnect { .. } => TransportOp::Disconnect,
            Self::Read { .. } => TransportOp::Read,
            Self::Write { .. } => TransportOp::Write,
            Self::Subscribe { .. } => TransportOp::Subscribe,
            Self::Unsubscribe { .. } => TransportOp::Unsubscribe,
        }
    }

    /// The GATT key the call targeted, if any.
    pub fn profile(&self) -> Option<&GattProfile> {
        match self {
            Self::Read { profile, .. }
            | Self::Write { profile, .. }
            | Self::Subscribe { profile, .. }
            | Self::Unsubscribe { profile, .. } => Some(profile),
            Self::Connect { .. } | Self::Disconnect { .. } => None,
        }
    }
}

/// Injected failure for one operation.
#[derive(Debug, Clone)]
struct Failure {
    message: String,
    /// `None` fails forever; `Some(n)` fails the next `n` calls.
    remaining: Option<u32>,
}

/// A transport that talks to no radio.
pub struct MockTransport {
    connected: Mutex<HashSet<String>>,
    values: Mutex<HashMap<GattProfile, Bytes>>,
    calls: Mutex<Vec<TransportCall>>,
    failures: Mutex<HashMap<TransportOp, Failure>>,
    notifications: broadcast::Sender<RawNotification>,
    /// Simulated read latency in milliseconds (0 = no delay).
    read_latency_ms: AtomicU64,
    /// Simulated connect latency in milliseconds (0 = no delay).
    connect_latency_ms: AtomicU64,
}

impl std::fmt::Debug for MockTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockTransport")
            .field("connected", &*lock(&self.connected))
            .field("calls", &lock(&self.calls).len())
            .field("listeners", &self.notifications.receiver_count())
            .finish()
    }
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl MockTransport {
    /// Create a mock with a 64-slot notification channel.
    pub fn new() -> Self {
        Self::with_capacity(64)
    }

    /// Create a mock with a custom notification channel capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        let (notifications, _) = broadcast::channel(capacity);
        Self {
            connected: Mutex::new(HashSet::new()),
            values: Mutex::new(HashMap::new()),
            calls: Mutex::new(Vec::new()),
            failures: Mutex::new(HashMap::new()),
            notifications,
            read_latency_ms: AtomicU64::new(0),
            connect_latency_ms: AtomicU64::new(0),
        }
    }

    /// Set the value returned when `profile` is read.
    pub fn set_value(&self, profile: GattProfile, value: impl Into<Bytes>) {
        lock(&self.values).insert(profile, value.into());
    }

    /// Fail every call of `op` until [`clear_failures`](Self::clear_failures).
    pub fn fail(&self, op: TransportOp, message: impl Into<String>) {
        lock(&self.failures).insert(
            op,
            Failure {
                message: message.into(),
                remaining: None,
            },
        );
    }

    /// Fail the next `times` calls of `op`.
    pub fn fail_times(&self, op: TransportOp, times: u32, message: impl Into<String>) {
        lock(&self.failures).insert(
            op,
            Failure {
                message: message.into(),
                remaining: Some(times),
            },
        );
    }

    /// Remove all injected failures.
    pub fn clear_failures(&self) {
        lock(&self.failures).clear();
    }

    /// Add artificial latency to reads.
    pub fn set_read_latency(&self, latency: Duration) {
        self.read_latency_ms
            .store(latency.as_millis() as u64, Ordering::Relaxed);
    }

    /// Add artificial latency to connects.
    pub fn set_connect_latency(&self, latency: Duration) {
        self.connect_latency_ms
            .store(latency.as_millis() as u64, Ordering::Relaxed);
    }

    /// Every call received so far, in order.
    pub fn calls(&self) -> Vec<TransportCall> {
        lock(&self.calls).clone()
    }

    /// Number of calls of `op`.
    pub fn count(&self, op: TransportOp) -> usize {
        lock(&self.calls).iter().filter(|c| c.op() == op).count()
    }

    /// Number of calls of `op` against `profile`.
    pub fn count_for(&self, op: TransportOp, profile: &GattProfile) -> usize {
        lock(&self.calls)
            .iter()
            .filter(|c| c.op() == op && c.profile() == Some(profile))
            .count()
    }

    /// Forget the call log.
    pub fn clear_calls(&self) {
        lock(&self.calls).clear();
    }

    /// Whether `connect` succeeded for the address and no disconnect followed.
    pub fn is_connected(&self, address: &str) -> bool {
        lock(&self.connected).contains(address)
    }

    /// Number of listeners registered on the notification channel.
    pub fn listener_count(&self) -> usize {
        self.notifications.receiver_count()
    }

    /// Push a notification to every registered listener.
    ///
    /// Returns the number of listeners that received it.
    pub fn emit(&self, address: &str, profile: GattProfile, payload: impl Into<Bytes>) -> usize {
        self.notifications
            .send(RawNotification::new(address, profile, payload))
            .unwrap_or(0)
    }

    fn record(&self, call: TransportCall) -> TransportResult<()> {
        let op = call.op();
        let address = match &call {
            TransportCall::Connect { address }
            | TransportCall::Disconnect { address }
            | TransportCall::Read { address, .. }
            | TransportCall::Write { address, .. }
            | TransportCall::Subscribe { address, .. }
            | TransportCall::Unsubscribe { address, .. } => address.clone(),
        };
        lock(&self.calls).push(call);

        let mut failures = lock(&self.failures);
        let Some(failure) = failures.get_mut(&op) else {
            return Ok(());
        };
        let err = TransportError::new(op, address, failure.message.clone());
        match failure.remaining {
            None => Err(err),
            Some(n) => {
                if n <= 1 {
                    failures.remove(&op);
                } else {
                    failure.remaining = Some(n - 1);
                }
                if n == 0 { Ok(()) } else { Err(err) }
            }
        }
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn connect(&self, address: &str) -> TransportResult<()> {
        delay(&self.connect_latency_ms).await;
        self.record(TransportCall::Connect {
            address: address.to_string(),
        })?;
        lock(&self.connected).insert(address.to_string());
        Ok(())
    }

    async fn disconnect(&self, address: &str) -> TransportResult<()> {
        self.record(TransportCall::Disconnect {
            address: address.to_string(),
        })?;
        lock(&self.connected).remove(address);
        Ok(())
    }

    async fn read(&self, address: &str, profile: &GattProfile) -> TransportResult<Bytes> {
        delay(&self.read_latency_ms).await;
        self.record(TransportCall::Read {
            address: address.to_string(),
            profile: *profile,
        })?;
        lock(&self.values).get(profile).cloned().ok_or_else(|| {
            TransportError::new(TransportOp::Read, address, format!("no value for {profile}"))
        })
    }

    async fn write(
        &self,
        address: &str,
        profile: &GattProfile,
        payload: &[u8],
    ) -> TransportResult<()> {
        self.record(TransportCall::Write {
            address: address.to_string(),
            profile: *profile,
            payload: payload.to_vec(),
        })
    }

    async fn subscribe(&self, address: &str, profile: &GattProfile) -> TransportResult<()> {
        self.record(TransportCall::Subscribe {
            address: address.to_string(),
            profile: *profile,
        })
    }

    async fn unsubscribe(&self, address: &str, profile: &GattProfile) -> TransportResult<()> {
        self.record(TransportCall::Unsubscribe {
            address: address.to_string(),
            profile: *profile,
        })
    }

    fn notifications(&self) -> broadcast::Receiver<RawNotification> {
        self.notifications.subscribe()
    }
}

async fn delay(latency_ms: &AtomicU64) {
    let latency = latency_ms.load(Ordering::Relaxed);
    if latency > 0 {
        tokio::time::sleep(Duration::from_millis(latency)).await;
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use sensorlink_types::uuids;

    const ADDRESS: &str = "AA:BB:CC:DD:EE:FF";

    fn battery() -> GattProfile {
        GattProfile::new(uuids::BATTERY_SERVICE, uuids::BATTERY_LEVEL)
    }

    #[tokio::test]
    async fn test_mock_connect_and_read() {
        let transport = MockTransport::new();
        transport.set_value(battery(), vec![0x42]);

        transport.connect(ADDRESS).await.unwrap();
        assert!(transport.is_connected(ADDRESS));

        let value = transport.read(ADDRESS, &battery()).await.unwrap();
        assert_eq!(&value[..], &[0x42]);
        assert_eq!(transport.count(TransportOp::Read), 1);

        transport.disconnect(ADDRESS).await.unwrap();
        assert!(!transport.is_connected(ADDRESS));
    }

    #[tokio::test]
    async fn test_mock_read_without_value() {
        let transport = MockTransport::new();
        let err = transport.read(ADDRESS, &battery()).await.unwrap_err();
        assert_eq!(err.op, TransportOp::Read);
    }

    #[tokio::test]
    async fn test_mock_permanent_failure() {
        let transport = MockTransport::new();
        transport.fail(TransportOp::Subscribe, "gatt busy");

        for _ in 0..3 {
            let err = transport.subscribe(ADDRESS, &battery()).await.unwrap_err();
            assert_eq!(err.message, "gatt busy");
        }
        assert_eq!(transport.count(TransportOp::Subscribe), 3);

        transport.clear_failures();
        assert!(transport.subscribe(ADDRESS, &battery()).await.is_ok());
    }

    #[tokio::test]
    async fn test_mock_transient_failures() {
        let transport = MockTransport::new();
        transport.fail_times(TransportOp::Connect, 2, "out of range");

        assert!(transport.connect(ADDRESS).await.is_err());
        assert!(transport.connect(ADDRESS).await.is_err());
        assert!(transport.connect(ADDRESS).await.is_ok());
        assert_eq!(transport.count(TransportOp::Connect), 3);
    }

    #[tokio::test]
    async fn test_mock_call_log() {
        let transport = MockTransport::new();
        transport.write(ADDRESS, &battery(), &[1]).await.unwrap();
        transport.subscribe(ADDRESS, &battery()).await.unwrap();

        let calls = transport.calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(
            calls[0],
            TransportCall::Write {
                address: ADDRESS.into(),
                profile: battery(),
                payload: vec![1],
            }
        );
        assert_eq!(transport.count_for(TransportOp::Subscribe, &battery()), 1);

        transport.clear_calls();
        assert!(transport.calls().is_empty());
    }

    #[tokio::test]
    async fn test_mock_emit() {
        let transport = MockTransport::new();
        assert_eq!(transport.emit(ADDRESS, battery(), vec![1]), 0);

        let mut rx = transport.notifications();
        assert_eq!(transport.listener_count(), 1);
        assert_eq!(transport.emit(ADDRESS, battery(), vec![7]), 1);

        let notification = rx.recv().await.unwrap();
        assert_eq!(notification.address, ADDRESS);
        assert_eq!(&notification.payload[..], &[7]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_mock_latency() {
        let transport = MockTransport::new();
        transport.set_value(battery(), vec![0x10]);
        transport.set_connect_latency(Duration::from_millis(300));
        transport.set_read_latency(Duration::from_millis(50));

        let started = tokio::time::Instant::now();
        transport.connect(ADDRESS).await.unwrap();
        assert!(started.elapsed() >= Duration::from_millis(300));
        transport.read(ADDRESS, &battery()).await.unwrap();
        assert!(started.elapsed() >= Duration::from_millis(350));
    }

    #[test]
    fn test_mock_debug() {
        let transport = MockTransport::new();
        let debug_str = format!("{:?}", transport);
        assert!(debug_str.contains("MockTransport"));
    }
}
