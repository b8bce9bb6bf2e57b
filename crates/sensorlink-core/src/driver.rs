//! Per-device driver facade.
//!
//! A [`SensorDriver`] owns everything that belongs to one peripheral: the
//! subscription reference counts, the notification listener, the last-known
//! readings and the connection flag. All GATT traffic goes through the
//! injected [`Transport`].
//!
//! # Locking
//!
//! Driver state sits behind one async `RwLock`. `read` holds the read lock
//! around its transport calls but not across the settling delay, so many
//! reads proceed in parallel while
//! `subscribe`, `unsubscribe`, `connect` and `disconnect` take the write lock
//! and are totally ordered per device. The lock is held across the
//! transport call, which makes "0 -> 1 increments issue exactly one
//! transport subscribe" hold even when callers race.

use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use sensorlink_types::{
    Component, Decoded, DeviceFamily, GattProfile, Reading, SensorProfile,
};

use crate::config::DriverConfig;
use crate::error::{Error, Result};
use crate::events::{DeviceEvent, DeviceId, EventDispatcher, EventReceiver};
use crate::router::{ListenerHandle, NotificationRouter};
use crate::tracker::{SubscriptionTracker, Transition};
use crate::transport::Transport;

/// Value written to a configuration characteristic to switch a sensor on.
pub const SENSOR_ENABLE: [u8; 1] = [0x01];

#[derive(Debug, Default)]
struct DriverState {
    connected: bool,
    subscriptions: SubscriptionTracker,
    listener: Option<ListenerHandle>,
}

/// Driver for one BLE sensor device.
pub struct SensorDriver {
    id: String,
    address: String,
    name: Option<String>,
    family: DeviceFamily,
    transport: Arc<dyn Transport>,
    router: Arc<NotificationRouter>,
    events: EventDispatcher,
    config: DriverConfig,
    state: RwLock<DriverState>,
}

impl std::fmt::Debug for SensorDriver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SensorDriver")
            .field("id", &self.id)
            .field("address", &self.address)
            .field("name", &self.name)
            .field("family", &self.family)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl SensorDriver {
    /// Create a disconnected driver.
    pub fn new(
        id: impl Into<String>,
        address: impl Into<String>,
        family: DeviceFamily,
        transport: Arc<dyn Transport>,
        events: EventDispatcher,
        config: DriverConfig,
    ) -> Self {
        let id = id.into();
        let address = address.into();
        let router = Arc::new(NotificationRouter::new(
            id.clone(),
            address.clone(),
            family,
            events.clone(),
        ));
        Self {
            id,
            address,
            name: None,
            family,
            transport,
            router,
            events,
            config,
            state: RwLock::new(DriverState::default()),
        }
    }

    /// Attach the advertised name.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Device identifier.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Device address on the transport.
    pub fn address(&self) -> &str {
        &self.address
    }

    /// Advertised name, if known.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Device family.
    pub fn family(&self) -> DeviceFamily {
        self.family
    }

    /// Identity used in emitted events.
    pub fn device_id(&self) -> DeviceId {
        DeviceId {
            id: self.id.clone(),
            address: self.address.clone(),
            family: self.family,
        }
    }

    /// Every component the device exposes.
    pub fn components(&self) -> &'static [Component] {
        self.family.registry().components()
    }

    /// Whether the family table contains `component`.
    pub fn is_supported(&self, component: &str) -> bool {
        self.family.is_supported(component)
    }

    /// Measurement unit for `component`.
    pub fn measurement_unit(&self, component: &str) -> Result<&'static str> {
        self.family
            .measurement_unit(component)
            .ok_or_else(|| Error::unsupported(component))
    }

    /// GATT key of the value characteristic backing `component`.
    pub fn read_profile(&self, component: &str) -> Result<GattProfile> {
        Ok(self.profile(component)?.read_profile())
    }

    /// Decode a raw payload for `component` using the family's codec.
    pub fn decode(&self, component: &str, data: &[u8]) -> Result<Decoded> {
        self.profile(component)?;
        Ok(self.family.decode(component, data)?)
    }

    fn profile(&self, component: &str) -> Result<&'static SensorProfile> {
        self.family
            .profile_for(component)
            .ok_or_else(|| Error::unsupported(component))
    }

    /// Whether the device link is up.
    pub async fn is_connected(&self) -> bool {
        self.state.read().await.connected
    }

    /// Whether a notification listener is registered.
    pub async fn is_listening(&self) -> bool {
        self.state.read().await.listener.is_some()
    }

    /// Open the device link.
    ///
    /// Components that still hold subscriptions from before a disconnect are
    /// re-subscribed at the transport. Their reference counts are left as
    /// they are. The first replay failure is returned after every component
    /// has been attempted.
    pub async fn connect(&self) -> Result<()> {
        let mut state = self.state.write().await;

        self.transport.connect(&self.address).await?;
        state.connected = true;
        info!("Connected to {} ({})", self.id, self.address);
        self.events.send(DeviceEvent::Connected {
            device: self.device_id(),
        });

        let active = state.subscriptions.active_components();
        if active.is_empty() {
            return Ok(());
        }

        if state.listener.is_none() {
            state.listener = Some(self.spawn_listener());
        }

        let mut first_error = None;
        for component in active {
            let profile = self.profile(&component)?;
            match self.enable_notifications(profile).await {
                Ok(()) => {
                    info!("Resubscribed {} on {}", component, self.id);
                    self.events.send(DeviceEvent::Resubscribed {
                        device: self.device_id(),
                        component,
                    });
                }
                Err(e) => {
                    warn!("Failed to resubscribe {} on {}: {}", component, self.id, e);
                    first_error.get_or_insert(e);
                }
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// Close the device link.
    ///
    /// Subscription counts survive so that the next [`connect`](Self::connect)
    /// can restore them.
    pub async fn disconnect(&self) -> Result<()> {
        let mut state = self.state.write().await;

        if let Some(listener) = state.listener.take() {
            listener.stop();
        }
        let was_connected = std::mem::replace(&mut state.connected, false);

        self.transport.disconnect(&self.address).await?;
        info!("Disconnected from {}", self.id);
        if was_connected {
            self.events.send(DeviceEvent::Disconnected {
                device: self.device_id(),
            });
        }
        Ok(())
    }

    /// Record a link loss reported by the transport.
    ///
    /// Unlike [`disconnect`](Self::disconnect) this issues no transport call.
    pub async fn mark_disconnected(&self) {
        let mut state = self.state.write().await;
        if let Some(listener) = state.listener.take() {
            listener.stop();
        }
        if std::mem::replace(&mut state.connected, false) {
            warn!("Link to {} lost", self.id);
            self.events.send(DeviceEvent::Disconnected {
                device: self.device_id(),
            });
        }
    }

    /// Read the current value of `component`.
    ///
    /// Components with a configuration characteristic are switched on first
    /// and given the configured settling delay before the value is read.
    /// The state lock is released while settling, so the connection is
    /// checked again before the value is read.
    pub async fn read(&self, component: &str) -> Result<Reading> {
        let profile = self.profile(component)?;

        if let Some(config) = profile.config_profile() {
            {
                let state = self.state.read().await;
                if !state.connected {
                    return Err(Error::not_connected(&self.id));
                }
                self.transport
                    .write(&self.address, &config, &SENSOR_ENABLE)
                    .await?;
            }
            tokio::time::sleep(self.config.settle_delay()).await;
        }

        let state = self.state.read().await;
        if !state.connected {
            return Err(Error::not_connected(&self.id));
        }
        let data = self
            .transport
            .read(&self.address, &profile.read_profile())
            .await?;
        drop(state);

        let decoded = self.family.decode(component, &data)?;
        debug!("{} {} = {} {}", self.id, component, decoded.value, decoded.unit);
        Ok(Reading::now(&self.id, component, &decoded))
    }

    /// Register interest in change notifications for `component`.
    ///
    /// Returns the reference count after the increment. Only the first
    /// subscriber triggers transport traffic; if that traffic fails the
    /// increment is rolled back.
    pub async fn subscribe(&self, component: &str) -> Result<u32> {
        let profile = self.profile(component)?;
        let mut state = self.state.write().await;
        if !state.connected {
            return Err(Error::not_connected(&self.id));
        }

        match state.subscriptions.acquire(component) {
            Transition::Activated => {
                // Listen before enabling so no early notification is missed.
                if state.listener.is_none() {
                    state.listener = Some(self.spawn_listener());
                }
                if let Err(e) = self.enable_notifications(profile).await {
                    state.subscriptions.rollback(component);
                    if !state.subscriptions.has_active() {
                        if let Some(listener) = state.listener.take() {
                            listener.stop();
                        }
                    }
                    warn!("Failed to subscribe {} on {}: {}", component, self.id, e);
                    return Err(e);
                }
                info!("Subscribed {} on {}", component, self.id);
            }
            transition => debug!("{} on {}: {:?}", component, self.id, transition),
        }

        Ok(state.subscriptions.count(component))
    }

    /// Drop one subscription to `component`.
    ///
    /// Returns the reference count after the decrement. The last subscriber
    /// disables notifications at the transport; a failure there is logged and
    /// the decrement stands.
    pub async fn unsubscribe(&self, component: &str) -> Result<u32> {
        let profile = self.profile(component)?;
        let mut state = self.state.write().await;

        let transition = state.subscriptions.release(component)?;
        if transition == Transition::Deactivated {
            if state.connected {
                if let Err(e) = self
                    .transport
                    .unsubscribe(&self.address, &profile.read_profile())
                    .await
                {
                    warn!("Failed to unsubscribe {} on {}: {}", component, self.id, e);
                }
            } else {
                debug!("{} is not connected, skipping transport unsubscribe", self.id);
            }

            if !state.subscriptions.has_other_active_subscription(component) {
                if let Some(listener) = state.listener.take() {
                    listener.stop();
                }
            }
            info!("Unsubscribed {} on {}", component, self.id);
        }

        Ok(state.subscriptions.count(component))
    }

    /// Current reference count for `component`.
    pub async fn subscription_count(&self, component: &str) -> u32 {
        self.state.read().await.subscriptions.count(component)
    }

    /// Whether any component other than `component` holds a subscription.
    pub async fn has_other_active_subscription(&self, component: &str) -> bool {
        self.state
            .read()
            .await
            .subscriptions
            .has_other_active_subscription(component)
    }

    /// Components with at least one subscriber, sorted by name.
    pub async fn active_subscriptions(&self) -> Vec<String> {
        self.state.read().await.subscriptions.active_components()
    }

    /// Most recent non-zero notification value for `component`.
    pub fn last_reading(&self, component: &str) -> Option<Reading> {
        self.router.last_reading(component)
    }

    /// Most recent notification value for every component that has one.
    pub fn last_readings(&self) -> Vec<Reading> {
        self.router.last_readings()
    }

    /// Subscribe to events published by this driver.
    pub fn events(&self) -> EventReceiver {
        self.events.subscribe()
    }

    fn spawn_listener(&self) -> ListenerHandle {
        debug!("{}: registering notification listener", self.id);
        ListenerHandle::spawn(Arc::clone(&self.router), self.transport.notifications())
    }

    async fn enable_notifications(&self, profile: &SensorProfile) -> Result<()> {
        if let Some(config) = profile.config_profile() {
            self.transport
                .write(&self.address, &config, &SENSOR_ENABLE)
                .await?;
        }
        if let Some(frequency) = profile.frequency_profile() {
            self.transport
                .write(&self.address, &frequency, &[self.config.notification_period])
                .await?;
        }
        self.transport
            .subscribe(&self.address, &profile.read_profile())
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::mock::{MockTransport, TransportCall};
    use crate::transport::TransportOp;
    use sensorlink_types::components::{
        BATTERY_LEVEL, HUMIDITY, PRESENCE, TEMPERATURE,
    };
    use sensorlink_types::uuids;

    const ADDRESS: &str = "AA:BB:CC:DD:EE:01";
    const OTHER_ADDRESS: &str = "AA:BB:CC:DD:EE:02";

    fn presence() -> GattProfile {
        GattProfile::new(uuids::MODOSMART_ENVIRONMENT_SERVICE, uuids::MODOSMART_PRESENCE)
    }

    fn driver(family: DeviceFamily) -> (Arc<MockTransport>, SensorDriver) {
        let transport = Arc::new(MockTransport::new());
        let driver = SensorDriver::new(
            "ble_AABBCCDDEE01",
            ADDRESS,
            family,
            transport.clone(),
            EventDispatcher::default(),
            DriverConfig::default(),
        );
        (transport, driver)
    }

    async fn connected(family: DeviceFamily) -> (Arc<MockTransport>, SensorDriver) {
        let (transport, driver) = driver(family);
        driver.connect().await.unwrap();
        transport.clear_calls();
        (transport, driver)
    }

    async fn next_reading(rx: &mut EventReceiver) -> Reading {
        loop {
            let event = tokio::time::timeout(Duration::from_secs(1), rx.recv())
                .await
                .expect("timed out waiting for event")
                .unwrap();
            if let Some(reading) = event.reading() {
                return reading.clone();
            }
        }
    }

    #[tokio::test]
    async fn test_read_without_activation() {
        let (transport, driver) = connected(DeviceFamily::ModosmartRoomSensor).await;
        transport.set_value(
            GattProfile::new(uuids::BATTERY_SERVICE, uuids::BATTERY_LEVEL),
            vec![0x55],
        );

        let reading = driver.read(BATTERY_LEVEL).await.unwrap();
        assert_eq!(reading.value, "85");
        assert_eq!(reading.device_id, "ble_AABBCCDDEE01");
        assert_eq!(transport.count(TransportOp::Write), 0);
        assert_eq!(transport.count(TransportOp::Read), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_read_activates_and_settles() {
        let (transport, driver) = connected(DeviceFamily::SensorTag).await;
        transport.set_value(
            GattProfile::new(
                uuids::SENSORTAG_TEMPERATURE_SERVICE,
                uuids::SENSORTAG_TEMPERATURE_DATA,
            ),
            vec![0x00, 0x00, 0x00, 0x0D],
        );

        let started = tokio::time::Instant::now();
        let reading = driver.read(TEMPERATURE).await.unwrap();
        assert!(started.elapsed() >= Duration::from_millis(1010));
        assert_eq!(reading.value, "26.0");
        assert_eq!(reading.unit, "Degree celsius (°C)");

        let calls = transport.calls();
        assert_eq!(
            calls[0],
            TransportCall::Write {
                address: ADDRESS.into(),
                profile: GattProfile::new(
                    uuids::SENSORTAG_TEMPERATURE_SERVICE,
                    uuids::SENSORTAG_TEMPERATURE_CONFIG,
                ),
                payload: SENSOR_ENABLE.to_vec(),
            }
        );
        assert_eq!(calls[1].op(), TransportOp::Read);
    }

    #[tokio::test(start_paused = true)]
    async fn test_read_latency_adds_to_settle_delay() {
        let (transport, driver) = connected(DeviceFamily::SensorTag).await;
        transport.set_value(
            GattProfile::new(uuids::SENSORTAG_HUMIDITY_SERVICE, uuids::SENSORTAG_HUMIDITY_DATA),
            vec![0x00, 0x00, 0x00, 0x80],
        );
        transport.set_read_latency(Duration::from_millis(200));

        let started = tokio::time::Instant::now();
        let reading = driver.read(HUMIDITY).await.unwrap();
        assert!(started.elapsed() >= Duration::from_millis(1210));
        assert_eq!(reading.value, "50.0");
    }

    #[tokio::test(start_paused = true)]
    async fn test_settle_delay_does_not_block_writers() {
        let (transport, driver) = connected(DeviceFamily::SensorTag).await;
        transport.set_value(
            GattProfile::new(
                uuids::SENSORTAG_TEMPERATURE_SERVICE,
                uuids::SENSORTAG_TEMPERATURE_DATA,
            ),
            vec![0x00, 0x00, 0x80, 0x0C],
        );
        let driver = Arc::new(driver);

        let reader = {
            let driver = Arc::clone(&driver);
            tokio::spawn(async move { driver.read(TEMPERATURE).await })
        };
        while transport.count(TransportOp::Write) == 0 {
            tokio::task::yield_now().await;
        }

        // The reader is settling; a subscribe must not wait for it.
        let started = tokio::time::Instant::now();
        driver.subscribe(HUMIDITY).await.unwrap();
        assert!(started.elapsed() < Duration::from_millis(1010));

        driver.mark_disconnected().await;
        let err = reader.await.unwrap().unwrap_err();
        assert!(matches!(err, Error::NotConnected { .. }));
        assert_eq!(transport.count(TransportOp::Read), 0);
    }

    #[tokio::test]
    async fn test_read_unsupported_component() {
        let (transport, driver) = connected(DeviceFamily::ModosmartTest).await;
        let err = driver.read(HUMIDITY).await.unwrap_err();
        assert!(matches!(err, Error::UnsupportedComponent { ref component } if component == HUMIDITY));
        assert!(transport.calls().is_empty());
    }

    #[tokio::test]
    async fn test_read_not_connected() {
        let (transport, driver) = driver(DeviceFamily::ModosmartRoomSensor);
        let err = driver.read(PRESENCE).await.unwrap_err();
        assert!(matches!(err, Error::NotConnected { .. }));
        assert!(transport.calls().is_empty());
    }

    #[tokio::test]
    async fn test_read_transport_failure() {
        let (transport, driver) = connected(DeviceFamily::ModosmartRoomSensor).await;
        transport.fail(TransportOp::Read, "timeout");
        let err = driver.read(PRESENCE).await.unwrap_err();
        assert!(err.is_transport());
    }

    #[tokio::test]
    async fn test_read_short_payload() {
        let (transport, driver) = connected(DeviceFamily::ModosmartRoomSensor).await;
        transport.set_value(presence(), vec![0x01]);
        let err = driver.read(PRESENCE).await.unwrap_err();
        assert!(matches!(err, Error::Decode(_)));
    }

    #[tokio::test]
    async fn test_subscribe_only_first_hits_transport() {
        let (transport, driver) = connected(DeviceFamily::ModosmartRoomSensor).await;

        assert_eq!(driver.subscribe(PRESENCE).await.unwrap(), 1);
        assert_eq!(driver.subscribe(PRESENCE).await.unwrap(), 2);
        assert_eq!(driver.subscribe(PRESENCE).await.unwrap(), 3);

        assert_eq!(transport.count_for(TransportOp::Subscribe, &presence()), 1);
        assert_eq!(driver.subscription_count(PRESENCE).await, 3);
        assert!(driver.is_listening().await);
    }

    #[tokio::test]
    async fn test_subscribe_writes_enable_and_period() {
        let (transport, driver) = connected(DeviceFamily::SensorTag).await;
        driver.subscribe(HUMIDITY).await.unwrap();

        let calls = transport.calls();
        assert_eq!(calls.len(), 3);
        assert_eq!(
            calls[0],
            TransportCall::Write {
                address: ADDRESS.into(),
                profile: GattProfile::new(
                    uuids::SENSORTAG_HUMIDITY_SERVICE,
                    uuids::SENSORTAG_HUMIDITY_CONFIG,
                ),
                payload: vec![0x01],
            }
        );
        assert_eq!(
            calls[1],
            TransportCall::Write {
                address: ADDRESS.into(),
                profile: GattProfile::new(
                    uuids::SENSORTAG_HUMIDITY_SERVICE,
                    uuids::SENSORTAG_HUMIDITY_PERIOD,
                ),
                payload: vec![100],
            }
        );
        assert_eq!(
            calls[2],
            TransportCall::Subscribe {
                address: ADDRESS.into(),
                profile: GattProfile::new(
                    uuids::SENSORTAG_HUMIDITY_SERVICE,
                    uuids::SENSORTAG_HUMIDITY_DATA,
                ),
            }
        );
    }

    #[tokio::test]
    async fn test_subscribe_failure_rolls_back() {
        let (transport, driver) = connected(DeviceFamily::ModosmartRoomSensor).await;
        transport.fail_times(TransportOp::Subscribe, 1, "gatt busy");

        let err = driver.subscribe(PRESENCE).await.unwrap_err();
        assert!(err.is_transport());
        assert_eq!(driver.subscription_count(PRESENCE).await, 0);
        assert!(!driver.is_listening().await);

        // A retry starts again from zero.
        assert_eq!(driver.subscribe(PRESENCE).await.unwrap(), 1);
        assert_eq!(transport.count_for(TransportOp::Subscribe, &presence()), 2);
    }

    #[tokio::test]
    async fn test_subscribe_failure_keeps_shared_listener() {
        let (transport, driver) = connected(DeviceFamily::ModosmartRoomSensor).await;
        driver.subscribe(PRESENCE).await.unwrap();

        transport.fail(TransportOp::Subscribe, "gatt busy");
        assert!(driver.subscribe(TEMPERATURE).await.is_err());
        assert!(driver.is_listening().await);
        assert_eq!(driver.subscription_count(PRESENCE).await, 1);
    }

    #[tokio::test]
    async fn test_subscribe_unsupported_and_not_connected() {
        let (transport, driver) = driver(DeviceFamily::ModosmartTest);

        let err = driver.subscribe(PRESENCE).await.unwrap_err();
        assert!(matches!(err, Error::UnsupportedComponent { .. }));

        let err = driver.subscribe(TEMPERATURE).await.unwrap_err();
        assert!(matches!(err, Error::NotConnected { .. }));
        assert_eq!(driver.subscription_count(TEMPERATURE).await, 0);
        assert!(transport.calls().is_empty());
    }

    #[tokio::test]
    async fn test_unsubscribe_without_subscribe() {
        let (transport, driver) = connected(DeviceFamily::ModosmartRoomSensor).await;
        let err = driver.unsubscribe(PRESENCE).await.unwrap_err();
        assert!(matches!(err, Error::RefcountViolation { .. }));
        assert_eq!(driver.subscription_count(PRESENCE).await, 0);
        assert!(transport.calls().is_empty());
    }

    #[tokio::test]
    async fn test_unsubscribe_only_last_hits_transport() {
        let (transport, driver) = connected(DeviceFamily::ModosmartRoomSensor).await;
        driver.subscribe(PRESENCE).await.unwrap();
        driver.subscribe(PRESENCE).await.unwrap();

        assert_eq!(driver.unsubscribe(PRESENCE).await.unwrap(), 1);
        assert_eq!(transport.count(TransportOp::Unsubscribe), 0);
        assert!(driver.is_listening().await);

        assert_eq!(driver.unsubscribe(PRESENCE).await.unwrap(), 0);
        assert_eq!(transport.count_for(TransportOp::Unsubscribe, &presence()), 1);
        assert!(!driver.is_listening().await);
    }

    #[tokio::test]
    async fn test_unsubscribe_transport_failure_still_decrements() {
        let (transport, driver) = connected(DeviceFamily::ModosmartRoomSensor).await;
        driver.subscribe(PRESENCE).await.unwrap();
        transport.fail(TransportOp::Unsubscribe, "link lost");

        assert_eq!(driver.unsubscribe(PRESENCE).await.unwrap(), 0);
        assert!(!driver.is_listening().await);
    }

    #[tokio::test]
    async fn test_listener_shared_across_components() {
        let (_transport, driver) = connected(DeviceFamily::ModosmartRoomSensor).await;
        driver.subscribe(PRESENCE).await.unwrap();
        driver.subscribe(TEMPERATURE).await.unwrap();

        assert!(driver.has_other_active_subscription(PRESENCE).await);
        driver.unsubscribe(PRESENCE).await.unwrap();
        assert!(driver.is_listening().await);
        assert!(!driver.has_other_active_subscription(TEMPERATURE).await);

        driver.unsubscribe(TEMPERATURE).await.unwrap();
        assert!(!driver.is_listening().await);
        assert!(driver.active_subscriptions().await.is_empty());
    }

    #[tokio::test]
    async fn test_notification_becomes_reading() {
        let (transport, driver) = connected(DeviceFamily::ModosmartRoomSensor).await;
        let mut rx = driver.events();
        driver.subscribe(PRESENCE).await.unwrap();

        transport.emit(ADDRESS, presence(), vec![0x03, 0x00]);
        let reading = next_reading(&mut rx).await;
        assert_eq!(reading.component, PRESENCE);
        assert_eq!(reading.value, "3");
        assert_eq!(driver.last_reading(PRESENCE).unwrap().value, "3");
    }

    #[tokio::test]
    async fn test_zero_and_foreign_notifications_ignored() {
        let (transport, driver) = connected(DeviceFamily::ModosmartRoomSensor).await;
        let mut rx = driver.events();
        driver.subscribe(PRESENCE).await.unwrap();

        transport.emit(ADDRESS, presence(), vec![0x00, 0x00]);
        transport.emit(OTHER_ADDRESS, presence(), vec![0x09, 0x00]);
        transport.emit(ADDRESS, presence(), vec![0x01, 0x00]);

        let reading = next_reading(&mut rx).await;
        assert_eq!(reading.value, "1");
        assert_eq!(driver.last_readings().len(), 1);
    }

    #[tokio::test]
    async fn test_unsubscribe_while_disconnected() {
        let (transport, driver) = connected(DeviceFamily::ModosmartRoomSensor).await;
        driver.subscribe(PRESENCE).await.unwrap();
        driver.disconnect().await.unwrap();
        transport.clear_calls();

        assert_eq!(driver.unsubscribe(PRESENCE).await.unwrap(), 0);
        assert_eq!(transport.count(TransportOp::Unsubscribe), 0);
    }

    #[tokio::test]
    async fn test_reconnect_replays_subscriptions() {
        let (transport, driver) = connected(DeviceFamily::SensorTag).await;
        driver.subscribe(TEMPERATURE).await.unwrap();
        driver.subscribe(TEMPERATURE).await.unwrap();
        driver.subscribe(HUMIDITY).await.unwrap();

        driver.mark_disconnected().await;
        assert!(!driver.is_connected().await);
        assert!(!driver.is_listening().await);
        assert_eq!(driver.subscription_count(TEMPERATURE).await, 2);

        let mut rx = driver.events();
        transport.clear_calls();
        driver.connect().await.unwrap();

        assert_eq!(transport.count(TransportOp::Subscribe), 2);
        assert_eq!(transport.count(TransportOp::Write), 4);
        assert_eq!(driver.subscription_count(TEMPERATURE).await, 2);
        assert_eq!(driver.subscription_count(HUMIDITY).await, 1);
        assert!(driver.is_listening().await);

        let mut resubscribed = Vec::new();
        while let Ok(event) = rx.try_recv() {
            if let DeviceEvent::Resubscribed { component, .. } = event {
                resubscribed.push(component);
            }
        }
        assert_eq!(resubscribed, vec![HUMIDITY.to_string(), TEMPERATURE.to_string()]);
    }

    #[tokio::test]
    async fn test_reconnect_replay_failure_keeps_counts() {
        let (transport, driver) = connected(DeviceFamily::SensorTag).await;
        driver.subscribe(TEMPERATURE).await.unwrap();
        driver.subscribe(HUMIDITY).await.unwrap();
        driver.mark_disconnected().await;

        let mut rx = driver.events();
        transport.clear_calls();
        transport.fail_times(TransportOp::Subscribe, 1, "gatt busy");

        let err = driver.connect().await.unwrap_err();
        assert!(matches!(err, Error::Transport(_)));

        // Humidity is replayed first and fails; Temperature is still attempted.
        assert_eq!(transport.count(TransportOp::Subscribe), 2);
        assert_eq!(driver.subscription_count(TEMPERATURE).await, 1);
        assert_eq!(driver.subscription_count(HUMIDITY).await, 1);
        assert!(driver.is_connected().await);
        assert!(driver.is_listening().await);

        let mut resubscribed = Vec::new();
        while let Ok(event) = rx.try_recv() {
            if let DeviceEvent::Resubscribed { component, .. } = event {
                resubscribed.push(component);
            }
        }
        assert_eq!(resubscribed, vec![TEMPERATURE.to_string()]);
    }

    #[tokio::test]
    async fn test_connect_failure() {
        let (transport, driver) = driver(DeviceFamily::ModosmartTest);
        transport.fail(TransportOp::Connect, "out of range");
        assert!(driver.connect().await.is_err());
        assert!(!driver.is_connected().await);
    }

    #[tokio::test]
    async fn test_concurrent_subscribes_issue_one_transport_call() {
        let (transport, driver) = connected(DeviceFamily::ModosmartRoomSensor).await;
        let driver = Arc::new(driver);

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let driver = Arc::clone(&driver);
                tokio::spawn(async move { driver.subscribe(PRESENCE).await })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        assert_eq!(driver.subscription_count(PRESENCE).await, 16);
        assert_eq!(transport.count(TransportOp::Subscribe), 1);
    }

    #[test]
    fn test_static_queries() {
        let (_transport, driver) = driver(DeviceFamily::SensorTag);
        assert!(driver.is_supported(TEMPERATURE));
        assert!(!driver.is_supported(PRESENCE));
        assert_eq!(driver.components().len(), 7);
        assert!(driver.read_profile(PRESENCE).is_err());
        assert_eq!(driver.measurement_unit(HUMIDITY).unwrap(), "Relative humidity (%RH)");
        assert!(matches!(
            driver.decode(TEMPERATURE, &[]).unwrap_err(),
            Error::Decode(_)
        ));
    }

    #[test]
    fn test_debug_and_name() {
        let (_transport, driver) = driver(DeviceFamily::SensorTag);
        let driver = driver.with_name("SensorTag");
        assert_eq!(driver.name(), Some("SensorTag"));
        assert!(format!("{:?}", driver).contains("SensorDriver"));
    }
}
