//! Multi-device management.
//!
//! The [`DeviceManager`] is a keyed store of [`SensorDriver`]s sharing one
//! transport and one event bus. Callers address devices by id; the manager
//! looks the driver up and forwards the call.

use std::collections::HashMap;
use std::sync::Arc;

use futures::future::join_all;
use serde::Serialize;
use tokio::sync::RwLock;
use tracing::{info, warn};

use sensorlink_types::{DeviceFamily, Reading};

use crate::config::Config;
use crate::driver::SensorDriver;
use crate::error::{Error, Result};
use crate::events::EventDispatcher;
use crate::transport::Transport;

/// What is known about a device before it is created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceDefinition {
    /// Device address on the transport, e.g. `B0:B4:48:C9:8F:02`.
    pub address: String,
    /// Advertised name, used to pick the device family.
    pub name: String,
}

impl DeviceDefinition {
    /// Create a definition.
    pub fn new(address: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            name: name.into(),
        }
    }
}

/// Summary of a managed device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceOverview {
    /// Device identifier.
    pub id: String,
    /// Device address.
    pub address: String,
    /// Advertised name.
    pub name: Option<String>,
    /// Family type name, e.g. `TI_SENSOR_TAG`.
    pub device_type: String,
    /// Whether the link is up.
    pub connected: bool,
    /// Components with at least one subscriber.
    pub subscriptions: Vec<String>,
}

/// Derive the device id for a transport address.
///
/// ```
/// assert_eq!(
///     sensorlink_core::device_id_for("B0:B4:48:C9:8F:02"),
///     "ble_B0B448C98F02"
/// );
/// ```
pub fn device_id_for(address: &str) -> String {
    format!("ble_{}", address.replace(':', ""))
}

/// Manager for multiple sensor devices.
pub struct DeviceManager {
    /// Map of device ID to driver.
    devices: RwLock<HashMap<String, Arc<SensorDriver>>>,
    transport: Arc<dyn Transport>,
    events: EventDispatcher,
    config: Config,
}

impl std::fmt::Debug for DeviceManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeviceManager")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl DeviceManager {
    /// Create a manager with default configuration.
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        let config = Config::default();
        Self {
            devices: RwLock::new(HashMap::new()),
            transport,
            events: EventDispatcher::new(config.events.capacity),
            config,
        }
    }

    /// Create a manager with validated configuration.
    pub fn with_config(transport: Arc<dyn Transport>, config: Config) -> Result<Self> {
        config
            .validate()
            .map_err(|e| Error::InvalidConfig(e.to_string()))?;
        Ok(Self {
            devices: RwLock::new(HashMap::new()),
            transport,
            events: EventDispatcher::new(config.events.capacity),
            config,
        })
    }

    /// Get the event dispatcher for subscribing to events.
    pub fn events(&self) -> &EventDispatcher {
        &self.events
    }

    /// Get the manager configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Create and connect a device, returning its id.
    ///
    /// Creating a device that already exists reconnects it if needed and
    /// returns the existing id. New devices are connected while the device
    /// map is write-locked, so concurrent creates of one address connect once.
    pub async fn create(&self, definition: &DeviceDefinition) -> Result<String> {
        let id = device_id_for(&definition.address);

        let existing = self.devices.read().await.get(&id).cloned();
        if let Some(driver) = existing {
            Self::ensure_connected(&driver).await?;
            return Ok(id);
        }

        let family = DeviceFamily::from_name(&definition.name)
            .ok_or_else(|| Error::UnsupportedDevice(definition.name.clone()))?;

        let mut devices = self.devices.write().await;
        // Registered by a concurrent create while we waited for the lock.
        if let Some(driver) = devices.get(&id).cloned() {
            drop(devices);
            Self::ensure_connected(&driver).await?;
            return Ok(id);
        }

        let driver = Arc::new(
            SensorDriver::new(
                id.clone(),
                definition.address.clone(),
                family,
                Arc::clone(&self.transport),
                self.events.clone(),
                self.config.driver.clone(),
            )
            .with_name(definition.name.clone()),
        );
        driver.connect().await?;
        devices.insert(id.clone(), driver);
        info!("Created {} {} at {}", family, id, definition.address);
        Ok(id)
    }

    async fn ensure_connected(driver: &SensorDriver) -> Result<()> {
        if !driver.is_connected().await {
            driver.connect().await?;
        }
        Ok(())
    }

    /// Look up a driver by id.
    pub async fn get(&self, id: &str) -> Result<Arc<SensorDriver>> {
        self.devices
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or_else(|| Error::device_not_found(id))
    }

    /// Remove a device, disconnecting it first.
    ///
    /// The device is forgotten even when the disconnect fails.
    pub async fn remove(&self, id: &str) -> Result<()> {
        let driver = self
            .devices
            .write()
            .await
            .remove(id)
            .ok_or_else(|| Error::device_not_found(id))?;
        if let Err(e) = driver.disconnect().await {
            warn!("Failed to disconnect {} while removing it: {}", id, e);
        }
        info!("Removed {}", id);
        Ok(())
    }

    /// All device ids, sorted.
    pub async fn device_ids(&self) -> Vec<String> {
        let mut ids: Vec<_> = self.devices.read().await.keys().cloned().collect();
        ids.sort();
        ids
    }

    /// Number of managed devices.
    pub async fn device_count(&self) -> usize {
        self.devices.read().await.len()
    }

    /// Overview of every managed device, sorted by id.
    pub async fn devices(&self) -> Vec<DeviceOverview> {
        let drivers: Vec<Arc<SensorDriver>> =
            self.devices.read().await.values().cloned().collect();

        let mut overviews = Vec::with_capacity(drivers.len());
        for driver in drivers {
            overviews.push(DeviceOverview {
                id: driver.id().to_string(),
                address: driver.address().to_string(),
                name: driver.name().map(str::to_string),
                device_type: driver.family().type_name().to_string(),
                connected: driver.is_connected().await,
                subscriptions: driver.active_subscriptions().await,
            });
        }
        overviews.sort_by(|a, b| a.id.cmp(&b.id));
        overviews
    }

    /// Read `component` on device `id`.
    pub async fn read(&self, id: &str, component: &str) -> Result<Reading> {
        self.get(id).await?.read(component).await
    }

    /// Subscribe to `component` on device `id`.
    pub async fn subscribe(&self, id: &str, component: &str) -> Result<u32> {
        self.get(id).await?.subscribe(component).await
    }

    /// Unsubscribe from `component` on device `id`.
    pub async fn unsubscribe(&self, id: &str, component: &str) -> Result<u32> {
        self.get(id).await?.unsubscribe(component).await
    }

    /// Last notified value of `component` on device `id`.
    pub async fn last_reading(&self, id: &str, component: &str) -> Result<Option<Reading>> {
        Ok(self.get(id).await?.last_reading(component))
    }

    /// Record a link loss on device `id`.
    pub async fn mark_disconnected(&self, id: &str) -> Result<()> {
        self.get(id).await?.mark_disconnected().await;
        Ok(())
    }

    /// Disconnect every device (in parallel). Devices stay registered.
    ///
    /// Returns a map of device IDs to disconnection results.
    pub async fn disconnect_all(&self) -> HashMap<String, Result<()>> {
        let drivers: Vec<Arc<SensorDriver>> =
            self.devices.read().await.values().cloned().collect();

        let futures = drivers.into_iter().map(|driver| async move {
            let result = driver.disconnect().await;
            (driver.id().to_string(), result)
        });

        join_all(futures).await.into_iter().collect()
    }
}
