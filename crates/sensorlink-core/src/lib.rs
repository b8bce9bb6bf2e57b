//! Shared-subscription driver layer for BLE sensor peripherals.
//!
//! This crate sits between callers that want sensor values and a BLE
//! transport that moves bytes. It owns the per-device state that makes
//! concurrent subscribers safe to share one GATT notification stream.
//!
//! # Features
//!
//! - **Reference-counted subscriptions**: Only the first subscriber enables
//!   notifications at the transport and only the last one disables them
//! - **Notification routing**: Raw notifications are mapped back to
//!   components, decoded, cached and published as events
//! - **Sensor activation**: SensorTag-style sensors are switched on before
//!   reads and subscriptions
//! - **Reconnect replay**: Live subscriptions are re-established after a
//!   reconnect
//! - **Multi-device support**: Manage many peripherals over one transport
//!
//! # Supported Devices
//!
//! | Device | Components |
//! |--------|------------|
//! | TI SensorTag | Temperature, Humidity, Pressure, Optical, Accelerometer, Magnetometer, Gyroscope |
//! | Modosmart room sensor | Presence, Temperature, Humidity, Battery Level, Firmware Revision |
//! | Modosmart test board | Temperature |
//!
//! # Quick Start
//!
//! ```
//! use std::sync::Arc;
//!
//! use sensorlink_core::{DeviceDefinition, DeviceManager, MockTransport};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), sensorlink_core::Error> {
//! let transport = Arc::new(MockTransport::new());
//! let manager = DeviceManager::new(transport);
//!
//! let id = manager
//!     .create(&DeviceDefinition::new("B0:B4:48:C9:8F:02", "MODOSMART_ROOM_SENSOR"))
//!     .await?;
//!
//! let count = manager.subscribe(&id, "Presence").await?;
//! assert_eq!(count, 1);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod driver;
pub mod error;
pub mod events;
pub mod manager;
pub mod mock;
pub mod router;
pub mod tracker;
pub mod transport;

pub use sensorlink_types as types;
pub use sensorlink_types::{DeviceFamily, Reading, components};

pub use config::{Config, ConfigError, DriverConfig, EventsConfig};
pub use driver::{SENSOR_ENABLE, SensorDriver};
pub use error::{Error, Result};
pub use events::{DeviceEvent, DeviceId, EventDispatcher, EventReceiver, EventSender};
pub use manager::{DeviceDefinition, DeviceManager, DeviceOverview, device_id_for};
pub use mock::{MockTransport, TransportCall};
pub use router::{ListenerHandle, NotificationRouter};
pub use tracker::{SubscriptionTracker, Transition};
pub use transport::{RawNotification, Transport, TransportError, TransportOp, TransportResult};
