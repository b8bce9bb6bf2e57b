//! Platform-agnostic GATT profiles and reading codecs for BLE sensors.
//!
//! This crate holds everything about sensor peripherals that does not need a
//! radio: which components each device family exposes, which GATT service and
//! characteristics back them, and how their raw payloads decode into
//! physical values. It is shared by the async driver layer in
//! `sensorlink-core` and by anything that only needs to interpret bytes.
//!
//! # Supported Families
//!
//! | Family | Components |
//! |--------|------------|
//! | TI SensorTag | Temperature, Humidity, Pressure, Optical, Accelerometer, Magnetometer, Gyroscope |
//! | Modosmart Room Sensor | Presence, Temperature, Humidity, Battery Level, Firmware Revision |
//! | Modosmart Test | Temperature |
//!
//! # Example
//!
//! ```
//! use sensorlink_types::DeviceFamily;
//!
//! let family = DeviceFamily::from_name("MODOSMART_ROOM_SENSOR").unwrap();
//! let decoded = family.decode("Battery Level", &[0x64]).unwrap();
//! assert_eq!(decoded.value.to_string(), "100");
//! ```

pub mod codec;
pub mod error;
pub mod family;
pub mod profile;
pub mod reading;
pub mod uuid;

pub use codec::{Decoded, ReadingValue};
pub use error::{DecodeError, DecodeResult};
pub use family::{DeviceFamily, components};
pub use profile::{Component, GattProfile, ProfileRegistry, SensorProfile};
pub use reading::{Reading, now_millis};
pub use self::uuid as uuids;
