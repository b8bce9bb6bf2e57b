//! GATT UUIDs for the supported sensor families.
//!
//! Each family exposes its sensors through a service UUID and a value
//! characteristic. TI SensorTag sensors additionally carry a configuration
//! characteristic (sensor on/off) and a period characteristic (notification
//! frequency).

use uuid::{Uuid, uuid};

// --- TI SensorTag ---

/// IR temperature service.
pub const SENSORTAG_TEMPERATURE_SERVICE: Uuid = uuid!("f000aa00-0451-4000-b000-000000000000");
/// IR temperature data.
pub const SENSORTAG_TEMPERATURE_DATA: Uuid = uuid!("f000aa01-0451-4000-b000-000000000000");
/// IR temperature configuration.
pub const SENSORTAG_TEMPERATURE_CONFIG: Uuid = uuid!("f000aa02-0451-4000-b000-000000000000");
/// IR temperature period.
pub const SENSORTAG_TEMPERATURE_PERIOD: Uuid = uuid!("f000aa03-0451-4000-b000-000000000000");

/// Accelerometer service.
pub const SENSORTAG_ACCELEROMETER_SERVICE: Uuid = uuid!("f000aa10-0451-4000-b000-000000000000");
/// Accelerometer data.
pub const SENSORTAG_ACCELEROMETER_DATA: Uuid = uuid!("f000aa11-0451-4000-b000-000000000000");
/// Accelerometer configuration.
pub const SENSORTAG_ACCELEROMETER_CONFIG: Uuid = uuid!("f000aa12-0451-4000-b000-000000000000");
/// Accelerometer period.
pub const SENSORTAG_ACCELEROMETER_PERIOD: Uuid = uuid!("f000aa13-0451-4000-b000-000000000000");

/// Humidity service.
pub const SENSORTAG_HUMIDITY_SERVICE: Uuid = uuid!("f000aa20-0451-4000-b000-000000000000");
/// Humidity data.
pub const SENSORTAG_HUMIDITY_DATA: Uuid = uuid!("f000aa21-0451-4000-b000-000000000000");
/// Humidity configuration.
pub const SENSORTAG_HUMIDITY_CONFIG: Uuid = uuid!("f000aa22-0451-4000-b000-000000000000");
/// Humidity period.
pub const SENSORTAG_HUMIDITY_PERIOD: Uuid = uuid!("f000aa23-0451-4000-b000-000000000000");

/// Magnetometer service.
pub const SENSORTAG_MAGNETOMETER_SERVICE: Uuid = uuid!("f000aa30-0451-4000-b000-000000000000");
/// Magnetometer data.
pub const SENSORTAG_MAGNETOMETER_DATA: Uuid = uuid!("f000aa31-0451-4000-b000-000000000000");
/// Magnetometer configuration.
pub const SENSORTAG_MAGNETOMETER_CONFIG: Uuid = uuid!("f000aa32-0451-4000-b000-000000000000");
/// Magnetometer period.
pub const SENSORTAG_MAGNETOMETER_PERIOD: Uuid = uuid!("f000aa33-0451-4000-b000-000000000000");

/// Barometric pressure service.
pub const SENSORTAG_PRESSURE_SERVICE: Uuid = uuid!("f000aa40-0451-4000-b000-000000000000");
/// Barometric pressure data.
pub const SENSORTAG_PRESSURE_DATA: Uuid = uuid!("f000aa41-0451-4000-b000-000000000000");
/// Barometric pressure configuration.
pub const SENSORTAG_PRESSURE_CONFIG: Uuid = uuid!("f000aa42-0451-4000-b000-000000000000");
/// Barometric pressure period.
pub const SENSORTAG_PRESSURE_PERIOD: Uuid = uuid!("f000aa43-0451-4000-b000-000000000000");

/// Gyroscope service.
pub const SENSORTAG_GYROSCOPE_SERVICE: Uuid = uuid!("f000aa50-0451-4000-b000-000000000000");
/// Gyroscope data.
pub const SENSORTAG_GYROSCOPE_DATA: Uuid = uuid!("f000aa51-0451-4000-b000-000000000000");
/// Gyroscope configuration.
pub const SENSORTAG_GYROSCOPE_CONFIG: Uuid = uuid!("f000aa52-0451-4000-b000-000000000000");
/// Gyroscope period.
pub const SENSORTAG_GYROSCOPE_PERIOD: Uuid = uuid!("f000aa53-0451-4000-b000-000000000000");

/// Optical (luxometer) service.
pub const SENSORTAG_OPTICAL_SERVICE: Uuid = uuid!("f000aa70-0451-4000-b000-000000000000");
/// Optical data.
pub const SENSORTAG_OPTICAL_DATA: Uuid = uuid!("f000aa71-0451-4000-b000-000000000000");
/// Optical configuration.
pub const SENSORTAG_OPTICAL_CONFIG: Uuid = uuid!("f000aa72-0451-4000-b000-000000000000");
/// Optical period.
pub const SENSORTAG_OPTICAL_PERIOD: Uuid = uuid!("f000aa73-0451-4000-b000-000000000000");

// --- Modosmart ---

/// Modosmart room sensor environment service.
pub const MODOSMART_ENVIRONMENT_SERVICE: Uuid = uuid!("0000a000-0000-1000-8000-00805f9b34fb");

/// Presence counter characteristic.
pub const MODOSMART_PRESENCE: Uuid = uuid!("0000a001-0000-1000-8000-00805f9b34fb");

/// Modosmart test board service.
pub const MODOSMART_TEST_SERVICE: Uuid = uuid!("000000ff-0000-1000-8000-00805f9b34fb");

/// Modosmart test board temperature characteristic.
pub const MODOSMART_TEST_TEMPERATURE: Uuid = uuid!("0000ff01-0000-1000-8000-00805f9b34fb");

// --- Standard BLE Service UUIDs ---

/// Device Information service.
pub const DEVICE_INFO_SERVICE: Uuid = uuid!("0000180a-0000-1000-8000-00805f9b34fb");

/// Battery service.
pub const BATTERY_SERVICE: Uuid = uuid!("0000180f-0000-1000-8000-00805f9b34fb");

// --- Standard BLE Characteristic UUIDs ---

/// Battery level characteristic.
pub const BATTERY_LEVEL: Uuid = uuid!("00002a19-0000-1000-8000-00805f9b34fb");

/// Firmware revision string characteristic.
pub const FIRMWARE_REVISION: Uuid = uuid!("00002a26-0000-1000-8000-00805f9b34fb");

/// Environmental sensing temperature characteristic.
pub const TEMPERATURE: Uuid = uuid!("00002a6e-0000-1000-8000-00805f9b34fb");

/// Environmental sensing humidity characteristic.
pub const HUMIDITY: Uuid = uuid!("00002a6f-0000-1000-8000-00805f9b34fb");
