//! Device families and their component tables.
//!
//! Every supported peripheral belongs to one [`DeviceFamily`]. The family
//! decides which components exist, which GATT characteristics back them,
//! which unit they report in and how their payloads are decoded.

use core::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::codec::{Decoded, decode_modosmart, decode_sensortag};
use crate::error::{DecodeError, DecodeResult};
use crate::profile::{Component, GattProfile, ProfileRegistry, SensorProfile};
use crate::uuid as gatt;

/// Component names shared across families.
pub mod components {
    /// Temperature.
    pub const TEMPERATURE: &str = "Temperature";
    /// Relative humidity.
    pub const HUMIDITY: &str = "Humidity";
    /// Barometric pressure.
    pub const PRESSURE: &str = "Pressure";
    /// Light intensity.
    pub const OPTICAL: &str = "Optical";
    /// Accelerometer.
    pub const ACCELEROMETER: &str = "Accelerometer";
    /// Magnetometer.
    pub const MAGNETOMETER: &str = "Magnetometer";
    /// Gyroscope.
    pub const GYROSCOPE: &str = "Gyroscope";
    /// Occupancy counter.
    pub const PRESENCE: &str = "Presence";
    /// Battery level in percent.
    pub const BATTERY_LEVEL: &str = "Battery Level";
    /// Firmware revision string.
    pub const FIRMWARE_REVISION: &str = "Firmware Revision";
}

use components::*;

const SENSORTAG_COMPONENTS: &[Component] = &[
    Component {
        name: TEMPERATURE,
        profile: SensorProfile::configurable(
            gatt::SENSORTAG_TEMPERATURE_SERVICE,
            gatt::SENSORTAG_TEMPERATURE_DATA,
            gatt::SENSORTAG_TEMPERATURE_CONFIG,
            gatt::SENSORTAG_TEMPERATURE_PERIOD,
        ),
        unit: "Degree celsius (°C)",
    },
    Component {
        name: ACCELEROMETER,
        profile: SensorProfile::configurable(
            gatt::SENSORTAG_ACCELEROMETER_SERVICE,
            gatt::SENSORTAG_ACCELEROMETER_DATA,
            gatt::SENSORTAG_ACCELEROMETER_CONFIG,
            gatt::SENSORTAG_ACCELEROMETER_PERIOD,
        ),
        unit: "",
    },
    Component {
        name: HUMIDITY,
        profile: SensorProfile::configurable(
            gatt::SENSORTAG_HUMIDITY_SERVICE,
            gatt::SENSORTAG_HUMIDITY_DATA,
            gatt::SENSORTAG_HUMIDITY_CONFIG,
            gatt::SENSORTAG_HUMIDITY_PERIOD,
        ),
        unit: "Relative humidity (%RH)",
    },
    Component {
        name: MAGNETOMETER,
        profile: SensorProfile::configurable(
            gatt::SENSORTAG_MAGNETOMETER_SERVICE,
            gatt::SENSORTAG_MAGNETOMETER_DATA,
            gatt::SENSORTAG_MAGNETOMETER_CONFIG,
            gatt::SENSORTAG_MAGNETOMETER_PERIOD,
        ),
        unit: "",
    },
    Component {
        name: PRESSURE,
        profile: SensorProfile::configurable(
            gatt::SENSORTAG_PRESSURE_SERVICE,
            gatt::SENSORTAG_PRESSURE_DATA,
            gatt::SENSORTAG_PRESSURE_CONFIG,
            gatt::SENSORTAG_PRESSURE_PERIOD,
        ),
        unit: "Hecto pascal (hPa)",
    },
    Component {
        name: GYROSCOPE,
        profile: SensorProfile::configurable(
            gatt::SENSORTAG_GYROSCOPE_SERVICE,
            gatt::SENSORTAG_GYROSCOPE_DATA,
            gatt::SENSORTAG_GYROSCOPE_CONFIG,
            gatt::SENSORTAG_GYROSCOPE_PERIOD,
        ),
        unit: "",
    },
    Component {
        name: OPTICAL,
        profile: SensorProfile::configurable(
            gatt::SENSORTAG_OPTICAL_SERVICE,
            gatt::SENSORTAG_OPTICAL_DATA,
            gatt::SENSORTAG_OPTICAL_CONFIG,
            gatt::SENSORTAG_OPTICAL_PERIOD,
        ),
        unit: "Light intensity (W/sr)",
    },
];

const MODOSMART_ROOM_COMPONENTS: &[Component] = &[
    Component {
        name: PRESENCE,
        profile: SensorProfile::value_only(gatt::MODOSMART_ENVIRONMENT_SERVICE, gatt::MODOSMART_PRESENCE),
        unit: "",
    },
    Component {
        name: TEMPERATURE,
        profile: SensorProfile::value_only(gatt::MODOSMART_ENVIRONMENT_SERVICE, gatt::TEMPERATURE),
        unit: "",
    },
    Component {
        name: HUMIDITY,
        profile: SensorProfile::value_only(gatt::MODOSMART_ENVIRONMENT_SERVICE, gatt::HUMIDITY),
        unit: "",
    },
    Component {
        name: BATTERY_LEVEL,
        profile: SensorProfile::value_only(gatt::BATTERY_SERVICE, gatt::BATTERY_LEVEL),
        unit: "",
    },
    Component {
        name: FIRMWARE_REVISION,
        profile: SensorProfile::value_only(gatt::DEVICE_INFO_SERVICE, gatt::FIRMWARE_REVISION),
        unit: "",
    },
];

const MODOSMART_TEST_COMPONENTS: &[Component] = &[Component {
    name: TEMPERATURE,
    profile: SensorProfile::value_only(gatt::MODOSMART_TEST_SERVICE, gatt::MODOSMART_TEST_TEMPERATURE),
    unit: "",
}];

/// Family of BLE sensor peripheral.
///
/// This enum is marked `#[non_exhaustive]`; a new family is a new variant
/// with its own table and decoder, existing families are never touched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[non_exhaustive]
pub enum DeviceFamily {
    /// Texas Instruments SensorTag.
    SensorTag,
    /// Modosmart room sensor.
    ModosmartRoomSensor,
    /// Modosmart test board.
    ModosmartTest,
}

impl DeviceFamily {
    /// Every known family, in classification order.
    pub const ALL: [DeviceFamily; 3] = [
        DeviceFamily::ModosmartRoomSensor,
        DeviceFamily::ModosmartTest,
        DeviceFamily::SensorTag,
    ];

    /// Classify a device from its advertised name.
    ///
    /// # Examples
    ///
    /// ```
    /// use sensorlink_types::DeviceFamily;
    ///
    /// assert_eq!(DeviceFamily::from_name("CC2650 SensorTag"), Some(DeviceFamily::SensorTag));
    /// assert_eq!(
    ///     DeviceFamily::from_name("MODOSMART_ROOM_SENSOR_01"),
    ///     Some(DeviceFamily::ModosmartRoomSensor)
    /// );
    /// assert_eq!(DeviceFamily::from_name("MODOSMART_TEST"), Some(DeviceFamily::ModosmartTest));
    /// assert_eq!(DeviceFamily::from_name("Thingy:52"), None);
    /// ```
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|family| family.matches(name))
    }

    /// Whether an advertised name belongs to this family.
    #[must_use]
    pub fn matches(&self, name: &str) -> bool {
        match self {
            Self::SensorTag => {
                let lower = name.to_lowercase();
                lower.contains("sensortag") || lower.contains("sensor tag")
            }
            Self::ModosmartRoomSensor => name.contains("MODOSMART_ROOM_SENSOR"),
            Self::ModosmartTest => name.contains("MODOSMART_TEST"),
        }
    }

    /// Stable type name reported for devices of this family.
    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        match self {
            Self::SensorTag => "TI_SENSOR_TAG",
            Self::ModosmartRoomSensor => "MODOSMART_ROOM_SENSOR",
            Self::ModosmartTest => "MODOSMART_TEST",
        }
    }

    /// Component table for this family.
    #[must_use]
    pub const fn registry(&self) -> ProfileRegistry {
        match self {
            Self::SensorTag => ProfileRegistry::new(SENSORTAG_COMPONENTS),
            Self::ModosmartRoomSensor => ProfileRegistry::new(MODOSMART_ROOM_COMPONENTS),
            Self::ModosmartTest => ProfileRegistry::new(MODOSMART_TEST_COMPONENTS),
        }
    }

    /// Whether the component exists on this family.
    #[must_use]
    pub fn is_supported(&self, component: &str) -> bool {
        self.registry().is_supported(component)
    }

    /// GATT profile backing a component.
    #[must_use]
    pub fn profile_for(&self, component: &str) -> Option<&'static SensorProfile> {
        self.registry().lookup(component)
    }

    /// Key used to read or subscribe to a component's value.
    #[must_use]
    pub fn read_profile(&self, component: &str) -> Option<GattProfile> {
        self.profile_for(component).map(SensorProfile::read_profile)
    }

    /// Measurement unit of a component.
    #[must_use]
    pub fn measurement_unit(&self, component: &str) -> Option<&'static str> {
        self.registry().measurement_unit(component)
    }

    /// Component names a notification key resolves to.
    #[must_use]
    pub fn components_for(&self, profile: &GattProfile) -> Vec<&'static str> {
        self.registry().reverse_lookup(profile)
    }

    /// Decode a payload for a component of this family.
    pub fn decode(&self, component: &str, data: &[u8]) -> DecodeResult<Decoded> {
        let unit = self
            .measurement_unit(component)
            .ok_or_else(|| DecodeError::UnsupportedComponent(component.to_string()))?;
        let value = match self {
            Self::SensorTag => decode_sensortag(component, data)?,
            Self::ModosmartRoomSensor | Self::ModosmartTest => decode_modosmart(component, data)?,
        };
        Ok(Decoded { value, unit })
    }
}

impl fmt::Display for DeviceFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.type_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::ReadingValue;

    #[test]
    fn test_classifier() {
        assert_eq!(DeviceFamily::from_name("TI BLE Sensor Tag"), Some(DeviceFamily::SensorTag));
        assert_eq!(
            DeviceFamily::from_name("MODOSMART_TEST board"),
            Some(DeviceFamily::ModosmartTest)
        );
        assert_eq!(DeviceFamily::from_name("modosmart_room_sensor"), None);
        assert_eq!(DeviceFamily::from_name(""), None);
    }

    #[test]
    fn test_sensortag_units() {
        let family = DeviceFamily::SensorTag;
        assert_eq!(family.measurement_unit(TEMPERATURE), Some("Degree celsius (°C)"));
        assert_eq!(family.measurement_unit(PRESSURE), Some("Hecto pascal (hPa)"));
        assert_eq!(family.measurement_unit(GYROSCOPE), Some(""));
        assert_eq!(family.measurement_unit(PRESENCE), None);
    }

    #[test]
    fn test_modosmart_tables() {
        let room = DeviceFamily::ModosmartRoomSensor;
        assert_eq!(room.registry().components().len(), 5);
        assert!(room.is_supported(BATTERY_LEVEL));
        assert!(!room.is_supported(PRESSURE));

        let test = DeviceFamily::ModosmartTest;
        assert_eq!(test.registry().names().collect::<Vec<_>>(), vec![TEMPERATURE]);
        assert_eq!(
            test.read_profile(TEMPERATURE),
            Some(GattProfile::new(gatt::MODOSMART_TEST_SERVICE, gatt::MODOSMART_TEST_TEMPERATURE))
        );
    }

    #[test]
    fn test_modosmart_room_temperature_profile() {
        let profile = DeviceFamily::ModosmartRoomSensor.profile_for(TEMPERATURE).unwrap();
        assert_eq!(profile.service, gatt::MODOSMART_ENVIRONMENT_SERVICE);
        assert_eq!(profile.value, gatt::TEMPERATURE);
        assert!(profile.config.is_none());
        assert!(profile.frequency.is_none());
    }

    #[test]
    fn test_decode_attaches_unit() {
        let decoded = DeviceFamily::SensorTag.decode(TEMPERATURE, &[0x80, 0x0C]).unwrap();
        assert_eq!(decoded.value, ReadingValue::Number(25.0));
        assert_eq!(decoded.unit, "Degree celsius (°C)");
    }

    #[test]
    fn test_decode_unsupported_component() {
        let err = DeviceFamily::ModosmartTest.decode(HUMIDITY, &[0, 0]).unwrap_err();
        assert_eq!(err, DecodeError::UnsupportedComponent(HUMIDITY.into()));
    }

    #[test]
    fn test_reverse_lookup_resolves_shared_service() {
        let room = DeviceFamily::ModosmartRoomSensor;
        let key = GattProfile::new(gatt::MODOSMART_ENVIRONMENT_SERVICE, gatt::HUMIDITY);
        assert_eq!(room.components_for(&key), vec![HUMIDITY]);
    }
}
