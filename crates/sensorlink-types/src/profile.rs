//! GATT profiles and per-family component registries.
//!
//! A [`ProfileRegistry`] is a static table mapping component names (for
//! example `"Temperature"`) to the [`SensorProfile`] that addresses them on
//! the peripheral, together with the component's measurement unit.

use core::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A (service, characteristic) pair addressing one GATT endpoint.
///
/// This is the key the transport reads, writes and subscribes against, and
/// the key it reports notifications with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct GattProfile {
    /// GATT service UUID.
    pub service: Uuid,
    /// GATT characteristic UUID.
    pub characteristic: Uuid,
}

impl GattProfile {
    /// Create a new profile key.
    #[must_use]
    pub const fn new(service: Uuid, characteristic: Uuid) -> Self {
        Self {
            service,
            characteristic,
        }
    }
}

impl fmt::Display for GattProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.service, self.characteristic)
    }
}

/// The full set of characteristics backing one sensor component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SensorProfile {
    /// GATT service UUID.
    pub service: Uuid,
    /// Characteristic holding the sensor value (read/notify).
    pub value: Uuid,
    /// Characteristic that switches the sensor on or off, if any.
    pub config: Option<Uuid>,
    /// Characteristic that sets the notification period, if any.
    pub frequency: Option<Uuid>,
}

impl SensorProfile {
    /// Profile with only a value characteristic.
    #[must_use]
    pub const fn value_only(service: Uuid, value: Uuid) -> Self {
        Self {
            service,
            value,
            config: None,
            frequency: None,
        }
    }

    /// Profile with value, configuration and period characteristics.
    #[must_use]
    pub const fn configurable(service: Uuid, value: Uuid, config: Uuid, frequency: Uuid) -> Self {
        Self {
            service,
            value,
            config: Some(config),
            frequency: Some(frequency),
        }
    }

    /// Key used to read and subscribe to the value characteristic.
    #[must_use]
    pub const fn read_profile(&self) -> GattProfile {
        GattProfile::new(self.service, self.value)
    }

    /// Key used to switch the sensor on, if the sensor needs it.
    #[must_use]
    pub fn config_profile(&self) -> Option<GattProfile> {
        self.config.map(|c| GattProfile::new(self.service, c))
    }

    /// Key used to set the notification period, if the sensor supports it.
    #[must_use]
    pub fn frequency_profile(&self) -> Option<GattProfile> {
        self.frequency.map(|c| GattProfile::new(self.service, c))
    }
}

/// One row of a family's component table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Component {
    /// Component name, unique within the family.
    pub name: &'static str,
    /// GATT characteristics for the component.
    pub profile: SensorProfile,
    /// Measurement unit, possibly empty.
    pub unit: &'static str,
}

/// Static lookup table from component names to GATT profiles.
///
/// Registries are fixed at compile time; there is one per device family.
#[derive(Debug, Clone, Copy)]
pub struct ProfileRegistry {
    components: &'static [Component],
}

impl ProfileRegistry {
    /// Wrap a static component table.
    #[must_use]
    pub const fn new(components: &'static [Component]) -> Self {
        Self { components }
    }

    /// All components in table order.
    pub fn components(&self) -> &'static [Component] {
        self.components
    }

    /// Component names in table order.
    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.components.iter().map(|c| c.name)
    }

    /// Look up the profile for a component.
    pub fn lookup(&self, component: &str) -> Option<&'static SensorProfile> {
        self.find(component).map(|c| &c.profile)
    }

    /// Whether the component is present in this registry.
    pub fn is_supported(&self, component: &str) -> bool {
        self.find(component).is_some()
    }

    /// Measurement unit for a component.
    pub fn measurement_unit(&self, component: &str) -> Option<&'static str> {
        self.find(component).map(|c| c.unit)
    }

    /// Resolve a notification key back to the component names it serves.
    ///
    /// Only the value characteristic participates. Tables are built so that
    /// the result holds at most one name.
    pub fn reverse_lookup(&self, profile: &GattProfile) -> Vec<&'static str> {
        self.components
            .iter()
            .filter(|c| c.profile.read_profile() == *profile)
            .map(|c| c.name)
            .collect()
    }

    fn find(&self, component: &str) -> Option<&'static Component> {
        self.components.iter().find(|c| c.name == component)
    }
}
