//! Timestamped, unit-tagged sensor readings.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::codec::Decoded;

/// One decoded value of one component of one device.
///
/// Readings are immutable once built; the value is kept in its display form
/// so that every family produces the same record shape.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct Reading {
    /// Identifier of the device that produced the reading.
    pub device_id: String,
    /// Component name.
    pub component: String,
    /// Value in display form.
    pub value: String,
    /// Measurement unit, possibly empty.
    pub unit: String,
    /// Capture time in milliseconds since the Unix epoch.
    pub timestamp: i64,
}

impl Reading {
    /// Build a reading with an explicit timestamp.
    pub fn new(
        device_id: impl Into<String>,
        component: impl Into<String>,
        decoded: &Decoded,
        timestamp: i64,
    ) -> Self {
        Self {
            device_id: device_id.into(),
            component: component.into(),
            value: decoded.value.to_string(),
            unit: decoded.unit.to_string(),
            timestamp,
        }
    }

    /// Build a reading stamped with the current wall-clock time.
    pub fn now(device_id: impl Into<String>, component: impl Into<String>, decoded: &Decoded) -> Self {
        Self::new(device_id, component, decoded, now_millis())
    }

    /// Capture time as a date-time, if the timestamp is in range.
    #[must_use]
    pub fn captured_at(&self) -> Option<OffsetDateTime> {
        OffsetDateTime::from_unix_timestamp_nanos(i128::from(self.timestamp) * 1_000_000).ok()
    }
}

/// Current wall-clock time in milliseconds since the Unix epoch.
#[must_use]
pub fn now_millis() -> i64 {
    (OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000) as i64
}
