//! Payload decoding for each sensor family.
//!
//! Decoders are pure functions from a component name and the raw bytes the
//! peripheral reported to a [`ReadingValue`]. They never allocate state and
//! always return the same value for the same input.
//!
//! # Byte layouts
//!
//! | Family | Component | Layout |
//! |--------|-----------|--------|
//! | SensorTag | Temperature | u16 LE, trailing word of a 4-byte frame; `raw / 128` |
//! | SensorTag | Humidity | u16 LE, trailing word of a 4-byte frame; `raw / 65536 * 100` |
//! | SensorTag | Optical | u16 LE; 12-bit mantissa, 4-bit exponent; `m * 0.01 * 2^e` |
//! | SensorTag | Pressure | 6 bytes; calibration polynomial over bytes 0..=5 |
//! | Modosmart | Presence | i16 LE |
//! | Modosmart | Temperature, Humidity | i16 LE; `raw * 0.01` |
//! | Modosmart | Battery Level | u8 |
//! | Modosmart | Firmware Revision | UTF-8 text |

use core::fmt;

use bytes::Buf;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{DecodeError, DecodeResult};
use crate::family::components::*;

/// A decoded physical value.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(untagged))]
pub enum ReadingValue {
    /// Whole-number value (counters, percentages).
    Integer(i64),
    /// Scaled floating point value.
    Number(f64),
    /// Text value (revision strings).
    Text(String),
}

impl ReadingValue {
    /// Whether the value is numerically zero.
    ///
    /// Text counts as zero only when it parses as the number zero.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        match self {
            Self::Integer(v) => *v == 0,
            Self::Number(v) => *v == 0.0,
            Self::Text(s) => s.trim().parse::<f64>().is_ok_and(|v| v == 0.0),
        }
    }

    /// The value as a float, if it is numeric.
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Integer(v) => Some(*v as f64),
            Self::Number(v) => Some(*v),
            Self::Text(_) => None,
        }
    }
}

impl fmt::Display for ReadingValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Integer(v) => write!(f, "{v}"),
            // Integral floats keep one decimal so "256.0" stays distinguishable from a count.
            Self::Number(v) if v.is_finite() && v.fract() == 0.0 && v.abs() < 1e15 => {
                write!(f, "{v:.1}")
            }
            Self::Number(v) => write!(f, "{v}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

/// A decoded value tagged with its measurement unit.
#[derive(Debug, Clone, PartialEq)]
pub struct Decoded {
    /// Physical value.
    pub value: ReadingValue,
    /// Measurement unit, possibly empty.
    pub unit: &'static str,
}

const SENSORTAG: &str = "TI_SENSOR_TAG";
const PRESSURE_FRAME_BYTES: usize = 6;

/// Decode a TI SensorTag payload.
///
/// Values are computed and rendered in double precision. A humidity word of
/// `0x1234` therefore displays as `7.110595703125`, not as the shorter
/// single-precision `7.1105957`.
pub fn decode_sensortag(component: &str, data: &[u8]) -> DecodeResult<ReadingValue> {
    match component {
        TEMPERATURE => {
            let raw = trailing_word(component, data)?;
            Ok(ReadingValue::Number(f64::from(raw) / 128.0))
        }
        HUMIDITY => {
            let raw = trailing_word(component, data)?;
            Ok(ReadingValue::Number(f64::from(raw) / 65536.0 * 100.0))
        }
        OPTICAL => {
            let raw = word_at(component, data, 0)?;
            let exponent = (raw & 0xF000) >> 12;
            let mantissa = raw & 0x0FFF;
            Ok(ReadingValue::Number(
                f64::from(mantissa) * (0.01 * 2f64.powi(i32::from(exponent))),
            ))
        }
        PRESSURE => decode_sensortag_pressure(data).map(ReadingValue::Number),
        ACCELEROMETER | MAGNETOMETER | GYROSCOPE => Err(DecodeError::NoDecoder {
            family: SENSORTAG,
            component: component.to_string(),
        }),
        other => Err(DecodeError::UnsupportedComponent(other.to_string())),
    }
}

/// Barometer calibration polynomial.
///
/// Bytes 0..2 hold the raw temperature word, bytes 3..5 the raw pressure
/// word and the calibration coefficients. The coefficients are signed bytes
/// and the first product is integral. The returned value is the
/// intermediate `p_a` of the calibration, not a value scaled to hPa.
fn decode_sensortag_pressure(data: &[u8]) -> DecodeResult<f64> {
    if data.len() < PRESSURE_FRAME_BYTES {
        return Err(DecodeError::insufficient(
            PRESSURE,
            PRESSURE_FRAME_BYTES,
            data.len(),
        ));
    }

    let t_raw = i32::from(u16::from_le_bytes([data[0], data[1]]));
    let p_raw = f64::from(u16::from_le_bytes([data[3], data[4]]));
    let c0 = f64::from(data[3] as i8);
    let c1 = i32::from(data[4] as i8);
    let c2 = i32::from(data[5] as i8);

    let s = c0
        + f64::from(c1 * t_raw) / 2f64.powi(17)
        + (f64::from(c2 * t_raw) / 2f64.powi(15)) * f64::from(t_raw) / 2f64.powi(19);

    Ok((s * p_raw) / 2f64.powi(14))
}

/// Decode a Modosmart payload (room sensor and test board share layouts).
pub fn decode_modosmart(component: &str, data: &[u8]) -> DecodeResult<ReadingValue> {
    match component {
        PRESENCE => {
            let raw = signed_word(component, data)?;
            Ok(ReadingValue::Integer(i64::from(raw)))
        }
        TEMPERATURE | HUMIDITY => {
            let raw = signed_word(component, data)?;
            Ok(ReadingValue::Number(f64::from(raw) * 0.01))
        }
        BATTERY_LEVEL => {
            let mut buf = data;
            if !buf.has_remaining() {
                return Err(DecodeError::insufficient(component, 1, 0));
            }
            Ok(ReadingValue::Integer(i64::from(buf.get_u8())))
        }
        FIRMWARE_REVISION => {
            let text = String::from_utf8_lossy(data);
            Ok(ReadingValue::Text(text.trim_end_matches('\0').to_string()))
        }
        other => Err(DecodeError::UnsupportedComponent(other.to_string())),
    }
}

fn word_at(component: &str, data: &[u8], offset: usize) -> DecodeResult<u16> {
    let needed = offset + 2;
    if data.len() < needed {
        return Err(DecodeError::insufficient(component, needed, data.len()));
    }
    let mut buf = &data[offset..];
    Ok(buf.get_u16_le())
}

/// Ambient/humidity frames carry two words; the reading is the second one.
/// A bare 2-byte frame carries just that word.
fn trailing_word(component: &str, data: &[u8]) -> DecodeResult<u16> {
    let offset = if data.len() >= 4 { 2 } else { 0 };
    word_at(component, data, offset)
}

fn signed_word(component: &str, data: &[u8]) -> DecodeResult<i16> {
    if data.len() < 2 {
        return Err(DecodeError::insufficient(component, 2, data.len()));
    }
    let mut buf = data;
    Ok(buf.get_i16_le())
}
