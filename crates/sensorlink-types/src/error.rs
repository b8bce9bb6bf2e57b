//! Error types for payload decoding in sensorlink-types.

use thiserror::Error;

/// Errors that can occur when decoding a raw GATT payload into a reading.
///
/// This error type is platform-agnostic and does not include
/// transport errors (those belong in sensorlink-core).
///
/// This enum is marked `#[non_exhaustive]` to allow adding new error variants
/// in future versions without breaking downstream code.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum DecodeError {
    /// The payload is shorter than the component's byte layout.
    #[error("{component} requires {expected} bytes, got {actual}")]
    InsufficientBytes {
        /// Component being decoded.
        component: String,
        /// Minimum payload length for the layout.
        expected: usize,
        /// Actual payload length.
        actual: usize,
    },

    /// The component exists in the family's table but has no defined decoder.
    #[error("No decoder for {component} on {family}")]
    NoDecoder {
        /// Device family type name.
        family: &'static str,
        /// Component name.
        component: String,
    },

    /// The component is not part of the family's table.
    #[error("Unsupported component: {0}")]
    UnsupportedComponent(String),
}

impl DecodeError {
    pub(crate) fn insufficient(component: &str, expected: usize, actual: usize) -> Self {
        Self::InsufficientBytes {
            component: component.to_string(),
            expected,
            actual,
        }
    }
}

/// Result type alias using sensorlink-types' DecodeError type.
pub type DecodeResult<T> = std::result::Result<T, DecodeError>;
