//! Error types for the beacon-proximity crate.

use thiserror::Error;

use crate::protocol::frame::DecodeError;

/// Activity a session can be asked to start.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Activity {
    /// Listening for beacon advertisements.
    Scanning,
    /// Advertising a beacon frame.
    Broadcasting,
}

impl std::fmt::Display for Activity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Scanning => write!(f, "listening"),
            Self::Broadcasting => write!(f, "broadcasting"),
        }
    }
}

/// The main error type for this crate.
#[derive(Error, Debug)]
pub enum Error {
    /// Bluetooth-related error from the underlying BLE library.
    #[error("Bluetooth error: {0}")]
    Bluetooth(#[from] btleplug::Error),

    /// Bluetooth is not available or is disabled on this system.
    #[error("Bluetooth is not available")]
    BluetoothUnavailable,

    /// A start request was issued while the activity was already running.
    #[error("It is already {activity}")]
    AlreadyActive {
        /// The activity that is already running.
        activity: Activity,
    },

    /// Beacon frame bytes could not be decoded.
    #[error("Invalid beacon frame: {0}")]
    Decode(#[from] DecodeError),

    /// A scan filter was built from a pattern and mask of different lengths.
    #[error("Scan filter mask length {mask_len} does not match pattern length {pattern_len}")]
    InvalidFilter {
        /// Length of the data pattern.
        pattern_len: usize,
        /// Length of the mask.
        mask_len: usize,
    },

    /// The radio rejected a request.
    #[error("Radio error: {reason}")]
    Radio {
        /// Platform failure code, when the radio reported one.
        code: Option<i32>,
        /// Description of the failure.
        reason: String,
    },
}

/// A specialized Result type for this crate.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_already_active_message() {
        let err = Error::AlreadyActive {
            activity: Activity::Scanning,
        };
        assert_eq!(err.to_string(), "It is already listening");

        let err = Error::AlreadyActive {
            activity: Activity::Broadcasting,
        };
        assert_eq!(err.to_string(), "It is already broadcasting");
    }

    #[test]
    fn test_decode_error_conversion() {
        let err: Error = DecodeError::TooShort { len: 4 }.into();
        assert!(matches!(err, Error::Decode(DecodeError::TooShort { len: 4 })));
    }
}
