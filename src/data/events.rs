//! Events delivered to session subscribers.

use crate::ble::radio::CapabilityFlags;
use crate::data::proximity::ProximityTransition;
use crate::data::reading::DistanceReading;

/// Message carried by scan failure events.
pub const SCAN_FAILED_MESSAGE: &str = "Scan failed";

/// Message carried by advertise failure events.
pub const ADVERTISE_FAILED_MESSAGE: &str = "Broadcasting failed";

/// Message carried by the code-less notice sent once advertising starts.
pub const ADVERTISE_STARTED_MESSAGE: &str = "Broadcasting started";

/// A notice on the error channel.
///
/// Failures carry the platform `code`. The one code-less notice is
/// "Broadcasting started", which shares this channel with the failures.
/// Advertise failures also carry the controller capability flags as
/// `cap1` (multiple advertisement), `cap2` (offloaded filtering) and
/// `cap3` (offloaded batch scan).
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ErrorEvent {
    /// Platform failure code.
    #[cfg_attr(
        feature = "serde",
        serde(default, skip_serializing_if = "Option::is_none")
    )]
    pub code: Option<i32>,
    /// Description of the failure.
    pub message: String,
    #[cfg_attr(
        feature = "serde",
        serde(default, skip_serializing_if = "Option::is_none")
    )]
    pub cap1: Option<bool>,
    #[cfg_attr(
        feature = "serde",
        serde(default, skip_serializing_if = "Option::is_none")
    )]
    pub cap2: Option<bool>,
    #[cfg_attr(
        feature = "serde",
        serde(default, skip_serializing_if = "Option::is_none")
    )]
    pub cap3: Option<bool>,
}

impl ErrorEvent {
    fn with_message(code: Option<i32>, message: &str) -> Self {
        Self {
            code,
            message: message.to_string(),
            cap1: None,
            cap2: None,
            cap3: None,
        }
    }

    /// Error event for a failed scan.
    pub fn scan_failed(code: i32) -> Self {
        Self::with_message(Some(code), SCAN_FAILED_MESSAGE)
    }

    /// Error event for a failed advertise start, with the controller's
    /// capabilities attached for diagnosis.
    pub fn advertise_failed(code: i32, capabilities: CapabilityFlags) -> Self {
        Self {
            cap1: Some(capabilities.multi_advertise),
            cap2: Some(capabilities.offload_filter),
            cap3: Some(capabilities.offload_batch_scan),
            ..Self::with_message(Some(code), ADVERTISE_FAILED_MESSAGE)
        }
    }

    /// Notice sent once the radio confirms advertising.
    pub fn advertise_started() -> Self {
        Self::with_message(None, ADVERTISE_STARTED_MESSAGE)
    }

    /// Whether this is a failure rather than the advertise-started notice.
    pub fn is_failure(&self) -> bool {
        self.code.is_some()
    }

    /// The capability flags, when all three were reported.
    pub fn capabilities(&self) -> Option<CapabilityFlags> {
        Some(CapabilityFlags {
            multi_advertise: self.cap1?,
            offload_filter: self.cap2?,
            offload_batch_scan: self.cap3?,
        })
    }
}

impl std::fmt::Display for ErrorEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.code {
            Some(code) => write!(f, "{} (code {})", self.message, code),
            None => write!(f, "{}", self.message),
        }
    }
}

/// Event emitted by a [`BeaconSession`](crate::session::BeaconSession).
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum BeaconEvent {
    /// A beacon frame was received and its distance estimated.
    Beacon(DistanceReading),
    /// The radio reported a failure, or advertising started.
    Error(ErrorEvent),
    /// A beacon crossed the proximity threshold.
    Proximity(ProximityTransition),
}

impl BeaconEvent {
    /// Category name of the event.
    pub fn category(&self) -> &'static str {
        match self {
            Self::Beacon(_) => "Beacon",
            Self::Error(_) => "Error",
            Self::Proximity(_) => "Proximity",
        }
    }

    /// Distance for `Beacon` events.
    pub fn distance(&self) -> Option<f64> {
        match self {
            Self::Beacon(reading) => Some(reading.distance_meters),
            _ => None,
        }
    }

    /// Message carried by `Error` events.
    pub fn message(&self) -> Option<&str> {
        match self {
            Self::Error(error) => Some(&error.message),
            _ => None,
        }
    }
}
