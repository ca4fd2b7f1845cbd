//! Distance readings.

use chrono::{DateTime, Utc};

use crate::distance::{self, INDETERMINATE_DISTANCE};
use crate::protocol::frame::BeaconFrame;

/// A distance estimate produced from one advertisement.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DistanceReading {
    /// Estimated distance in meters.
    ///
    /// `-1.0` means indeterminate (the radio reported an RSSI of zero),
    /// not a physical distance. Check [`Self::is_indeterminate`].
    pub distance_meters: f64,
    /// When the advertisement was processed.
    pub timestamp: DateTime<Utc>,
    /// Received signal strength in dBm.
    pub rssi: i32,
    /// The decoded frame.
    pub frame: BeaconFrame,
    /// Address of the advertiser, if the radio reported one.
    pub address: Option<String>,
}

impl DistanceReading {
    /// Estimate distance for a frame received at `rssi`, stamped now.
    pub fn from_frame(frame: BeaconFrame, rssi: i32, address: Option<String>) -> Self {
        Self {
            distance_meters: distance::estimate(frame.reference_power, rssi),
            timestamp: Utc::now(),
            rssi,
            frame,
            address,
        }
    }

    /// Whether the distance is the indeterminate sentinel.
    pub fn is_indeterminate(&self) -> bool {
        self.distance_meters == INDETERMINATE_DISTANCE
    }

    /// Whether the reading is determinate and no farther than `meters`.
    pub fn is_within(&self, meters: f64) -> bool {
        !self.is_indeterminate() && self.distance_meters <= meters
    }

    /// The distance, or `None` when indeterminate.
    pub fn distance(&self) -> Option<f64> {
        if self.is_indeterminate() {
            None
        } else {
            Some(self.distance_meters)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_frame_uses_frame_reference_power() {
        let frame = BeaconFrame::default();
        let reading = DistanceReading::from_frame(frame, -80, Some("AA".to_string()));

        assert!((reading.distance_meters - 1.590_837_835).abs() < 1e-6);
        assert_eq!(reading.rssi, -80);
        assert_eq!(reading.frame, frame);
        assert_eq!(reading.address.as_deref(), Some("AA"));
        assert!(!reading.is_indeterminate());
    }

    #[test]
    fn test_indeterminate_reading() {
        let reading = DistanceReading::from_frame(BeaconFrame::default(), 0, None);
        assert!(reading.is_indeterminate());
        assert_eq!(reading.distance(), None);
        // The sentinel is not "closer than one meter".
        assert!(!reading.is_within(1.0));
    }

    #[test]
    fn test_is_within() {
        let reading = DistanceReading::from_frame(BeaconFrame::default(), -60, None);
        assert!(reading.is_within(1.0));
        assert!(!reading.is_within(0.01));
        assert_eq!(reading.distance(), Some(reading.distance_meters));
    }
}
