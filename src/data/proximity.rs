//! Proximity tracking.
//!
//! Turns a stream of distance readings into enter/exit transitions around a
//! threshold, so callers can react once when a beacon comes within range
//! instead of on every reading. Each beacon, identified by its major and
//! minor numbers, is tracked on its own.

use std::collections::HashSet;

use crate::data::reading::DistanceReading;

/// Default proximity threshold in meters.
pub const DEFAULT_PROXIMITY_THRESHOLD: f64 = 1.0;

/// A change in proximity of one beacon.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ProximityTransition {
    /// The beacon came within the threshold.
    Entered {
        major: u16,
        minor: u16,
        /// Distance of the reading that triggered the transition.
        distance_meters: f64,
    },
    /// The beacon went beyond the threshold.
    Exited {
        major: u16,
        minor: u16,
        /// Distance of the reading that triggered the transition.
        distance_meters: f64,
    },
}

impl ProximityTransition {
    /// Distance of the reading that caused the transition.
    pub fn distance_meters(&self) -> f64 {
        match self {
            Self::Entered {
                distance_meters, ..
            }
            | Self::Exited {
                distance_meters, ..
            } => *distance_meters,
        }
    }

    /// `(major, minor)` of the beacon that moved.
    pub fn beacon(&self) -> (u16, u16) {
        match self {
            Self::Entered { major, minor, .. } | Self::Exited { major, minor, .. } => {
                (*major, *minor)
            }
        }
    }
}

/// Tracks which beacons are inside a distance threshold.
#[derive(Debug, Clone, PartialEq)]
pub struct ProximityTracker {
    threshold: f64,
    inside: HashSet<(u16, u16)>,
}

impl ProximityTracker {
    /// Create a tracker with every beacon initially outside.
    pub fn new(threshold: f64) -> Self {
        Self {
            threshold,
            inside: HashSet::new(),
        }
    }

    /// The threshold in meters.
    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Whether the beacon's last determinate reading was inside the threshold.
    pub fn is_inside(&self, major: u16, minor: u16) -> bool {
        self.inside.contains(&(major, minor))
    }

    /// Number of beacons currently inside.
    pub fn inside_count(&self) -> usize {
        self.inside.len()
    }

    /// Feed a reading. Indeterminate readings never change state.
    pub fn update(&mut self, reading: &DistanceReading) -> Option<ProximityTransition> {
        let distance_meters = reading.distance()?;
        let (major, minor) = (reading.frame.major, reading.frame.minor);

        let within = distance_meters <= self.threshold;
        if within {
            self.inside
                .insert((major, minor))
                .then_some(ProximityTransition::Entered {
                    major,
                    minor,
                    distance_meters,
                })
        } else {
            self.inside
                .remove(&(major, minor))
                .then_some(ProximityTransition::Exited {
                    major,
                    minor,
                    distance_meters,
                })
        }
    }

    /// Return every beacon to the outside state.
    pub fn reset(&mut self) {
        self.inside.clear();
    }
}

impl Default for ProximityTracker {
    fn default() -> Self {
        Self::new(DEFAULT_PROXIMITY_THRESHOLD)
    }
}
