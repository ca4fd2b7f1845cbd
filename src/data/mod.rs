//! Data structures delivered to callers.
//!
//! This module contains the types for distance readings, session events
//! and proximity tracking.

pub mod events;
pub mod proximity;
pub mod reading;

pub use events::{BeaconEvent, ErrorEvent};
pub use proximity::{ProximityTracker, ProximityTransition, DEFAULT_PROXIMITY_THRESHOLD};
pub use reading::DistanceReading;
