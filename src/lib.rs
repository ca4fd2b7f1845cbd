// Allow unusual byte groupings for UUIDs which have standard format
#![allow(clippy::unusual_byte_groupings)]

//! # beacon-proximity
//!
//! Proximity estimation over Bluetooth Low Energy beacons.
//!
//! A beacon broadcasts a fixed 23-byte frame in the manufacturer-specific
//! data of its advertisements. Receivers decode the frame, take the
//! calibrated reference power it carries, and combine it with the measured
//! RSSI to estimate how far away the beacon is.
//!
//! ## Features
//!
//! - **Frame Codec**: Bit-exact encoding and decoding of beacon frames
//! - **Scan Filters**: Pattern/mask filters admitting only this protocol's frames
//! - **Distance Estimation**: Two-branch path-loss fit from RSSI and reference power
//! - **Beacon Session**: Independent scanning and broadcasting over one radio
//! - **Proximity Events**: Enter/exit notifications around a distance threshold
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use beacon_proximity::{BeaconEvent, BeaconSession, BtleplugRadio, Result, SessionConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let session = BeaconSession::with_radio(&BtleplugRadio::new(), SessionConfig::default()).await?;
//!     let mut events = session.subscribe();
//!
//!     session.start_scan().await?;
//!
//!     while let Ok(event) = events.recv().await {
//!         if let BeaconEvent::Beacon(reading) = event {
//!             match reading.distance() {
//!                 Some(meters) => println!("Beacon at {:.2} m", meters),
//!                 None => println!("Beacon at unknown distance"),
//!             }
//!         }
//!     }
//!
//!     session.shutdown().await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Platform Notes
//!
//! The bundled [`BtleplugRadio`] scans on macOS, Linux (BlueZ) and Windows.
//! Host stacks reached through btleplug cannot advertise; broadcasting
//! reports an unsupported failure event. Implement [`RadioHandle`] to drive
//! other radios.
//!
//! ## Feature Flags
//!
//! - `serde`: Enable serialization/deserialization for data types

// Public modules
pub mod ble;
pub mod data;
pub mod distance;
pub mod error;
pub mod protocol;
pub mod session;

// Re-exports for convenience
pub use error::{Activity, Error, Result};
pub use session::{BeaconSession, CallbackHandle, SessionConfig, SessionState};

// Re-export commonly used types from submodules
pub use ble::radio::{
    AdvertisementReport, CapabilityFlags, RadioEvent, RadioEventSink, RadioHandle, RadioProvider,
};
pub use ble::scanner::BtleplugRadio;
pub use ble::settings::{AdvertiseMode, AdvertiseSettings, ScanMode, ScanSettings, TxPowerLevel};
pub use ble::uuids::{BEACON_MANUFACTURER_ID, BEACON_MARKER, BEACON_SERVICE_UUID};
pub use data::{
    BeaconEvent, DistanceReading, ErrorEvent, ProximityTracker, ProximityTransition,
};
pub use protocol::{BeaconFrame, DecodeError, ScanFilterSpec};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_public_exports() {
        // Verify that key types are exported
        let _ = std::any::TypeId::of::<BeaconSession>();
        let _ = std::any::TypeId::of::<BeaconFrame>();
        let _ = std::any::TypeId::of::<ScanFilterSpec>();
        let _ = std::any::TypeId::of::<DistanceReading>();
        let _ = std::any::TypeId::of::<BeaconEvent>();
        let _ = std::any::TypeId::of::<Error>();
    }

    #[test]
    fn test_reference_frame_distance() {
        let frame = BeaconFrame::decode(&BeaconFrame::default().encode()).unwrap();
        let meters = distance::estimate(frame.reference_power, -80);
        assert!((meters - 1.5908).abs() < 0.001);
    }
}
