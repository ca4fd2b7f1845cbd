//! BLE radio module.
//!
//! This module provides the boundary to the Bluetooth stack: protocol
//! identifiers, scan and advertise settings, the radio traits the session
//! drives, and a btleplug-backed host radio.

pub mod radio;
pub mod scanner;
pub mod settings;
pub mod uuids;

pub use radio::{
    AdvertisementReport, CapabilityFlags, RadioEvent, RadioEventSink, RadioHandle, RadioProvider,
};
pub use scanner::{BtleplugRadio, BtleplugRadioHandle};
pub use settings::{AdvertiseMode, AdvertiseSettings, ScanMode, ScanSettings, TxPowerLevel};
pub use uuids::*;
