//! Radio collaborator boundary.
//!
//! The session never drives hardware itself. It asks a [`RadioProvider`] for
//! a [`RadioHandle`], hands the handle filters, payloads and an event sink,
//! and reacts to [`RadioEvent`]s the radio sends back from its own tasks.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::mpsc;

use crate::ble::settings::{AdvertiseSettings, ScanSettings};
use crate::error::Result;
use crate::protocol::filter::ScanFilterSpec;

/// Scan failure: a scan with the same settings is already running.
pub const SCAN_FAILED_ALREADY_STARTED: i32 = 1;
/// Scan failure: the application could not be registered with the stack.
pub const SCAN_FAILED_APPLICATION_REGISTRATION_FAILED: i32 = 2;
/// Scan failure: internal stack error.
pub const SCAN_FAILED_INTERNAL_ERROR: i32 = 3;
/// Scan failure: scanning with these settings is not supported.
pub const SCAN_FAILED_FEATURE_UNSUPPORTED: i32 = 4;

/// Advertise failure: payload larger than the advertisement allows.
pub const ADVERTISE_FAILED_DATA_TOO_LARGE: i32 = 1;
/// Advertise failure: no advertising instance available.
pub const ADVERTISE_FAILED_TOO_MANY_ADVERTISERS: i32 = 2;
/// Advertise failure: already advertising.
pub const ADVERTISE_FAILED_ALREADY_STARTED: i32 = 3;
/// Advertise failure: internal stack error.
pub const ADVERTISE_FAILED_INTERNAL_ERROR: i32 = 4;
/// Advertise failure: the controller cannot advertise.
pub const ADVERTISE_FAILED_FEATURE_UNSUPPORTED: i32 = 5;

/// Controller capabilities, forwarded verbatim in advertise failure events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CapabilityFlags {
    /// Multiple simultaneous advertisements are supported.
    pub multi_advertise: bool,
    /// Scan filters can be offloaded to the controller.
    pub offload_filter: bool,
    /// Batched scan results can be offloaded to the controller.
    pub offload_batch_scan: bool,
}

/// A single advertisement delivered while scanning.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AdvertisementReport {
    /// Address or platform identifier of the advertiser, if known.
    pub address: Option<String>,
    /// Manufacturer-specific data keyed by manufacturer identifier.
    pub manufacturer_data: HashMap<u16, Vec<u8>>,
    /// Received signal strength in dBm. Zero means the radio had no reading.
    pub rssi: i32,
}

impl AdvertisementReport {
    /// Create a report carrying one manufacturer data entry.
    pub fn new(manufacturer_id: u16, data: Vec<u8>, rssi: i32) -> Self {
        let mut manufacturer_data = HashMap::new();
        manufacturer_data.insert(manufacturer_id, data);
        Self {
            address: None,
            manufacturer_data,
            rssi,
        }
    }

    /// Set the advertiser address.
    pub fn with_address(mut self, address: impl Into<String>) -> Self {
        self.address = Some(address.into());
        self
    }

    /// Manufacturer data for an identifier.
    pub fn manufacturer_data(&self, manufacturer_id: u16) -> Option<&[u8]> {
        self.manufacturer_data
            .get(&manufacturer_id)
            .map(Vec::as_slice)
    }
}

/// Events a radio reports asynchronously.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RadioEvent {
    /// An advertisement passed the scan filter.
    Advertisement(AdvertisementReport),
    /// The scan could not be started or was aborted.
    ScanFailed {
        /// Platform failure code.
        code: i32,
    },
    /// Advertising started.
    AdvertiseStarted,
    /// Advertising could not be started.
    AdvertiseFailed {
        /// Platform failure code.
        code: i32,
    },
}

/// Channel a radio reports [`RadioEvent`]s on.
pub type RadioEventSink = mpsc::UnboundedSender<RadioEvent>;

/// An acquired radio.
///
/// Calls return promptly; completion and failure of the underlying
/// operation are reported through the sink.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RadioHandle: Send + Sync {
    /// Start scanning, delivering advertisements that pass `filter`.
    async fn start_scan(
        &self,
        filter: ScanFilterSpec,
        settings: ScanSettings,
        sink: RadioEventSink,
    ) -> Result<()>;

    /// Stop scanning. Safe to call when not scanning.
    async fn stop_scan(&self) -> Result<()>;

    /// Start advertising `payload` as manufacturer data.
    async fn start_advertise(
        &self,
        manufacturer_id: u16,
        payload: Vec<u8>,
        settings: AdvertiseSettings,
        sink: RadioEventSink,
    ) -> Result<()>;

    /// Stop advertising. Safe to call when not advertising.
    async fn stop_advertise(&self) -> Result<()>;

    /// Controller capabilities.
    fn capability_flags(&self) -> CapabilityFlags;
}

/// Source of radio handles.
#[async_trait]
pub trait RadioProvider: Send + Sync {
    /// Acquire a handle, or `None` when no compatible radio is present.
    async fn available(&self) -> Option<Arc<dyn RadioHandle>>;
}
