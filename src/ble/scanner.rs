//! Host radio backed by btleplug.
//!
//! btleplug drives the central role only: scanning works, advertising is
//! reported back as unsupported.

use async_trait::async_trait;
use btleplug::api::{Central, CentralEvent, Manager as _, Peripheral as _, ScanFilter};
use btleplug::platform::{Adapter, Manager, PeripheralId};
use futures::stream::StreamExt;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, trace, warn};

use crate::ble::radio::{
    AdvertisementReport, CapabilityFlags, RadioEvent, RadioEventSink, RadioHandle, RadioProvider,
    ADVERTISE_FAILED_FEATURE_UNSUPPORTED, SCAN_FAILED_ALREADY_STARTED, SCAN_FAILED_INTERNAL_ERROR,
};
use crate::ble::settings::{AdvertiseSettings, ScanSettings};
use crate::error::{Error, Result};
use crate::protocol::filter::ScanFilterSpec;

/// Set while a handle to the host adapter is alive.
static ADAPTER_CLAIMED: AtomicBool = AtomicBool::new(false);

/// Provider for the first Bluetooth adapter on the host.
///
/// Only one handle exists per process at a time; the adapter is released
/// when the handle is dropped.
#[derive(Debug, Default, Clone, Copy)]
pub struct BtleplugRadio;

impl BtleplugRadio {
    /// Create a provider.
    pub fn new() -> Self {
        Self
    }

    async fn first_adapter() -> Result<Adapter> {
        let manager = Manager::new()
            .await
            .map_err(|_e| Error::BluetoothUnavailable)?;

        let adapters = manager.adapters().await.map_err(Error::Bluetooth)?;

        adapters
            .into_iter()
            .next()
            .ok_or(Error::BluetoothUnavailable)
    }
}

#[async_trait]
impl RadioProvider for BtleplugRadio {
    async fn available(&self) -> Option<Arc<dyn RadioHandle>> {
        if ADAPTER_CLAIMED.swap(true, Ordering::SeqCst) {
            debug!("Bluetooth adapter already claimed by another session");
            return None;
        }

        match Self::first_adapter().await {
            Ok(adapter) => {
                info!(
                    "Using Bluetooth adapter: {:?}",
                    adapter.adapter_info().await.ok()
                );
                Some(Arc::new(BtleplugRadioHandle::new(adapter)))
            }
            Err(e) => {
                warn!("No usable Bluetooth adapter: {}", e);
                ADAPTER_CLAIMED.store(false, Ordering::SeqCst);
                None
            }
        }
    }
}

/// Radio handle wrapping a btleplug adapter.
pub struct BtleplugRadioHandle {
    /// The BLE adapter to use for scanning.
    adapter: Adapter,
    /// Whether scanning is currently active.
    is_scanning: Arc<RwLock<bool>>,
    /// Handle to the scanning task.
    scan_handle: RwLock<Option<tokio::task::JoinHandle<()>>>,
}

impl BtleplugRadioHandle {
    fn new(adapter: Adapter) -> Self {
        Self {
            adapter,
            is_scanning: Arc::new(RwLock::new(false)),
            scan_handle: RwLock::new(None),
        }
    }

    /// Forward a manufacturer data advertisement if it passes the filter.
    ///
    /// Returns `false` once the sink is closed.
    async fn forward_advertisement(
        adapter: &Adapter,
        id: PeripheralId,
        manufacturer_data: HashMap<u16, Vec<u8>>,
        filter: &ScanFilterSpec,
        sink: &RadioEventSink,
    ) -> bool {
        let passes = manufacturer_data
            .get(&filter.manufacturer_id())
            .map(|data| filter.matches(data))
            .unwrap_or(false);

        if !passes {
            trace!("Advertisement from {:?} rejected by filter", id);
            return true;
        }

        let rssi = match adapter.peripheral(&id).await {
            Ok(peripheral) => match peripheral.properties().await {
                Ok(Some(properties)) => properties.rssi.map(i32::from).unwrap_or(0),
                _ => 0,
            },
            Err(e) => {
                trace!("Failed to get peripheral: {}", e);
                0
            }
        };

        let report = AdvertisementReport {
            address: Some(id.to_string()),
            manufacturer_data,
            rssi,
        };

        sink.send(RadioEvent::Advertisement(report)).is_ok()
    }
}

#[async_trait]
impl RadioHandle for BtleplugRadioHandle {
    async fn start_scan(
        &self,
        filter: ScanFilterSpec,
        settings: ScanSettings,
        sink: RadioEventSink,
    ) -> Result<()> {
        if *self.is_scanning.read() {
            debug!("Already scanning, reporting scan failure");
            let _ = sink.send(RadioEvent::ScanFailed {
                code: SCAN_FAILED_ALREADY_STARTED,
            });
            return Ok(());
        }

        // Host stacks pick their own duty cycle and report immediately.
        debug!(
            "Starting scan (requested mode {:?}, report delay {:?})",
            settings.mode, settings.report_delay
        );

        self.adapter
            .start_scan(ScanFilter::default())
            .await
            .map_err(Error::Bluetooth)?;

        *self.is_scanning.write() = true;

        let adapter = self.adapter.clone();
        let is_scanning = self.is_scanning.clone();

        let handle = tokio::spawn(async move {
            let mut events = match adapter.events().await {
                Ok(events) => events,
                Err(e) => {
                    error!("Failed to get adapter events: {}", e);
                    let _ = sink.send(RadioEvent::ScanFailed {
                        code: SCAN_FAILED_INTERNAL_ERROR,
                    });
                    return;
                }
            };

            while *is_scanning.read() {
                tokio::select! {
                    Some(event) = events.next() => {
                        if let CentralEvent::ManufacturerDataAdvertisement { id, manufacturer_data } = event {
                            let open = Self::forward_advertisement(
                                &adapter,
                                id,
                                manufacturer_data,
                                &filter,
                                &sink,
                            ).await;
                            if !open {
                                debug!("Event sink closed, ending scan loop");
                                break;
                            }
                        }
                    }
                    _ = tokio::time::sleep(Duration::from_millis(100)) => {}
                }
            }

            debug!("Scan event loop ended");
        });

        *self.scan_handle.write() = Some(handle);

        Ok(())
    }

    async fn stop_scan(&self) -> Result<()> {
        if !*self.is_scanning.read() {
            debug!("Not scanning, ignoring stop request");
            return Ok(());
        }

        *self.is_scanning.write() = false;

        self.adapter.stop_scan().await.map_err(Error::Bluetooth)?;

        let handle = self.scan_handle.write().take();
        if let Some(handle) = handle {
            let _ = handle.await;
        }

        Ok(())
    }

    async fn start_advertise(
        &self,
        manufacturer_id: u16,
        payload: Vec<u8>,
        _settings: AdvertiseSettings,
        sink: RadioEventSink,
    ) -> Result<()> {
        warn!(
            "Host adapter cannot advertise ({} bytes for manufacturer {})",
            payload.len(),
            manufacturer_id
        );
        let _ = sink.send(RadioEvent::AdvertiseFailed {
            code: ADVERTISE_FAILED_FEATURE_UNSUPPORTED,
        });
        Ok(())
    }

    async fn stop_advertise(&self) -> Result<()> {
        Ok(())
    }

    fn capability_flags(&self) -> CapabilityFlags {
        CapabilityFlags::default()
    }
}

impl Drop for BtleplugRadioHandle {
    fn drop(&mut self) {
        *self.is_scanning.write() = false;
        ADAPTER_CLAIMED.store(false, Ordering::SeqCst);
    }
}
