//! Beacon session.
//!
//! A session owns the radio handle for its lifetime and runs two independent
//! activities: scanning for beacons (producing distance readings) and
//! broadcasting a beacon frame. Radio callbacks arrive on an event sink and
//! are processed by a background task; the activity flags and event emission
//! share one lock, so no reading is emitted once `stop_scan` has returned.

use parking_lot::{Mutex, RwLock};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc};
use tracing::{debug, info, trace, warn};
use uuid::Uuid;

use crate::ble::radio::{
    AdvertisementReport, RadioEvent, RadioEventSink, RadioHandle, RadioProvider,
};
use crate::ble::settings::{AdvertiseSettings, ScanSettings};
use crate::ble::uuids::{BEACON_MANUFACTURER_ID, BEACON_SERVICE_UUID};
use crate::data::{
    BeaconEvent, DistanceReading, ErrorEvent, ProximityTracker, ProximityTransition,
    DEFAULT_PROXIMITY_THRESHOLD,
};
use crate::error::{Activity, Error, Result};
use crate::protocol::filter::ScanFilterSpec;
use crate::protocol::frame::BeaconFrame;

/// Session configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionConfig {
    /// Service identifier to scan for.
    pub service_id: Uuid,
    /// Manufacturer identifier the frame is carried under.
    pub manufacturer_id: u16,
    /// Settings passed to the radio when scanning.
    pub scan_settings: ScanSettings,
    /// Settings passed to the radio when advertising.
    pub advertise_settings: AdvertiseSettings,
    /// Capacity of the event broadcast channel.
    pub event_capacity: usize,
    /// Distance in meters for proximity events. `None` disables them.
    pub proximity_threshold: Option<f64>,
}

impl SessionConfig {
    /// Default event channel capacity.
    pub const DEFAULT_EVENT_CAPACITY: usize = 64;

    /// Set the service identifier.
    pub fn with_service_id(mut self, service_id: Uuid) -> Self {
        self.service_id = service_id;
        self
    }

    /// Set the manufacturer identifier.
    pub fn with_manufacturer_id(mut self, manufacturer_id: u16) -> Self {
        self.manufacturer_id = manufacturer_id;
        self
    }

    /// Set the scan settings.
    pub fn with_scan_settings(mut self, settings: ScanSettings) -> Self {
        self.scan_settings = settings;
        self
    }

    /// Set the advertise settings.
    pub fn with_advertise_settings(mut self, settings: AdvertiseSettings) -> Self {
        self.advertise_settings = settings;
        self
    }

    /// Set the event channel capacity.
    pub fn with_event_capacity(mut self, capacity: usize) -> Self {
        self.event_capacity = capacity.max(1);
        self
    }

    /// Set or disable the proximity threshold.
    pub fn with_proximity_threshold(mut self, meters: Option<f64>) -> Self {
        self.proximity_threshold = meters;
        self
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            service_id: BEACON_SERVICE_UUID,
            manufacturer_id: BEACON_MANUFACTURER_ID,
            scan_settings: ScanSettings::default(),
            advertise_settings: AdvertiseSettings::default(),
            event_capacity: Self::DEFAULT_EVENT_CAPACITY,
            proximity_threshold: Some(DEFAULT_PROXIMITY_THRESHOLD),
        }
    }
}

/// Activity flags of a session. Scanning and broadcasting are independent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct SessionState {
    /// Scanning for beacons.
    pub scan_active: bool,
    /// Broadcasting a beacon frame.
    pub advertise_active: bool,
}

impl SessionState {
    /// Neither scanning nor broadcasting.
    pub fn is_idle(&self) -> bool {
        !self.scan_active && !self.advertise_active
    }
}

/// Callback handle for unregistering callbacks.
pub struct CallbackHandle {
    id: u64,
    unregister_fn: Option<Box<dyn FnOnce() + Send + Sync>>,
}

impl CallbackHandle {
    pub(crate) fn new(id: u64, unregister_fn: impl FnOnce() + Send + Sync + 'static) -> Self {
        Self {
            id,
            unregister_fn: Some(Box::new(unregister_fn)),
        }
    }

    /// Unregister this callback.
    pub fn unregister(mut self) {
        if let Some(f) = self.unregister_fn.take() {
            f();
        }
    }

    /// Get the callback ID.
    pub fn id(&self) -> u64 {
        self.id
    }
}

impl Drop for CallbackHandle {
    fn drop(&mut self) {
        if let Some(f) = self.unregister_fn.take() {
            f();
        }
    }
}

/// State guarded by the session lock.
struct Core {
    state: SessionState,
    proximity: Option<ProximityTracker>,
}

/// Shared between the session and its event pump.
struct Shared {
    config: SessionConfig,
    core: Mutex<Core>,
    event_tx: broadcast::Sender<BeaconEvent>,
}

impl Shared {
    fn handle_radio_event(&self, event: RadioEvent, radio: &dyn RadioHandle) {
        match event {
            RadioEvent::Advertisement(report) => self.handle_advertisement(report),
            RadioEvent::ScanFailed { code } => {
                warn!("Scan failed with code {}", code);
                let _ = self
                    .event_tx
                    .send(BeaconEvent::Error(ErrorEvent::scan_failed(code)));
            }
            RadioEvent::AdvertiseStarted => {
                info!("Broadcasting started");
                let _ = self
                    .event_tx
                    .send(BeaconEvent::Error(ErrorEvent::advertise_started()));
            }
            RadioEvent::AdvertiseFailed { code } => {
                let capabilities = radio.capability_flags();
                warn!(
                    "Broadcasting failed with code {} ({:?})",
                    code, capabilities
                );
                let _ = self.event_tx.send(BeaconEvent::Error(ErrorEvent::advertise_failed(
                    code,
                    capabilities,
                )));
            }
        }
    }

    fn handle_advertisement(&self, report: AdvertisementReport) {
        // Held until the reading is sent so stop_scan cannot interleave.
        let mut core = self.core.lock();

        if !core.state.scan_active {
            trace!("Not scanning, dropping advertisement");
            return;
        }

        let data = match report.manufacturer_data(self.config.manufacturer_id) {
            Some(data) => data,
            None => {
                trace!(
                    "No manufacturer data for {:#06x}, dropping advertisement",
                    self.config.manufacturer_id
                );
                return;
            }
        };

        let frame = match BeaconFrame::decode(data) {
            Ok(frame) => frame,
            Err(e) => {
                trace!("Dropping advertisement: {}", e);
                return;
            }
        };

        if frame.service_id != self.config.service_id {
            trace!("Ignoring beacon for service {}", frame.service_id);
            return;
        }

        let reading = DistanceReading::from_frame(frame, report.rssi, report.address.clone());
        trace!(
            "Beacon {}/{} at {:.2} m (rssi {}, reference {})",
            frame.major,
            frame.minor,
            reading.distance_meters,
            reading.rssi,
            frame.reference_power
        );

        let transition = core
            .proximity
            .as_mut()
            .and_then(|tracker| tracker.update(&reading));

        let _ = self.event_tx.send(BeaconEvent::Beacon(reading));
        if let Some(transition) = transition {
            debug!("Proximity changed: {:?}", transition);
            let _ = self.event_tx.send(BeaconEvent::Proximity(transition));
        }
    }
}

/// The radio handle held between `init` and `shutdown`.
struct Attachment {
    radio: Arc<dyn RadioHandle>,
    sink: RadioEventSink,
    pump: tokio::task::JoinHandle<()>,
}

/// Scans for beacons and broadcasts a beacon frame over one radio.
pub struct BeaconSession {
    shared: Arc<Shared>,
    attachment: RwLock<Option<Attachment>>,
    callback_counter: AtomicU64,
}

impl BeaconSession {
    /// Create an idle session without a radio.
    ///
    /// Activity requests fail with [`Error::BluetoothUnavailable`] until
    /// [`Self::init`] succeeds.
    pub fn new(config: SessionConfig) -> Self {
        let (event_tx, _) = broadcast::channel(config.event_capacity.max(1));
        let proximity = config.proximity_threshold.map(ProximityTracker::new);

        Self {
            shared: Arc::new(Shared {
                config,
                core: Mutex::new(Core {
                    state: SessionState::default(),
                    proximity,
                }),
                event_tx,
            }),
            attachment: RwLock::new(None),
            callback_counter: AtomicU64::new(0),
        }
    }

    /// Create a session and acquire a radio from `provider`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::BluetoothUnavailable`] if the provider has no radio.
    pub async fn with_radio(provider: &dyn RadioProvider, config: SessionConfig) -> Result<Self> {
        let session = Self::new(config);
        session.init(provider).await?;
        Ok(session)
    }

    /// Acquire a radio from `provider`. Does nothing if one is held already.
    ///
    /// Must be called from within a tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns [`Error::BluetoothUnavailable`] if the provider has no radio.
    pub async fn init(&self, provider: &dyn RadioProvider) -> Result<()> {
        if self.has_radio() {
            debug!("Radio already acquired");
            return Ok(());
        }

        let radio = provider.available().await.ok_or_else(|| {
            warn!("Bluetooth is not available");
            Error::BluetoothUnavailable
        })?;

        let (sink, mut events) = mpsc::unbounded_channel();

        let shared = self.shared.clone();
        let pump_radio = radio.clone();
        let pump = tokio::spawn(async move {
            while let Some(event) = events.recv().await {
                shared.handle_radio_event(event, pump_radio.as_ref());
            }
            debug!("Radio event pump ended");
        });

        info!("Beacon session initialized");

        let mut attachment = self.attachment.write();
        if attachment.is_some() {
            // Lost a race with a concurrent init; keep the first radio.
            pump.abort();
            return Ok(());
        }
        *attachment = Some(Attachment { radio, sink, pump });

        Ok(())
    }

    /// Whether a radio is held.
    pub fn has_radio(&self) -> bool {
        self.attachment.read().is_some()
    }

    /// The session configuration.
    pub fn config(&self) -> &SessionConfig {
        &self.shared.config
    }

    /// Current activity flags.
    pub fn state(&self) -> SessionState {
        self.shared.core.lock().state
    }

    /// Check if scanning.
    pub fn is_scanning(&self) -> bool {
        self.state().scan_active
    }

    /// Check if broadcasting.
    pub fn is_advertising(&self) -> bool {
        self.state().advertise_active
    }

    fn radio(&self) -> Result<(Arc<dyn RadioHandle>, RadioEventSink)> {
        self.attachment
            .read()
            .as_ref()
            .map(|a| (a.radio.clone(), a.sink.clone()))
            .ok_or(Error::BluetoothUnavailable)
    }

    /// Start scanning for beacons of the configured service.
    ///
    /// # Errors
    ///
    /// Returns [`Error::BluetoothUnavailable`] without a radio,
    /// [`Error::AlreadyActive`] if already scanning, or the radio's error if
    /// it rejects the request (the session is then not scanning).
    pub async fn start_scan(&self) -> Result<()> {
        let (radio, sink) = self.radio()?;

        {
            let mut core = self.shared.core.lock();
            if core.state.scan_active {
                debug!("Already scanning, rejecting start request");
                return Err(Error::AlreadyActive {
                    activity: Activity::Scanning,
                });
            }
            core.state.scan_active = true;
            if let Some(tracker) = core.proximity.as_mut() {
                tracker.reset();
            }
        }

        let config = &self.shared.config;
        info!("Starting beacon scan for service {}", config.service_id);

        let filter =
            ScanFilterSpec::for_service_with_manufacturer(config.manufacturer_id, config.service_id);

        if let Err(e) = radio.start_scan(filter, config.scan_settings, sink).await {
            warn!("Radio rejected scan: {}", e);
            self.shared.core.lock().state.scan_active = false;
            return Err(e);
        }

        Ok(())
    }

    /// Stop scanning. Succeeds whether or not a scan is running.
    ///
    /// No `Beacon` event is emitted after this returns.
    pub async fn stop_scan(&self) -> Result<()> {
        let (radio, _) = self.radio()?;

        self.shared.core.lock().state.scan_active = false;
        info!("Stopping beacon scan");

        radio.stop_scan().await
    }

    /// Start broadcasting `frame`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::BluetoothUnavailable`] without a radio,
    /// [`Error::AlreadyActive`] if already broadcasting, or the radio's error
    /// if it rejects the request.
    pub async fn start_advertise(&self, frame: BeaconFrame) -> Result<()> {
        let (radio, sink) = self.radio()?;

        {
            let mut core = self.shared.core.lock();
            if core.state.advertise_active {
                debug!("Already broadcasting, rejecting start request");
                return Err(Error::AlreadyActive {
                    activity: Activity::Broadcasting,
                });
            }
            core.state.advertise_active = true;
        }

        let config = &self.shared.config;
        info!(
            "Starting broadcast of {}/{} for service {}",
            frame.major, frame.minor, frame.service_id
        );

        let payload = frame.encode().to_vec();
        if let Err(e) = radio
            .start_advertise(
                config.manufacturer_id,
                payload,
                config.advertise_settings,
                sink,
            )
            .await
        {
            warn!("Radio rejected broadcast: {}", e);
            self.shared.core.lock().state.advertise_active = false;
            return Err(e);
        }

        Ok(())
    }

    /// Stop broadcasting. Succeeds whether or not a broadcast is running.
    pub async fn stop_advertise(&self) -> Result<()> {
        let (radio, _) = self.radio()?;

        self.shared.core.lock().state.advertise_active = false;
        info!("Stopping broadcast");

        radio.stop_advertise().await
    }

    /// Stop all activity and release the radio.
    pub async fn shutdown(&self) -> Result<()> {
        if !self.has_radio() {
            return Ok(());
        }

        info!("Shutting down beacon session");

        let scan_result = self.stop_scan().await;
        let advertise_result = self.stop_advertise().await;

        let attachment = self.attachment.write().take();
        if let Some(attachment) = attachment {
            attachment.pump.abort();
        }

        scan_result.and(advertise_result)
    }

    /// Subscribe to session events.
    pub fn subscribe(&self) -> broadcast::Receiver<BeaconEvent> {
        self.shared.event_tx.subscribe()
    }

    fn register<F>(&self, callback: F) -> CallbackHandle
    where
        F: Fn(&BeaconEvent) + Send + Sync + 'static,
    {
        let callback_id = self.callback_counter.fetch_add(1, Ordering::SeqCst);
        let mut rx = self.shared.event_tx.subscribe();

        let handle = tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(event) => callback(&event),
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!("Callback {} lagged, skipped {} events", callback_id, skipped);
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        });

        CallbackHandle::new(callback_id, move || {
            handle.abort();
        })
    }

    /// Register a callback for distance readings.
    pub fn on_distance<F>(&self, callback: F) -> CallbackHandle
    where
        F: Fn(&DistanceReading) + Send + Sync + 'static,
    {
        self.register(move |event| {
            if let BeaconEvent::Beacon(reading) = event {
                callback(reading);
            }
        })
    }

    /// Register a callback for radio failures.
    pub fn on_error<F>(&self, callback: F) -> CallbackHandle
    where
        F: Fn(&ErrorEvent) + Send + Sync + 'static,
    {
        self.register(move |event| {
            if let BeaconEvent::Error(error) = event {
                callback(error);
            }
        })
    }

    /// Register a callback for proximity transitions.
    pub fn on_proximity<F>(&self, callback: F) -> CallbackHandle
    where
        F: Fn(&ProximityTransition) + Send + Sync + 'static,
    {
        self.register(move |event| {
            if let BeaconEvent::Proximity(transition) = event {
                callback(transition);
            }
        })
    }
}

impl Default for BeaconSession {
    fn default() -> Self {
        Self::new(SessionConfig::default())
    }
}

impl Drop for BeaconSession {
    fn drop(&mut self) {
        if let Some(attachment) = self.attachment.get_mut().take() {
            attachment.pump.abort();
        }
    }
}

impl std::fmt::Debug for BeaconSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BeaconSession")
            .field("state", &self.state())
            .field("has_radio", &self.has_radio())
            .finish()
    }
}
