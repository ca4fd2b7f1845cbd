//! Scan and advertise settings handed to the radio.
//!
//! Raw values follow the platform radio stack numbering so a radio
//! implementation can forward them unchanged.

use std::time::Duration;

/// Scan duty cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ScanMode {
    /// Passive, only listens while other apps scan.
    Opportunistic,
    /// Lowest duty cycle.
    #[default]
    LowPower,
    /// Balanced duty cycle.
    Balanced,
    /// Continuous scanning.
    LowLatency,
}

impl ScanMode {
    /// Create from raw platform value.
    pub fn from_raw(value: i32) -> Option<Self> {
        match value {
            -1 => Some(Self::Opportunistic),
            0 => Some(Self::LowPower),
            1 => Some(Self::Balanced),
            2 => Some(Self::LowLatency),
            _ => None,
        }
    }

    /// Convert to raw platform value.
    pub fn to_raw(&self) -> i32 {
        match self {
            Self::Opportunistic => -1,
            Self::LowPower => 0,
            Self::Balanced => 1,
            Self::LowLatency => 2,
        }
    }
}

/// Advertising interval class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum AdvertiseMode {
    /// Longest interval (about 1 second).
    #[default]
    LowPower = 0,
    /// Medium interval (about 250 ms).
    Balanced = 1,
    /// Shortest interval (about 100 ms).
    LowLatency = 2,
}

impl AdvertiseMode {
    /// Create from raw platform value.
    pub fn from_raw(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::LowPower),
            1 => Some(Self::Balanced),
            2 => Some(Self::LowLatency),
            _ => None,
        }
    }

    /// Convert to raw platform value.
    pub fn to_raw(&self) -> u8 {
        *self as u8
    }
}

/// Transmit power level for advertising.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum TxPowerLevel {
    /// Ultra low transmit power.
    UltraLow = 0,
    /// Low transmit power.
    Low = 1,
    /// Medium transmit power.
    #[default]
    Medium = 2,
    /// High transmit power.
    High = 3,
}

impl TxPowerLevel {
    /// Create from raw platform value.
    pub fn from_raw(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::UltraLow),
            1 => Some(Self::Low),
            2 => Some(Self::Medium),
            3 => Some(Self::High),
            _ => None,
        }
    }

    /// Convert to raw platform value.
    pub fn to_raw(&self) -> u8 {
        *self as u8
    }
}

/// Settings for a scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ScanSettings {
    /// Delay before batched results are reported. Zero reports immediately.
    pub report_delay: Duration,
    /// Scan duty cycle.
    pub mode: ScanMode,
}

impl Default for ScanSettings {
    fn default() -> Self {
        Self {
            report_delay: Duration::ZERO,
            mode: ScanMode::LowPower,
        }
    }
}

/// Settings for advertising.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AdvertiseSettings {
    /// Advertising interval class.
    pub mode: AdvertiseMode,
    /// Whether centrals may connect.
    pub connectable: bool,
    /// Stop advertising after this long. `None` advertises until stopped.
    pub timeout: Option<Duration>,
    /// Transmit power level.
    pub tx_power: TxPowerLevel,
}

impl AdvertiseSettings {
    /// Timeout in milliseconds as platform stacks expect it, 0 meaning none.
    pub fn timeout_millis(&self) -> u64 {
        self.timeout.map(|t| t.as_millis() as u64).unwrap_or(0)
    }
}

impl Default for AdvertiseSettings {
    fn default() -> Self {
        Self {
            mode: AdvertiseMode::LowPower,
            connectable: false,
            timeout: None,
            tx_power: TxPowerLevel::Medium,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scan_settings_default() {
        let settings = ScanSettings::default();
        assert_eq!(settings.report_delay, Duration::ZERO);
        assert_eq!(settings.mode, ScanMode::LowPower);
        assert_eq!(settings.mode.to_raw(), 0);
    }

    #[test]
    fn test_advertise_settings_default() {
        let settings = AdvertiseSettings::default();
        assert_eq!(settings.mode, AdvertiseMode::LowPower);
        assert!(!settings.connectable);
        assert_eq!(settings.timeout, None);
        assert_eq!(settings.timeout_millis(), 0);
        assert_eq!(settings.tx_power, TxPowerLevel::Medium);
        assert_eq!(settings.tx_power.to_raw(), 2);
    }

    #[test]
    fn test_scan_mode_raw() {
        assert_eq!(ScanMode::from_raw(-1), Some(ScanMode::Opportunistic));
        assert_eq!(ScanMode::from_raw(2), Some(ScanMode::LowLatency));
        assert_eq!(ScanMode::from_raw(7), None);
        assert_eq!(ScanMode::Balanced.to_raw(), 1);
    }

    #[test]
    fn test_advertise_enums_raw() {
        assert_eq!(AdvertiseMode::from_raw(1), Some(AdvertiseMode::Balanced));
        assert_eq!(AdvertiseMode::from_raw(3), None);
        assert_eq!(TxPowerLevel::from_raw(3), Some(TxPowerLevel::High));
        assert_eq!(TxPowerLevel::from_raw(4), None);
        assert_eq!(TxPowerLevel::UltraLow.to_raw(), 0);
    }

    #[test]
    fn test_timeout_millis() {
        let settings = AdvertiseSettings {
            timeout: Some(Duration::from_secs(3)),
            ..Default::default()
        };
        assert_eq!(settings.timeout_millis(), 3000);
    }
}
