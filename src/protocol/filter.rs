//! Scan filter construction.
//!
//! A scan filter is a (pattern, mask) pair applied to the manufacturer data
//! of one manufacturer identifier. A data byte passes when
//! `data & mask == pattern & mask`, the same bitwise rule platform radio
//! stacks apply when filtering in hardware.

use uuid::Uuid;

use crate::ble::uuids::{BEACON_MANUFACTURER_ID, BEACON_MARKER};
use crate::error::{Error, Result};
use crate::protocol::frame::BeaconFrame;

/// Mask value for bytes that must match the pattern.
pub const MASK_MATCH: u8 = 0x01;

/// Number of leading frame bytes the default filter constrains
/// (marker and service ID).
pub const FILTERED_PREFIX_LEN: usize = 18;

/// A manufacturer-data scan filter.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ScanFilterSpec {
    manufacturer_id: u16,
    pattern: Vec<u8>,
    mask: Vec<u8>,
}

impl ScanFilterSpec {
    /// Create a filter from a pattern and mask of equal length.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidFilter`] if the lengths differ.
    pub fn new(manufacturer_id: u16, pattern: Vec<u8>, mask: Vec<u8>) -> Result<Self> {
        if pattern.len() != mask.len() {
            return Err(Error::InvalidFilter {
                pattern_len: pattern.len(),
                mask_len: mask.len(),
            });
        }

        Ok(Self {
            manufacturer_id,
            pattern,
            mask,
        })
    }

    /// Build the filter admitting beacon frames for `service_id`.
    ///
    /// The pattern is a full-length frame with the marker and service ID set
    /// and the remaining bytes zeroed. Only the first 18 bytes are masked, so
    /// major, minor and reference power are unconstrained.
    pub fn for_service(service_id: Uuid) -> Self {
        Self::for_service_with_manufacturer(BEACON_MANUFACTURER_ID, service_id)
    }

    /// Same as [`Self::for_service`] for a different manufacturer identifier.
    pub fn for_service_with_manufacturer(manufacturer_id: u16, service_id: Uuid) -> Self {
        let mut pattern = vec![0u8; BeaconFrame::FRAME_LEN];
        pattern[0..2].copy_from_slice(&BEACON_MARKER);
        pattern[2..FILTERED_PREFIX_LEN].copy_from_slice(service_id.as_bytes());

        let mut mask = vec![0u8; BeaconFrame::FRAME_LEN];
        mask[..FILTERED_PREFIX_LEN].fill(MASK_MATCH);

        Self {
            manufacturer_id,
            pattern,
            mask,
        }
    }

    /// Manufacturer identifier whose data this filter applies to.
    pub fn manufacturer_id(&self) -> u16 {
        self.manufacturer_id
    }

    /// The data pattern.
    pub fn pattern(&self) -> &[u8] {
        &self.pattern
    }

    /// The mask, same length as the pattern.
    pub fn mask(&self) -> &[u8] {
        &self.mask
    }

    /// Check whether manufacturer data passes the filter.
    ///
    /// Data shorter than the pattern never matches.
    pub fn matches(&self, data: &[u8]) -> bool {
        if data.len() < self.pattern.len() {
            return false;
        }

        self.pattern
            .iter()
            .zip(&self.mask)
            .zip(data)
            .all(|((&p, &m), &d)| d & m == p & m)
    }
}
