//! Beacon frame codec.
//!
//! A beacon frame is the manufacturer-specific data carried in the
//! advertisement. Layout (all multi-byte fields big-endian):
//!
//! | Offset | Size | Field             |
//! |--------|------|-------------------|
//! | 0      | 2    | Marker `BE AC`    |
//! | 2      | 16   | Service ID (UUID) |
//! | 18     | 2    | Major             |
//! | 20     | 2    | Minor             |
//! | 22     | 1    | Reference power   |

use bytes::{Buf, BufMut};
use thiserror::Error;
use uuid::Uuid;

use crate::ble::uuids::{BEACON_MARKER, BEACON_SERVICE_UUID};

/// Errors produced while decoding a beacon frame.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeError {
    /// Fewer bytes than a complete frame.
    #[error("frame too short: {len} bytes (need {})", BeaconFrame::FRAME_LEN)]
    TooShort {
        /// Number of bytes received.
        len: usize,
    },

    /// The first two bytes are not the beacon marker.
    #[error("unexpected marker {:02X} {:02X}", .found[0], .found[1])]
    MarkerMismatch {
        /// The marker bytes that were found.
        found: [u8; 2],
    },
}

/// The payload carried in a beacon's manufacturer-specific data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BeaconFrame {
    #[cfg_attr(feature = "serde", serde(skip, default = "protocol_marker"))]
    beacon_marker: [u8; 2],
    /// Service identifier shared by all beacons of one deployment.
    pub service_id: Uuid,
    /// Major group number.
    pub major: u16,
    /// Minor group number.
    pub minor: u16,
    /// Calibrated RSSI at 1 meter, in dBm.
    ///
    /// Only meaningful to the receiver; the broadcaster never reads it.
    pub reference_power: i8,
}

impl BeaconFrame {
    /// Encoded length of a frame in bytes.
    pub const FRAME_LEN: usize = 23;

    /// Offset of the reference power byte.
    pub const REFERENCE_POWER_OFFSET: usize = 22;

    /// Create a frame with the protocol marker.
    pub fn new(service_id: Uuid, major: u16, minor: u16, reference_power: i8) -> Self {
        Self {
            beacon_marker: BEACON_MARKER,
            service_id,
            major,
            minor,
            reference_power,
        }
    }

    /// Protocol marker, always [`BEACON_MARKER`].
    pub fn beacon_marker(&self) -> [u8; 2] {
        self.beacon_marker
    }

    /// Encode the frame into its 23-byte wire form.
    pub fn encode(&self) -> [u8; Self::FRAME_LEN] {
        let mut out = [0u8; Self::FRAME_LEN];
        let mut buf = &mut out[..];

        buf.put_slice(&self.beacon_marker);
        // Uuid bytes are most-significant half first.
        buf.put_slice(self.service_id.as_bytes());
        buf.put_u16(self.major);
        buf.put_u16(self.minor);
        buf.put_i8(self.reference_power);

        out
    }

    /// Decode a frame from manufacturer-specific data.
    ///
    /// Bytes past [`Self::FRAME_LEN`] are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError::TooShort`] for fewer than 23 bytes and
    /// [`DecodeError::MarkerMismatch`] when the marker is not `BE AC`.
    pub fn decode(data: &[u8]) -> Result<Self, DecodeError> {
        if data.len() < Self::FRAME_LEN {
            return Err(DecodeError::TooShort { len: data.len() });
        }

        let mut buf = &data[..Self::FRAME_LEN];

        let mut beacon_marker = [0u8; 2];
        buf.copy_to_slice(&mut beacon_marker);
        if beacon_marker != BEACON_MARKER {
            return Err(DecodeError::MarkerMismatch {
                found: beacon_marker,
            });
        }

        let mut service_id = [0u8; 16];
        buf.copy_to_slice(&mut service_id);

        let major = buf.get_u16();
        let minor = buf.get_u16();
        let reference_power = buf.get_i8();

        Ok(Self::new(
            Uuid::from_bytes(service_id),
            major,
            minor,
            reference_power,
        ))
    }
}

#[cfg(feature = "serde")]
fn protocol_marker() -> [u8; 2] {
    BEACON_MARKER
}

impl Default for BeaconFrame {
    /// The frame the reference app broadcasts: major 9, minor 6, -75 dBm.
    fn default() -> Self {
        Self::new(BEACON_SERVICE_UUID, 0x0009, 0x0006, -75)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    const SERVICE_BYTES: [u8; 16] = [
        0x0C, 0xF0, 0x52, 0xC2, 0x97, 0xCA, 0x40, 0x7C, 0x84, 0xF8, 0xB6, 0x2A, 0xAC, 0x4E, 0x90,
        0x20,
    ];

    #[test]
    fn test_encode_reference_frame() {
        let frame = BeaconFrame::new(BEACON_SERVICE_UUID, 0x0009, 0x0006, -75);
        let encoded = frame.encode();

        let mut expected = vec![0xBE, 0xAC];
        expected.extend_from_slice(&SERVICE_BYTES);
        expected.extend_from_slice(&[0x00, 0x09, 0x00, 0x06, 0xB5]);

        assert_eq!(encoded.to_vec(), expected);
        assert_eq!(encoded[BeaconFrame::REFERENCE_POWER_OFFSET], 0xB5);
    }

    #[test]
    fn test_decode_reference_frame() {
        let frame = BeaconFrame::default();
        let decoded = BeaconFrame::decode(&frame.encode()).unwrap();
        assert_eq!(decoded, frame);
        assert_eq!(decoded.major, 9);
        assert_eq!(decoded.minor, 6);
        assert_eq!(decoded.reference_power, -75);
    }

    #[test]
    fn test_decode_too_short() {
        let data = [0xBE, 0xAC, 0x00];
        assert_eq!(
            BeaconFrame::decode(&data),
            Err(DecodeError::TooShort { len: 3 })
        );
        assert_eq!(
            BeaconFrame::decode(&[]),
            Err(DecodeError::TooShort { len: 0 })
        );
    }

    #[test]
    fn test_decode_marker_mismatch() {
        let mut data = BeaconFrame::default().encode();
        data[0] = 0x4C;
        data[1] = 0x00;
        assert_eq!(
            BeaconFrame::decode(&data),
            Err(DecodeError::MarkerMismatch {
                found: [0x4C, 0x00]
            })
        );
    }

    #[test]
    fn test_decode_ignores_padding() {
        // Broadcasters may pad the payload to 24 bytes.
        let mut data = BeaconFrame::default().encode().to_vec();
        data.push(0x00);
        assert_eq!(BeaconFrame::decode(&data).unwrap(), BeaconFrame::default());
    }

    #[test]
    fn test_decode_error_display() {
        assert_eq!(
            DecodeError::TooShort { len: 5 }.to_string(),
            "frame too short: 5 bytes (need 23)"
        );
        assert_eq!(
            DecodeError::MarkerMismatch { found: [0x01, 0x02] }.to_string(),
            "unexpected marker 01 02"
        );
    }

    #[test]
    fn test_marker_fixed_for_any_frame() {
        let mut frame = BeaconFrame::new(Uuid::nil(), 0xFFFF, 0, i8::MIN);
        assert_eq!(frame.beacon_marker(), [0xBE, 0xAC]);

        // Public fields can change but the marker cannot.
        frame.major = 1;
        frame.service_id = BEACON_SERVICE_UUID;
        assert_eq!(&frame.encode()[..2], &BEACON_MARKER);
        assert_eq!(BeaconFrame::decode(&frame.encode()), Ok(frame));
        assert_eq!(BeaconFrame::default().beacon_marker(), BEACON_MARKER);
    }

    proptest! {
        #[test]
        fn prop_encode_decode_roundtrip(
            service in any::<u128>(),
            major in any::<u16>(),
            minor in any::<u16>(),
            reference_power in any::<i8>(),
        ) {
            let frame = BeaconFrame::new(Uuid::from_u128(service), major, minor, reference_power);
            let encoded = frame.encode();
            prop_assert_eq!(encoded.len(), BeaconFrame::FRAME_LEN);
            prop_assert_eq!(BeaconFrame::decode(&encoded), Ok(frame));
        }

        #[test]
        fn prop_short_input_is_rejected(data in proptest::collection::vec(any::<u8>(), 0..BeaconFrame::FRAME_LEN)) {
            let len = data.len();
            prop_assert_eq!(BeaconFrame::decode(&data), Err(DecodeError::TooShort { len }));
        }
    }
}
