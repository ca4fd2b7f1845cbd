//! Protocol identifiers.
//!
//! Encoder, decoder and scan filter must agree on these values to
//! interoperate.

use uuid::Uuid;

/// Service identifier carried in every beacon frame.
pub const BEACON_SERVICE_UUID: Uuid = Uuid::from_u128(0x0cf052c2_97ca_407c_84f8_b62aac4e9020);

/// Manufacturer identifier the beacon frame is registered under.
pub const BEACON_MANUFACTURER_ID: u16 = 224;

/// Marker opening every beacon frame.
pub const BEACON_MARKER: [u8; 2] = [0xBE, 0xAC];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_service_uuid_format() {
        assert_eq!(
            BEACON_SERVICE_UUID.to_string(),
            "0cf052c2-97ca-407c-84f8-b62aac4e9020"
        );
    }

    #[test]
    fn test_service_uuid_parses_uppercase() {
        let parsed = Uuid::parse_str("0CF052C2-97CA-407C-84F8-B62AAC4E9020").unwrap();
        assert_eq!(parsed, BEACON_SERVICE_UUID);
    }

    #[test]
    fn test_service_uuid_byte_order() {
        let bytes = BEACON_SERVICE_UUID.as_bytes();
        assert_eq!(bytes[0], 0x0C);
        assert_eq!(bytes[7], 0x7C);
        assert_eq!(bytes[8], 0x84);
        assert_eq!(bytes[15], 0x20);
    }
}
