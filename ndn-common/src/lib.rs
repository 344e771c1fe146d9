#![no_std]

/// Maximum size of an encoded NDN packet
pub const MAX_NDN_PACKET_SIZE: usize = 8800;

/// Maximum number of name components accepted when parsing a URI
pub const MAX_NAME_COMPONENTS: usize = 256;

/// First byte values of the variable-length number encoding.
pub mod var_number {
    /// Values below this marker are stored in a single byte
    pub const ONE_BYTE_LIMIT: u64 = 253;
    /// Marker followed by a 2-byte big-endian value
    pub const TWO_BYTE_MARKER: u8 = 253;
    /// Marker followed by a 4-byte big-endian value
    pub const FOUR_BYTE_MARKER: u8 = 254;
    /// Marker followed by an 8-byte big-endian value
    pub const EIGHT_BYTE_MARKER: u8 = 255;
}

/// TLV type numbers used by the Data packet format
pub mod tlv_type {
    pub const DATA: u64 = 0x06;
    pub const NAME: u64 = 0x07;
    pub const NAME_COMPONENT: u64 = 0x08;
    pub const META_INFO: u64 = 0x14;
    pub const CONTENT: u64 = 0x15;
    pub const SIGNATURE_INFO: u64 = 0x16;
    pub const SIGNATURE_VALUE: u64 = 0x17;
    pub const CONTENT_TYPE: u64 = 0x18;
    pub const FRESHNESS_PERIOD: u64 = 0x19;
    pub const FINAL_BLOCK_ID: u64 = 0x1A;
    pub const SIGNATURE_TYPE: u64 = 0x1B;
    pub const KEY_LOCATOR: u64 = 0x1C;
    pub const KEY_LOCATOR_DIGEST: u64 = 0x1D;

    /// Types at or below this value are always critical
    pub const CRITICAL_RANGE_END: u64 = 31;

    /// Whether an unrecognized element of this type must fail decoding.
    ///
    /// Types in the reserved range and odd types are critical; everything
    /// else may be skipped by an older decoder.
    pub const fn is_critical(tlv_type: u64) -> bool {
        tlv_type <= CRITICAL_RANGE_END || tlv_type & 1 == 1
    }
}

/// Numeric values of the MetaInfo ContentType field
pub mod content_type {
    pub const BLOB: u64 = 0;
    pub const LINK: u64 = 1;
    pub const KEY: u64 = 2;
}

/// Numeric values of the SignatureInfo SignatureType field
pub mod signature_type {
    pub const DIGEST_SHA256: u64 = 0;
    pub const SHA256_WITH_RSA: u64 = 1;
}

/// Well-known name components used by certificate names
pub mod certificate {
    /// Marks the start of the key part of a certificate name
    pub const KEY_COMPONENT: &[u8] = b"KEY";
    /// Marks the end of the key part of an identity certificate name
    pub const ID_CERT_COMPONENT: &[u8] = b"ID-CERT";
}

#[cfg(test)]
mod tests {
    use super::tlv_type;

    #[test]
    fn test_critical_types() {
        assert!(tlv_type::is_critical(tlv_type::NAME));
        assert!(tlv_type::is_critical(tlv_type::KEY_LOCATOR_DIGEST));
        assert!(tlv_type::is_critical(33));
        assert!(!tlv_type::is_critical(32));
        assert!(!tlv_type::is_critical(200));
    }
}
