use std::fmt;

use ndn_common::{signature_type, tlv_type};

use crate::blob::Blob;
use crate::name::Name;
use crate::tlv::{
    encode_non_negative_integer, encode_type_and_length, tlv_length, TlvDecoder, TlvError,
};

static NULL_BLOB: Blob = Blob::null();
static NO_KEY_LOCATOR: KeyLocator = KeyLocator::None;

/// Signature algorithms understood by this crate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SignatureType {
    /// SHA256 digest only (no key)
    DigestSha256,
    /// SHA256 with RSA signature
    Sha256WithRsa,
}

impl SignatureType {
    pub fn code(self) -> u64 {
        match self {
            SignatureType::DigestSha256 => signature_type::DIGEST_SHA256,
            SignatureType::Sha256WithRsa => signature_type::SHA256_WITH_RSA,
        }
    }
}

impl TryFrom<u64> for SignatureType {
    type Error = TlvError;

    fn try_from(code: u64) -> Result<Self, Self::Error> {
        match code {
            signature_type::DIGEST_SHA256 => Ok(SignatureType::DigestSha256),
            signature_type::SHA256_WITH_RSA => Ok(SignatureType::Sha256WithRsa),
            other => Err(TlvError::UnsupportedSignatureType(other)),
        }
    }
}

/// Kind of a set [`KeyLocator`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyLocatorType {
    KeyDigest,
    KeyName,
}

/// Reference to the key that validates a signature
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub enum KeyLocator {
    #[default]
    None,
    /// Raw key-identifying digest bytes
    KeyDigest(Blob),
    /// Name of the certificate holding the key
    KeyName(Name),
}

impl KeyLocator {
    /// Kind of this locator; `None` when unset
    pub fn locator_type(&self) -> Option<KeyLocatorType> {
        match self {
            KeyLocator::None => None,
            KeyLocator::KeyDigest(_) => Some(KeyLocatorType::KeyDigest),
            KeyLocator::KeyName(_) => Some(KeyLocatorType::KeyName),
        }
    }

    pub fn key_name(&self) -> Option<&Name> {
        match self {
            KeyLocator::KeyName(name) => Some(name),
            _ => None,
        }
    }

    pub fn key_digest(&self) -> Option<&Blob> {
        match self {
            KeyLocator::KeyDigest(digest) => Some(digest),
            _ => None,
        }
    }

    fn value_length(&self) -> usize {
        match self {
            KeyLocator::None => 0,
            KeyLocator::KeyDigest(digest) => tlv_length(tlv_type::KEY_LOCATOR_DIGEST, digest.size()),
            KeyLocator::KeyName(name) => name.encode().len(),
        }
    }

    fn encode_to(&self, buffer: &mut Vec<u8>) {
        let value_length = self.value_length();
        match self {
            KeyLocator::None => {}
            KeyLocator::KeyDigest(digest) => {
                encode_type_and_length(tlv_type::KEY_LOCATOR, value_length, buffer);
                encode_type_and_length(tlv_type::KEY_LOCATOR_DIGEST, digest.size(), buffer);
                buffer.extend_from_slice(digest);
            }
            KeyLocator::KeyName(name) => {
                encode_type_and_length(tlv_type::KEY_LOCATOR, value_length, buffer);
                name.encode_to(buffer);
            }
        }
    }

    fn decode_from(decoder: &mut TlvDecoder<'_>, end: usize) -> Result<Self, TlvError> {
        let locator_end = decoder.read_nested_tlvs_start(tlv_type::KEY_LOCATOR, end)?;

        let locator = if decoder.peek_type(tlv_type::NAME, locator_end)? {
            KeyLocator::KeyName(Name::decode_from(decoder, locator_end)?)
        } else if decoder.peek_type(tlv_type::KEY_LOCATOR_DIGEST, locator_end)? {
            let digest = decoder.read_blob_tlv(tlv_type::KEY_LOCATOR_DIGEST, locator_end)?;
            KeyLocator::KeyDigest(Blob::new(digest))
        } else {
            KeyLocator::None
        };

        decoder.finish_nested_tlvs(locator_end)?;
        Ok(locator)
    }
}

impl fmt::Display for KeyLocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyLocator::None => write!(f, "<none>"),
            KeyLocator::KeyDigest(digest) => write!(f, "KeyLocatorDigest: {}", digest.to_hex()),
            KeyLocator::KeyName(name) => write!(f, "KeyName: {}", name),
        }
    }
}

/// Signature of a Data packet.
///
/// `Empty` is the state of an unsigned packet: it has no signature type, its
/// signature value is null and its key locator is unset. Nothing is written
/// to the wire for it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub enum Signature {
    #[default]
    Empty,
    DigestSha256 {
        signature: Blob,
    },
    Sha256WithRsa {
        key_locator: KeyLocator,
        signature: Blob,
    },
}

impl Signature {
    pub fn signature_type(&self) -> Option<SignatureType> {
        match self {
            Signature::Empty => None,
            Signature::DigestSha256 { .. } => Some(SignatureType::DigestSha256),
            Signature::Sha256WithRsa { .. } => Some(SignatureType::Sha256WithRsa),
        }
    }

    /// Key locator, [`KeyLocator::None`] for signatures that carry none
    pub fn key_locator(&self) -> &KeyLocator {
        match self {
            Signature::Sha256WithRsa { key_locator, .. } => key_locator,
            _ => &NO_KEY_LOCATOR,
        }
    }

    /// Raw signature bytes, null for `Empty`
    pub fn signature_value(&self) -> &Blob {
        match self {
            Signature::Empty => &NULL_BLOB,
            Signature::DigestSha256 { signature } => signature,
            Signature::Sha256WithRsa { signature, .. } => signature,
        }
    }

    /// Replace the signature bytes. `Empty` has no value and is returned as is.
    ///
    /// A SignatureValue TLV is always written for the other variants, so a
    /// null value is stored as an empty one.
    pub fn with_signature_value(self, value: Blob) -> Self {
        let value = if value.is_null() { Blob::empty() } else { value };
        match self {
            Signature::Empty => Signature::Empty,
            Signature::DigestSha256 { .. } => Signature::DigestSha256 { signature: value },
            Signature::Sha256WithRsa { key_locator, .. } => Signature::Sha256WithRsa {
                key_locator,
                signature: value,
            },
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Signature::Empty)
    }

    /// The form this signature takes after a wire round trip: a null value
    /// on a non-`Empty` signature becomes empty
    pub(crate) fn into_wire_form(self) -> Self {
        if self.is_empty() || !self.signature_value().is_null() {
            return self;
        }
        self.with_signature_value(Blob::empty())
    }

    /// Append the SignatureInfo TLV. Nothing is written for `Empty`.
    pub(crate) fn encode_info_to(&self, buffer: &mut Vec<u8>) {
        let Some(signature_type) = self.signature_type() else {
            return;
        };

        let code = encode_non_negative_integer(signature_type.code());
        let key_locator = self.key_locator();
        let locator_length = match key_locator {
            KeyLocator::None => 0,
            _ => tlv_length(tlv_type::KEY_LOCATOR, key_locator.value_length()),
        };

        encode_type_and_length(
            tlv_type::SIGNATURE_INFO,
            tlv_length(tlv_type::SIGNATURE_TYPE, code.len()) + locator_length,
            buffer,
        );
        encode_type_and_length(tlv_type::SIGNATURE_TYPE, code.len(), buffer);
        buffer.extend_from_slice(&code);
        key_locator.encode_to(buffer);
    }

    /// Append the SignatureValue TLV. Nothing is written for `Empty`.
    pub(crate) fn encode_value_to(&self, buffer: &mut Vec<u8>) {
        if self.is_empty() {
            return;
        }
        let value = self.signature_value();
        encode_type_and_length(tlv_type::SIGNATURE_VALUE, value.size(), buffer);
        buffer.extend_from_slice(value);
    }

    /// Decode the SignatureInfo TLV at the cursor. The returned signature
    /// holds a null value until [`Signature::decode_value_from`] fills it in.
    pub(crate) fn decode_info_from(
        decoder: &mut TlvDecoder<'_>,
        end: usize,
    ) -> Result<Self, TlvError> {
        let info_end = decoder.read_nested_tlvs_start(tlv_type::SIGNATURE_INFO, end)?;
        let code = decoder.read_non_negative_integer_tlv(tlv_type::SIGNATURE_TYPE, info_end)?;
        let signature_type = SignatureType::try_from(code)?;

        let key_locator = if decoder.peek_type(tlv_type::KEY_LOCATOR, info_end)? {
            KeyLocator::decode_from(decoder, info_end)?
        } else {
            KeyLocator::None
        };
        decoder.finish_nested_tlvs(info_end)?;

        Ok(match signature_type {
            SignatureType::DigestSha256 if key_locator != KeyLocator::None => {
                return Err(TlvError::UnexpectedElement("KeyLocator"));
            }
            SignatureType::DigestSha256 => Signature::DigestSha256 {
                signature: Blob::null(),
            },
            SignatureType::Sha256WithRsa => Signature::Sha256WithRsa {
                key_locator,
                signature: Blob::null(),
            },
        })
    }

    /// Decode the SignatureValue TLV at the cursor into `self`
    pub(crate) fn decode_value_from(
        self,
        decoder: &mut TlvDecoder<'_>,
        end: usize,
    ) -> Result<Self, TlvError> {
        if !decoder.peek_type(tlv_type::SIGNATURE_VALUE, end)? {
            return Err(TlvError::MissingElement("SignatureValue"));
        }
        let value = decoder.read_blob_tlv(tlv_type::SIGNATURE_VALUE, end)?;
        Ok(self.with_signature_value(Blob::new(value)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode(signature: &Signature) -> Vec<u8> {
        let mut buffer = Vec::new();
        signature.encode_info_to(&mut buffer);
        signature.encode_value_to(&mut buffer);
        buffer
    }

    fn decode(bytes: &[u8]) -> Result<Signature, TlvError> {
        let mut decoder = TlvDecoder::new(bytes);
        Signature::decode_info_from(&mut decoder, bytes.len())?
            .decode_value_from(&mut decoder, bytes.len())
    }

    #[test]
    fn test_empty_signature() {
        let signature = Signature::default();
        assert_eq!(signature.signature_type(), None);
        assert_eq!(signature.key_locator().locator_type(), None);
        assert!(signature.signature_value().is_null());
        assert!(encode(&signature).is_empty());
    }

    #[test]
    fn test_key_name_locator_encoding() {
        let signature = Signature::Sha256WithRsa {
            key_locator: KeyLocator::KeyName(Name::from_uri("/a").unwrap()),
            signature: Blob::new(vec![0xAAu8, 0xBB]),
        };
        let encoded = encode(&signature);
        assert_eq!(
            encoded,
            vec![
                0x16, 0x0A, 0x1B, 0x01, 0x01, 0x1C, 0x05, 0x07, 0x03, 0x08, 0x01, b'a', 0x17,
                0x02, 0xAA, 0xBB
            ]
        );

        let decoded = decode(&encoded).unwrap();
        assert_eq!(decoded, signature);
        assert_eq!(
            decoded.key_locator().locator_type(),
            Some(KeyLocatorType::KeyName)
        );
        assert_eq!(decoded.key_locator().to_string(), "KeyName: /a");
    }

    #[test]
    fn test_key_digest_locator_encoding() {
        let signature = Signature::Sha256WithRsa {
            key_locator: KeyLocator::KeyDigest(Blob::new(vec![1u8, 2, 3])),
            signature: Blob::new(vec![9u8]),
        };
        let decoded = decode(&encode(&signature)).unwrap();
        assert_eq!(decoded.key_locator().key_digest(), Some(&Blob::new(vec![1u8, 2, 3])));
        assert_eq!(decoded.key_locator().key_name(), None);
    }

    #[test]
    fn test_digest_signature_has_no_locator() {
        let signature = Signature::DigestSha256 {
            signature: Blob::new(vec![0u8; 32]),
        };
        let encoded = encode(&signature);
        assert_eq!(&encoded[..5], &[0x16, 0x03, 0x1B, 0x01, 0x00]);

        let decoded = decode(&encoded).unwrap();
        assert_eq!(decoded.signature_type(), Some(SignatureType::DigestSha256));
        assert_eq!(decoded.key_locator(), &KeyLocator::None);
        assert_eq!(decoded.signature_value().size(), 32);
    }

    #[test]
    fn test_digest_signature_rejects_key_locator() {
        let bytes = vec![
            0x16, 0x0A, 0x1B, 0x01, 0x00, 0x1C, 0x05, 0x07, 0x03, 0x08, 0x01, b'k', 0x17, 0x00,
        ];
        assert_eq!(
            decode(&bytes),
            Err(TlvError::UnexpectedElement("KeyLocator"))
        );
    }

    #[test]
    fn test_null_value_is_stored_as_empty() {
        let signature = Signature::DigestSha256 {
            signature: Blob::null(),
        };
        let stored = signature.clone().into_wire_form();
        assert!(!stored.signature_value().is_null());
        assert_eq!(stored.signature_value().size(), 0);
        assert_eq!(decode(&encode(&signature)).unwrap(), stored);

        let replaced = Signature::Sha256WithRsa {
            key_locator: KeyLocator::None,
            signature: Blob::from("sig"),
        }
        .with_signature_value(Blob::null());
        assert_eq!(replaced.signature_value(), &Blob::empty());
        assert!(Signature::Empty.into_wire_form().signature_value().is_null());
    }

    #[test]
    fn test_unknown_signature_type() {
        let bytes = vec![0x16, 0x03, 0x1B, 0x01, 0x03, 0x17, 0x00];
        assert_eq!(decode(&bytes), Err(TlvError::UnsupportedSignatureType(3)));
    }

    #[test]
    fn test_missing_signature_value() {
        let bytes = vec![0x16, 0x03, 0x1B, 0x01, 0x01];
        assert_eq!(
            decode(&bytes),
            Err(TlvError::MissingElement("SignatureValue"))
        );
    }

    #[test]
    fn test_with_signature_value_keeps_locator() {
        let locator = KeyLocator::KeyName(Name::from_uri("/k").unwrap());
        let signature = Signature::Sha256WithRsa {
            key_locator: locator.clone(),
            signature: Blob::null(),
        }
        .with_signature_value(Blob::from("sig"));

        assert_eq!(signature.key_locator(), &locator);
        assert_eq!(signature.signature_value().buf(), b"sig");
        assert_eq!(
            Signature::Empty.with_signature_value(Blob::from("x")),
            Signature::Empty
        );
    }
}
