use log::{debug, warn};
use ndn_common::{tlv_type, MAX_NDN_PACKET_SIZE};

use crate::blob::Blob;
use crate::meta_info::MetaInfo;
use crate::name::Name;
use crate::signature::Signature;
use crate::tlv::{encode_type_and_length, TlvDecoder, TlvError};

/// Cached wire form of a Data packet
#[derive(Debug, Clone)]
struct WireEncoding {
    bytes: Blob,
    /// Offset of the Name TLV
    signed_begin: usize,
    /// Offset just past the SignatureInfo TLV
    signed_end: usize,
}

impl WireEncoding {
    fn signed_portion(&self) -> &[u8] {
        &self.bytes[self.signed_begin..self.signed_end]
    }
}

/// Data packet: Name, MetaInfo, Content and Signature.
///
/// The wire encoding is memoized. Every mutation through a setter or a
/// `*_mut` accessor drops the cached bytes, even when the new value is equal
/// to the old one, so the next [`Data::wire_encode`] always reflects the
/// current fields.
#[derive(Debug, Clone, Default)]
pub struct Data {
    name: Name,
    meta_info: MetaInfo,
    content: Blob,
    signature: Signature,
    wire_encoding: Option<WireEncoding>,
}

impl Data {
    /// Create an empty Data packet
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a Data packet with the given name and default fields
    pub fn with_name(name: Name) -> Self {
        Self {
            name,
            ..Self::default()
        }
    }

    /// Decode a Data packet from the start of `bytes`
    pub fn from_wire(bytes: &[u8]) -> Result<Self, TlvError> {
        let mut data = Self::new();
        data.wire_decode(bytes)?;
        Ok(data)
    }

    pub fn name(&self) -> &Name {
        &self.name
    }

    pub fn meta_info(&self) -> &MetaInfo {
        &self.meta_info
    }

    /// Content bytes; null unless content was set or decoded
    pub fn content(&self) -> &Blob {
        &self.content
    }

    pub fn signature(&self) -> &Signature {
        &self.signature
    }

    pub fn set_name(&mut self, name: Name) -> &mut Self {
        self.name = name;
        self.invalidate();
        self
    }

    pub fn name_mut(&mut self) -> &mut Name {
        self.invalidate();
        &mut self.name
    }

    pub fn set_meta_info(&mut self, meta_info: MetaInfo) -> &mut Self {
        self.meta_info = meta_info;
        self.invalidate();
        self
    }

    pub fn meta_info_mut(&mut self) -> &mut MetaInfo {
        self.invalidate();
        &mut self.meta_info
    }

    pub fn set_content(&mut self, content: impl Into<Blob>) -> &mut Self {
        self.content = content.into();
        self.invalidate();
        self
    }

    /// Install `signature`. A null value on a non-`Empty` signature is stored
    /// as empty, matching what decoding the encoded packet yields.
    pub fn set_signature(&mut self, signature: Signature) -> &mut Self {
        self.signature = signature.into_wire_form();
        self.invalidate();
        self
    }

    /// Whether a cached encoding is currently held
    pub fn has_wire_encoding(&self) -> bool {
        self.wire_encoding.is_some()
    }

    /// Encode the packet, reusing the cached bytes when no field changed
    pub fn wire_encode(&mut self) -> Blob {
        self.encoding().bytes.clone()
    }

    /// Replace every field with the packet decoded from the start of `bytes`.
    ///
    /// Bytes after the outer Data TLV are ignored. The outer TLV bytes become
    /// the cached encoding verbatim. On error the packet is left unchanged.
    pub fn wire_decode(&mut self, bytes: &[u8]) -> Result<(), TlvError> {
        let mut decoder = TlvDecoder::new(bytes);
        let data_end = decoder.read_nested_tlvs_start(tlv_type::DATA, bytes.len())?;
        let signed_begin = decoder.offset();

        if !decoder.peek_type(tlv_type::NAME, data_end)? {
            return Err(TlvError::MissingElement("Name"));
        }
        let name = Name::decode_from(&mut decoder, data_end)?;

        let meta_info = if decoder.peek_type(tlv_type::META_INFO, data_end)? {
            MetaInfo::decode_from(&mut decoder, data_end)?
        } else {
            MetaInfo::default()
        };

        let content = decoder
            .read_optional_blob_tlv(tlv_type::CONTENT, data_end)?
            .map(Blob::new)
            .unwrap_or_default();

        let (signature, signed_end) = if decoder.peek_type(tlv_type::SIGNATURE_INFO, data_end)? {
            let info = Signature::decode_info_from(&mut decoder, data_end)?;
            let signed_end = decoder.offset();
            (info.decode_value_from(&mut decoder, data_end)?, signed_end)
        } else {
            (Signature::Empty, decoder.offset())
        };

        decoder.finish_nested_tlvs(data_end)?;

        if data_end < bytes.len() {
            debug!(
                "Ignoring {} trailing bytes after Data packet",
                bytes.len() - data_end
            );
        }

        self.name = name;
        self.meta_info = meta_info;
        self.content = content;
        self.signature = signature;
        self.wire_encoding = Some(WireEncoding {
            bytes: Blob::new(&bytes[..data_end]),
            signed_begin,
            signed_end,
        });
        Ok(())
    }

    /// Bytes from the start of the Name to the end of the SignatureInfo
    pub fn signed_portion(&mut self) -> &[u8] {
        self.encoding().signed_portion()
    }

    /// Signed portion the packet would have with `signature` installed.
    /// The packet itself is not modified.
    pub fn signed_portion_with(&self, signature: &Signature) -> Vec<u8> {
        encode_fields(&self.name, &self.meta_info, &self.content, signature)
            .signed_portion()
            .to_vec()
    }

    fn encoding(&mut self) -> &WireEncoding {
        self.wire_encoding.get_or_insert_with(|| {
            encode_fields(&self.name, &self.meta_info, &self.content, &self.signature)
        })
    }

    fn invalidate(&mut self) {
        self.wire_encoding = None;
    }
}

/// Packets are equal when their fields are; the cache is not compared
impl PartialEq for Data {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.meta_info == other.meta_info
            && self.content == other.content
            && self.signature == other.signature
    }
}

impl Eq for Data {}

fn encode_fields(
    name: &Name,
    meta_info: &MetaInfo,
    content: &Blob,
    signature: &Signature,
) -> WireEncoding {
    let mut value = Vec::new();
    name.encode_to(&mut value);
    if !meta_info.is_default() {
        meta_info.encode_to(&mut value);
    }
    if !content.is_null() {
        encode_type_and_length(tlv_type::CONTENT, content.size(), &mut value);
        value.extend_from_slice(content);
    }
    signature.encode_info_to(&mut value);
    let signed_length = value.len();
    signature.encode_value_to(&mut value);

    let mut bytes = Vec::with_capacity(value.len() + 10);
    encode_type_and_length(tlv_type::DATA, value.len(), &mut bytes);
    let signed_begin = bytes.len();
    bytes.extend_from_slice(&value);

    if bytes.len() > MAX_NDN_PACKET_SIZE {
        warn!(
            "Encoded Data packet {} is {} bytes, above the {} byte limit",
            name,
            bytes.len(),
            MAX_NDN_PACKET_SIZE
        );
    }

    WireEncoding {
        bytes: Blob::new(bytes),
        signed_begin,
        signed_end: signed_begin + signed_length,
    }
}
