use std::convert::TryInto;

use ndn_common::tlv_type;
use ndn_common::var_number::{
    EIGHT_BYTE_MARKER, FOUR_BYTE_MARKER, ONE_BYTE_LIMIT, TWO_BYTE_MARKER,
};

/// TLV (Type-Length-Value) codec for NDN packet serialization
///
/// Wire format:
/// - Type: variable-length number (1, 3, 5 or 9 bytes)
/// - Length: variable-length number (1, 3, 5 or 9 bytes)
/// - Value: `Length` bytes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TlvElement {
    pub type_: u64,
    pub value: Vec<u8>,
}

/// Errors that can occur during TLV encoding/decoding
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TlvError {
    #[error("Buffer too short: needed {needed} bytes at offset {offset}, have {available}")]
    BufferTooShort {
        offset: usize,
        needed: usize,
        available: usize,
    },
    #[error("Element at offset {offset} ends at {end}, past its parent's end {parent_end}")]
    LengthExceedsParent {
        offset: usize,
        end: usize,
        parent_end: usize,
    },
    #[error("Expected TLV type {expected:#x}, got {actual:#x}")]
    UnexpectedType { expected: u64, actual: u64 },
    #[error("Unrecognized critical TLV type {0:#x}")]
    UnrecognizedCriticalType(u64),
    #[error("Invalid non-negative integer width: {0} bytes")]
    InvalidNonNegativeInteger(usize),
    #[error("Missing required element: {0}")]
    MissingElement(&'static str),
    #[error("Element not allowed here: {0}")]
    UnexpectedElement(&'static str),
    #[error("Unsupported signature type: {0}")]
    UnsupportedSignatureType(u64),
    #[error("Value too large for this platform: {0}")]
    ValueTooLarge(u64),
}

/// Position of one decoded TLV inside a buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TlvHeader {
    pub tlv_type: u64,
    pub length: usize,
    pub value_offset: usize,
    pub next_offset: usize,
}

impl TlvElement {
    /// Create a new TLV element
    pub fn new(type_: u64, value: Vec<u8>) -> Self {
        Self { type_, value }
    }

    /// Get the total encoded length of this TLV element
    pub fn encoded_length(&self) -> usize {
        tlv_length(self.type_, self.value.len())
    }

    /// Encode this TLV element to bytes
    pub fn encode(&self) -> Vec<u8> {
        let mut buffer = Vec::with_capacity(self.encoded_length());
        self.encode_to(&mut buffer);
        buffer
    }

    /// Append the encoding of this TLV element to `buffer`
    pub fn encode_to(&self, buffer: &mut Vec<u8>) {
        encode_type_and_length(self.type_, self.value.len(), buffer);
        buffer.extend_from_slice(&self.value);
    }

    /// Decode a TLV element from the start of `data`, returning it with the
    /// number of bytes consumed
    pub fn decode(data: &[u8]) -> Result<(Self, usize), TlvError> {
        let header = decode_tlv(data, 0)?;
        let value = data[header.value_offset..header.next_offset].to_vec();
        Ok((TlvElement::new(header.tlv_type, value), header.next_offset))
    }
}

/// Number of bytes needed to encode `value` as a variable-length number
pub fn var_number_size(value: u64) -> usize {
    if value < ONE_BYTE_LIMIT {
        1
    } else if value <= u16::MAX as u64 {
        3
    } else if value <= u32::MAX as u64 {
        5
    } else {
        9
    }
}

/// Append `value` using the NDN variable-length number encoding
pub fn encode_var_number(value: u64, buffer: &mut Vec<u8>) {
    if value < ONE_BYTE_LIMIT {
        buffer.push(value as u8);
    } else if value <= u16::MAX as u64 {
        buffer.push(TWO_BYTE_MARKER);
        buffer.extend_from_slice(&(value as u16).to_be_bytes());
    } else if value <= u32::MAX as u64 {
        buffer.push(FOUR_BYTE_MARKER);
        buffer.extend_from_slice(&(value as u32).to_be_bytes());
    } else {
        buffer.push(EIGHT_BYTE_MARKER);
        buffer.extend_from_slice(&value.to_be_bytes());
    }
}

/// Decode a variable-length number at `offset`, returning the value and the
/// offset just past it
pub fn decode_var_number(data: &[u8], offset: usize) -> Result<(u64, usize), TlvError> {
    let first_byte = *data.get(offset).ok_or(TlvError::BufferTooShort {
        offset,
        needed: 1,
        available: data.len().saturating_sub(offset),
    })?;

    let width = match first_byte {
        TWO_BYTE_MARKER => 2,
        FOUR_BYTE_MARKER => 4,
        EIGHT_BYTE_MARKER => 8,
        _ => return Ok((first_byte as u64, offset + 1)),
    };

    let start = offset + 1;
    let bytes = checked_slice(data, start, width)?;
    let value = match width {
        2 => u16::from_be_bytes(to_array(bytes)?) as u64,
        4 => u32::from_be_bytes(to_array(bytes)?) as u64,
        _ => u64::from_be_bytes(to_array(bytes)?),
    };
    Ok((value, start + width))
}

/// Append the type and length fields of a TLV
pub fn encode_type_and_length(tlv_type: u64, length: usize, buffer: &mut Vec<u8>) {
    encode_var_number(tlv_type, buffer);
    encode_var_number(length as u64, buffer);
}

/// Total encoded size of a TLV with the given type and value length
pub fn tlv_length(tlv_type: u64, value_length: usize) -> usize {
    var_number_size(tlv_type) + var_number_size(value_length as u64) + value_length
}

/// Encode a single TLV triple
pub fn encode_tlv(tlv_type: u64, value: &[u8]) -> Vec<u8> {
    let mut buffer = Vec::with_capacity(tlv_length(tlv_type, value.len()));
    encode_type_and_length(tlv_type, value.len(), &mut buffer);
    buffer.extend_from_slice(value);
    buffer
}

/// Decode the TLV starting at `offset`.
///
/// The declared value must lie entirely inside `data`; nothing is read past
/// the end of the buffer.
pub fn decode_tlv(data: &[u8], offset: usize) -> Result<TlvHeader, TlvError> {
    let (tlv_type, after_type) = decode_var_number(data, offset)?;
    let (length, value_offset) = decode_var_number(data, after_type)?;
    let length = usize::try_from(length).map_err(|_| TlvError::ValueTooLarge(length))?;
    checked_slice(data, value_offset, length)?;

    Ok(TlvHeader {
        tlv_type,
        length,
        value_offset,
        next_offset: value_offset + length,
    })
}

/// Encode a non-negative integer using the shortest of 1, 2, 4 or 8 bytes
pub fn encode_non_negative_integer(value: u64) -> Vec<u8> {
    if value <= u8::MAX as u64 {
        vec![value as u8]
    } else if value <= u16::MAX as u64 {
        (value as u16).to_be_bytes().to_vec()
    } else if value <= u32::MAX as u64 {
        (value as u32).to_be_bytes().to_vec()
    } else {
        value.to_be_bytes().to_vec()
    }
}

/// Decode a non-negative integer value of 1, 2, 4 or 8 bytes
pub fn decode_non_negative_integer(value: &[u8]) -> Result<u64, TlvError> {
    match value.len() {
        1 => Ok(value[0] as u64),
        2 => Ok(u16::from_be_bytes(to_array(value)?) as u64),
        4 => Ok(u32::from_be_bytes(to_array(value)?) as u64),
        8 => Ok(u64::from_be_bytes(to_array(value)?)),
        other => Err(TlvError::InvalidNonNegativeInteger(other)),
    }
}

/// Encode multiple TLV elements into a single buffer
pub fn encode_tlv_sequence(elements: &[TlvElement]) -> Vec<u8> {
    let total_size = elements.iter().map(|e| e.encoded_length()).sum();
    let mut buffer = Vec::with_capacity(total_size);

    for element in elements {
        element.encode_to(&mut buffer);
    }

    buffer
}

/// Decode multiple TLV elements from a buffer
pub fn decode_tlv_sequence(data: &[u8]) -> Result<Vec<TlvElement>, TlvError> {
    let mut elements = Vec::new();
    let mut offset = 0;

    while offset < data.len() {
        let header = decode_tlv(data, offset)?;
        elements.push(TlvElement::new(
            header.tlv_type,
            data[header.value_offset..header.next_offset].to_vec(),
        ));
        offset = header.next_offset;
    }

    Ok(elements)
}

fn checked_slice(data: &[u8], offset: usize, length: usize) -> Result<&[u8], TlvError> {
    offset
        .checked_add(length)
        .and_then(|end| data.get(offset..end))
        .ok_or(TlvError::BufferTooShort {
            offset,
            needed: length,
            available: data.len().saturating_sub(offset),
        })
}

fn to_array<const N: usize>(bytes: &[u8]) -> Result<[u8; N], TlvError> {
    bytes
        .try_into()
        .map_err(|_| TlvError::InvalidNonNegativeInteger(bytes.len()))
}

/// Cursor for recursive decoding of nested TLV blocks.
///
/// Every nested read is checked against the end offset of its parent, so a
/// child can never claim bytes that belong to a sibling of its parent.
#[derive(Debug)]
pub struct TlvDecoder<'a> {
    input: &'a [u8],
    offset: usize,
}

impl<'a> TlvDecoder<'a> {
    pub fn new(input: &'a [u8]) -> Self {
        Self { input, offset: 0 }
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn input(&self) -> &'a [u8] {
        self.input
    }

    /// Read the header of a TLV of `expected_type` lying before `end` and
    /// return the offset where its value ends. The cursor is left at the
    /// start of the value.
    pub fn read_nested_tlvs_start(
        &mut self,
        expected_type: u64,
        end: usize,
    ) -> Result<usize, TlvError> {
        let header = self.read_header_within(end)?;
        if header.tlv_type != expected_type {
            return Err(TlvError::UnexpectedType {
                expected: expected_type,
                actual: header.tlv_type,
            });
        }
        self.offset = header.value_offset;
        Ok(header.next_offset)
    }

    /// Skip the remaining children of a nested block, failing on any
    /// unrecognized critical element
    pub fn finish_nested_tlvs(&mut self, end: usize) -> Result<(), TlvError> {
        while self.offset < end {
            let header = self.read_header_within(end)?;
            if tlv_type::is_critical(header.tlv_type) {
                return Err(TlvError::UnrecognizedCriticalType(header.tlv_type));
            }
            self.offset = header.next_offset;
        }
        Ok(())
    }

    /// Whether the next element before `end` has type `tlv_type`.
    ///
    /// Unrecognized non-critical elements in between are skipped.
    pub fn peek_type(&mut self, tlv_type: u64, end: usize) -> Result<bool, TlvError> {
        while self.offset < end {
            let header = self.read_header_within(end)?;
            if header.tlv_type == tlv_type {
                return Ok(true);
            }
            if tlv_type::is_critical(header.tlv_type) {
                return Ok(false);
            }
            self.offset = header.next_offset;
        }
        Ok(false)
    }

    /// Read a TLV of `expected_type` lying before `end` and return its value
    pub fn read_blob_tlv(&mut self, expected_type: u64, end: usize) -> Result<&'a [u8], TlvError> {
        let value_end = self.read_nested_tlvs_start(expected_type, end)?;
        let value = &self.input[self.offset..value_end];
        self.offset = value_end;
        Ok(value)
    }

    /// Read the value of an optional TLV of `expected_type` before `end`
    pub fn read_optional_blob_tlv(
        &mut self,
        expected_type: u64,
        end: usize,
    ) -> Result<Option<&'a [u8]>, TlvError> {
        if self.peek_type(expected_type, end)? {
            let header = self.read_header_within(end)?;
            let value = &self.input[header.value_offset..header.next_offset];
            self.offset = header.next_offset;
            Ok(Some(value))
        } else {
            Ok(None)
        }
    }

    /// Read a TLV of `expected_type` holding a non-negative integer
    pub fn read_non_negative_integer_tlv(
        &mut self,
        expected_type: u64,
        end: usize,
    ) -> Result<u64, TlvError> {
        decode_non_negative_integer(self.read_blob_tlv(expected_type, end)?)
    }

    /// Read an optional TLV of `expected_type` holding a non-negative integer
    pub fn read_optional_non_negative_integer_tlv(
        &mut self,
        expected_type: u64,
        end: usize,
    ) -> Result<Option<u64>, TlvError> {
        self.read_optional_blob_tlv(expected_type, end)?
            .map(decode_non_negative_integer)
            .transpose()
    }

    fn read_header_within(&self, end: usize) -> Result<TlvHeader, TlvError> {
        let bounded = &self.input[..end.min(self.input.len())];
        decode_tlv(bounded, self.offset).map_err(|e| match decode_tlv(self.input, self.offset) {
            Ok(unbounded) => TlvError::LengthExceedsParent {
                offset: self.offset,
                end: unbounded.next_offset,
                parent_end: end,
            },
            Err(_) => e,
        })
    }
}
