use std::time::Duration;

use ndn_common::{content_type, tlv_type};

use crate::name::NameComponent;
use crate::tlv::{
    encode_non_negative_integer, encode_type_and_length, tlv_length, TlvDecoder, TlvError,
};

/// Content type carried in MetaInfo
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum ContentType {
    #[default]
    Blob,
    Link,
    Key,
    /// A code this implementation does not interpret
    Other(u64),
}

impl ContentType {
    pub fn code(self) -> u64 {
        match self {
            ContentType::Blob => content_type::BLOB,
            ContentType::Link => content_type::LINK,
            ContentType::Key => content_type::KEY,
            ContentType::Other(code) => code,
        }
    }
}

impl From<u64> for ContentType {
    fn from(code: u64) -> Self {
        match code {
            content_type::BLOB => ContentType::Blob,
            content_type::LINK => ContentType::Link,
            content_type::KEY => ContentType::Key,
            other => ContentType::Other(other),
        }
    }
}

/// Optional metadata of a Data packet
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct MetaInfo {
    content_type: ContentType,
    freshness_period: Option<Duration>,
    final_block_id: Option<NameComponent>,
}

impl MetaInfo {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn content_type(&self) -> ContentType {
        self.content_type
    }

    pub fn set_content_type(&mut self, content_type: ContentType) -> &mut Self {
        self.content_type = content_type;
        self
    }

    /// Freshness period; `None` means the field is absent, which is not the
    /// same as a zero period
    pub fn freshness_period(&self) -> Option<Duration> {
        self.freshness_period
    }

    pub fn set_freshness_period(&mut self, period: Option<Duration>) -> &mut Self {
        self.freshness_period = period;
        self
    }

    pub fn final_block_id(&self) -> Option<&NameComponent> {
        self.final_block_id.as_ref()
    }

    pub fn set_final_block_id(&mut self, final_block_id: Option<NameComponent>) -> &mut Self {
        self.final_block_id = final_block_id;
        self
    }

    /// Whether encoding would produce an empty MetaInfo block
    pub fn is_default(&self) -> bool {
        self.content_type == ContentType::Blob
            && self.freshness_period.is_none()
            && self.final_block_id.is_none()
    }

    pub(crate) fn encode_to(&self, buffer: &mut Vec<u8>) {
        let mut value = Vec::new();

        if self.content_type != ContentType::Blob {
            let code = encode_non_negative_integer(self.content_type.code());
            encode_type_and_length(tlv_type::CONTENT_TYPE, code.len(), &mut value);
            value.extend_from_slice(&code);
        }

        if let Some(period) = self.freshness_period {
            // Periods beyond u64 milliseconds saturate
            let millis = u64::try_from(period.as_millis()).unwrap_or(u64::MAX);
            let millis = encode_non_negative_integer(millis);
            encode_type_and_length(tlv_type::FRESHNESS_PERIOD, millis.len(), &mut value);
            value.extend_from_slice(&millis);
        }

        if let Some(component) = &self.final_block_id {
            encode_type_and_length(
                tlv_type::FINAL_BLOCK_ID,
                tlv_length(tlv_type::NAME_COMPONENT, component.len()),
                &mut value,
            );
            component.encode_to(&mut value);
        }

        encode_type_and_length(tlv_type::META_INFO, value.len(), buffer);
        buffer.extend_from_slice(&value);
    }

    pub(crate) fn decode_from(decoder: &mut TlvDecoder<'_>, end: usize) -> Result<Self, TlvError> {
        let meta_end = decoder.read_nested_tlvs_start(tlv_type::META_INFO, end)?;

        let content_type = decoder
            .read_optional_non_negative_integer_tlv(tlv_type::CONTENT_TYPE, meta_end)?
            .map(ContentType::from)
            .unwrap_or_default();
        let freshness_period = decoder
            .read_optional_non_negative_integer_tlv(tlv_type::FRESHNESS_PERIOD, meta_end)?
            .map(Duration::from_millis);

        let final_block_id = if decoder.peek_type(tlv_type::FINAL_BLOCK_ID, meta_end)? {
            let block_end = decoder.read_nested_tlvs_start(tlv_type::FINAL_BLOCK_ID, meta_end)?;
            let component = NameComponent::decode(decoder, block_end)?;
            decoder.finish_nested_tlvs(block_end)?;
            Some(component)
        } else {
            None
        };

        decoder.finish_nested_tlvs(meta_end)?;

        Ok(Self {
            content_type,
            freshness_period,
            final_block_id,
        })
    }
}
