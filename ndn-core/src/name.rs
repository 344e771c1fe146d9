use std::fmt;
use std::str::FromStr;

use ndn_common::{tlv_type, MAX_NAME_COMPONENTS};

use crate::tlv::{encode_type_and_length, tlv_length, TlvDecoder, TlvError};

/// One opaque component of a [`Name`].
///
/// The bytes are never interpreted as text except by
/// [`NameComponent::to_escaped_string`].
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NameComponent {
    value: Vec<u8>,
}

impl NameComponent {
    pub fn new(value: impl Into<Vec<u8>>) -> Self {
        Self {
            value: value.into(),
        }
    }

    pub fn value(&self) -> &[u8] {
        &self.value
    }

    pub fn len(&self) -> usize {
        self.value.len()
    }

    pub fn is_empty(&self) -> bool {
        self.value.is_empty()
    }

    /// Parse one escaped URI segment such as `%00%09` or `DSK-123`
    pub fn from_escaped_str(escaped: &str) -> Result<Self, NameParseError> {
        if !escaped.is_empty() && escaped.bytes().all(|b| b == b'.') {
            // Three leading periods are the escape for all-period components
            return match escaped.len() {
                1 | 2 => Err(NameParseError::DotSegment(escaped.to_string())),
                _ => Ok(Self::new(vec![b'.'; escaped.len() - 3])),
            };
        }

        let bytes = escaped.as_bytes();
        let mut value = Vec::with_capacity(bytes.len());
        let mut i = 0;
        while i < bytes.len() {
            if bytes[i] == b'%' {
                let byte = escaped
                    .get(i + 1..i + 3)
                    .filter(|digits| digits.bytes().all(|b| b.is_ascii_hexdigit()))
                    .and_then(|digits| u8::from_str_radix(digits, 16).ok())
                    .ok_or_else(|| NameParseError::InvalidEscape(escaped.to_string()))?;
                value.push(byte);
                i += 3;
            } else {
                value.push(bytes[i]);
                i += 1;
            }
        }
        Ok(Self::new(value))
    }

    /// Render this component for use in a URI.
    ///
    /// A component made only of unreserved characters is written as text.
    /// Any other component is written entirely as `%XX` pairs. Components made
    /// only of periods are always escaped so they cannot be read back as `.`
    /// or `..` path segments, and the empty component is written as `...`.
    pub fn to_escaped_string(&self) -> String {
        if self.value.is_empty() {
            return "...".to_string();
        }

        let all_periods = self.value.iter().all(|&b| b == b'.');
        if !all_periods && self.value.iter().all(|&b| is_unreserved(b)) {
            // Unreserved bytes are ASCII
            return self.value.iter().map(|&b| b as char).collect();
        }

        self.value.iter().map(|b| format!("%{:02X}", b)).collect()
    }

    pub(crate) fn encode_to(&self, buffer: &mut Vec<u8>) {
        encode_type_and_length(tlv_type::NAME_COMPONENT, self.value.len(), buffer);
        buffer.extend_from_slice(&self.value);
    }

    pub(crate) fn encoded_length(&self) -> usize {
        tlv_length(tlv_type::NAME_COMPONENT, self.value.len())
    }

    pub(crate) fn decode(decoder: &mut TlvDecoder<'_>, end: usize) -> Result<Self, TlvError> {
        let value = decoder.read_blob_tlv(tlv_type::NAME_COMPONENT, end)?;
        Ok(Self::new(value))
    }
}

fn is_unreserved(b: u8) -> bool {
    b.is_ascii_alphanumeric() || matches!(b, b'-' | b'.' | b'_' | b'~' | b'+')
}

impl fmt::Display for NameComponent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_escaped_string())
    }
}

impl From<&str> for NameComponent {
    fn from(text: &str) -> Self {
        Self::new(text.as_bytes())
    }
}

impl From<Vec<u8>> for NameComponent {
    fn from(value: Vec<u8>) -> Self {
        Self::new(value)
    }
}

impl From<&[u8]> for NameComponent {
    fn from(value: &[u8]) -> Self {
        Self::new(value)
    }
}

/// Hierarchical name made of opaque binary components
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Name {
    components: Vec<NameComponent>,
}

impl Name {
    /// Create a new empty name
    pub fn new() -> Self {
        Self {
            components: Vec::new(),
        }
    }

    /// Parse a URI such as `/ndn/abc` or `ndn:/a/%00%09`
    pub fn from_uri(uri: &str) -> Result<Self, NameParseError> {
        let path = uri.trim();
        let path = path.strip_prefix("ndn:").unwrap_or(path);

        let mut name = Name::new();
        for segment in path.split('/').filter(|s| !s.is_empty()) {
            if name.len() == MAX_NAME_COMPONENTS {
                return Err(NameParseError::TooManyComponents(MAX_NAME_COMPONENTS));
            }
            name.components
                .push(NameComponent::from_escaped_str(segment)?);
        }
        Ok(name)
    }

    /// Append a component, returning `self` for chaining
    pub fn append(&mut self, component: impl Into<NameComponent>) -> &mut Self {
        self.components.push(component.into());
        self
    }

    /// Append every component of `other`
    pub fn append_name(&mut self, other: &Name) -> &mut Self {
        self.components.extend(other.components.iter().cloned());
        self
    }

    /// Get the number of components
    pub fn len(&self) -> usize {
        self.components.len()
    }

    /// Check if the name is empty
    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    pub fn components(&self) -> &[NameComponent] {
        &self.components
    }

    /// Get a component by index. A negative index counts from the end, so
    /// `get(-1)` is the last component.
    pub fn get(&self, index: isize) -> Option<&NameComponent> {
        let index = if index < 0 {
            self.len().checked_sub(index.unsigned_abs())?
        } else {
            index as usize
        };
        self.components.get(index)
    }

    /// Copy `count` components starting at `start`, clamped to the name
    pub fn get_sub_name(&self, start: usize, count: usize) -> Name {
        let start = start.min(self.len());
        let end = start.saturating_add(count).min(self.len());
        Name {
            components: self.components[start..end].to_vec(),
        }
    }

    /// Get a prefix of this name. A negative `length` drops that many
    /// components from the end.
    pub fn get_prefix(&self, length: isize) -> Name {
        let count = if length < 0 {
            self.len().saturating_sub(length.unsigned_abs())
        } else {
            length as usize
        };
        self.get_sub_name(0, count)
    }

    /// Check if this name is a prefix of another name
    pub fn is_prefix_of(&self, other: &Name) -> bool {
        self.len() <= other.len()
            && self
                .components
                .iter()
                .zip(other.components.iter())
                .all(|(a, b)| a == b)
    }

    /// Render the name as a URI path; the empty name is `/`
    pub fn to_uri(&self) -> String {
        if self.components.is_empty() {
            return "/".to_string();
        }

        let mut uri = String::new();
        for component in &self.components {
            uri.push('/');
            uri.push_str(&component.to_escaped_string());
        }
        uri
    }

    /// Encode the name as a `Name` TLV appended to `buffer`
    pub fn encode_to(&self, buffer: &mut Vec<u8>) {
        let value_length = self.value_length();
        encode_type_and_length(tlv_type::NAME, value_length, buffer);
        for component in &self.components {
            component.encode_to(buffer);
        }
    }

    /// Encode name to TLV format
    pub fn encode(&self) -> Vec<u8> {
        let mut buffer = Vec::with_capacity(tlv_length(tlv_type::NAME, self.value_length()));
        self.encode_to(&mut buffer);
        buffer
    }

    /// Decode name from TLV format, returning the bytes consumed
    pub fn decode(data: &[u8]) -> Result<(Self, usize), TlvError> {
        let mut decoder = TlvDecoder::new(data);
        let name = Self::decode_from(&mut decoder, data.len())?;
        Ok((name, decoder.offset()))
    }

    pub(crate) fn decode_from(decoder: &mut TlvDecoder<'_>, end: usize) -> Result<Self, TlvError> {
        let name_end = decoder.read_nested_tlvs_start(tlv_type::NAME, end)?;
        let mut name = Name::new();
        while decoder.offset() < name_end {
            name.components
                .push(NameComponent::decode(decoder, name_end)?);
        }
        Ok(name)
    }

    fn value_length(&self) -> usize {
        self.components.iter().map(|c| c.encoded_length()).sum()
    }
}

impl FromStr for Name {
    type Err = NameParseError;

    fn from_str(uri: &str) -> Result<Self, Self::Err> {
        Name::from_uri(uri)
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_uri())
    }
}

impl FromIterator<NameComponent> for Name {
    fn from_iter<I: IntoIterator<Item = NameComponent>>(iter: I) -> Self {
        Self {
            components: iter.into_iter().collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NameParseError {
    #[error("Invalid percent escape in name component: {0}")]
    InvalidEscape(String),
    #[error("Relative path segment {0:?} is not a valid name component")]
    DotSegment(String),
    #[error("Name has more than {0} components")]
    TooManyComponents(usize),
}
