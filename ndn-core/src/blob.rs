use std::fmt;
use std::ops::Deref;
use std::sync::Arc;

/// Immutable, cheaply clonable byte buffer.
///
/// A blob may be *null* (no buffer at all), which is distinct from holding a
/// zero-length buffer. Unsigned packets report a null signature value, while
/// a packet whose content was explicitly set to nothing holds an empty blob.
#[derive(Clone, Default, PartialEq, Eq, Hash)]
pub struct Blob {
    buf: Option<Arc<[u8]>>,
}

impl Blob {
    /// A blob without a buffer
    pub const fn null() -> Self {
        Self { buf: None }
    }

    /// A non-null blob with zero bytes
    pub fn empty() -> Self {
        Self {
            buf: Some(Arc::from(Vec::new())),
        }
    }

    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            buf: Some(Arc::from(bytes.into())),
        }
    }

    pub fn is_null(&self) -> bool {
        self.buf.is_none()
    }

    /// Number of bytes, 0 for a null blob
    pub fn size(&self) -> usize {
        self.buf.as_ref().map_or(0, |b| b.len())
    }

    /// The bytes of this blob, empty for a null blob
    pub fn buf(&self) -> &[u8] {
        self.buf.as_deref().unwrap_or(&[])
    }

    /// Lower-case hex rendering of the bytes
    pub fn to_hex(&self) -> String {
        hex::encode(self.buf())
    }
}

impl Deref for Blob {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        self.buf()
    }
}

impl AsRef<[u8]> for Blob {
    fn as_ref(&self) -> &[u8] {
        self.buf()
    }
}

impl From<Vec<u8>> for Blob {
    fn from(bytes: Vec<u8>) -> Self {
        Self::new(bytes)
    }
}

impl From<&[u8]> for Blob {
    fn from(bytes: &[u8]) -> Self {
        Self::new(bytes)
    }
}

impl From<&str> for Blob {
    fn from(text: &str) -> Self {
        Self::new(text.as_bytes())
    }
}

impl fmt::Debug for Blob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.buf {
            None => write!(f, "Blob(null)"),
            Some(_) => write!(f, "Blob({})", self.to_hex()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_null_is_not_empty() {
        let null = Blob::null();
        let empty = Blob::empty();

        assert!(null.is_null());
        assert!(!empty.is_null());
        assert_eq!(null.size(), 0);
        assert_eq!(empty.size(), 0);
        assert_ne!(null, empty);
        assert_eq!(Blob::default(), null);
    }

    #[test]
    fn test_hex_and_clone_sharing() {
        let blob = Blob::from("SUCCESS!");
        assert_eq!(blob.to_hex(), "5355434345535321");

        let copy = blob.clone();
        assert_eq!(copy.buf().as_ptr(), blob.buf().as_ptr());
        assert_eq!(&*copy, b"SUCCESS!");
    }
}
