use std::collections::HashMap;
use std::sync::RwLock;

use log::debug;
use rsa::RsaPrivateKey;

use crate::blob::Blob;
use crate::name::Name;
use crate::security::{self, KeyType, SecurityError};

/// Private key storage used by the signing path
pub trait PrivateKeyStorage: Send + Sync {
    /// Store a key pair given as (SubjectPublicKeyInfo, PKCS#1) DER
    fn set_key_pair_for_key_name(
        &self,
        key_name: &Name,
        key_type: KeyType,
        public_key_der: &[u8],
        private_key_der: &[u8],
    ) -> Result<(), SecurityError>;

    /// The stored (public, private) DER pair
    fn get_key_pair_for_key_name(&self, key_name: &Name) -> Result<(Blob, Blob), SecurityError>;

    fn does_key_exist(&self, key_name: &Name) -> bool;

    /// Sign `data` with the private key of `key_name`
    fn sign(&self, data: &[u8], key_name: &Name) -> Result<Blob, SecurityError>;

    /// Generate and store a new key pair, returning the public key DER
    fn generate_key_pair(
        &self,
        key_name: &Name,
        key_type: KeyType,
        bits: usize,
    ) -> Result<Blob, SecurityError>;
}

struct StoredKeyPair {
    public_key_der: Blob,
    private_key_der: Blob,
    private_key: RsaPrivateKey,
}

/// In-memory [`PrivateKeyStorage`] holding RSA keys
#[derive(Default)]
pub struct MemoryPrivateKeyStorage {
    keys: RwLock<HashMap<Name, StoredKeyPair>>,
}

impl MemoryPrivateKeyStorage {
    pub fn new() -> Self {
        Self::default()
    }

    fn insert(
        &self,
        key_name: &Name,
        public_key_der: Blob,
        private_key_der: Blob,
    ) -> Result<(), SecurityError> {
        let private_key = security::parse_private_key(&private_key_der)?;
        // Reject a public key that cannot be parsed
        security::parse_public_key(&public_key_der)?;

        let mut keys = self.keys.write().map_err(|_| SecurityError::StoragePoisoned)?;
        debug!("Storing key pair for {}", key_name);
        keys.insert(
            key_name.clone(),
            StoredKeyPair {
                public_key_der,
                private_key_der,
                private_key,
            },
        );
        Ok(())
    }
}

impl PrivateKeyStorage for MemoryPrivateKeyStorage {
    fn set_key_pair_for_key_name(
        &self,
        key_name: &Name,
        key_type: KeyType,
        public_key_der: &[u8],
        private_key_der: &[u8],
    ) -> Result<(), SecurityError> {
        if key_type != KeyType::Rsa {
            return Err(SecurityError::UnsupportedKeyType(key_type));
        }
        self.insert(key_name, Blob::new(public_key_der), Blob::new(private_key_der))
    }

    fn get_key_pair_for_key_name(&self, key_name: &Name) -> Result<(Blob, Blob), SecurityError> {
        let keys = self.keys.read().map_err(|_| SecurityError::StoragePoisoned)?;
        keys.get(key_name)
            .map(|pair| (pair.public_key_der.clone(), pair.private_key_der.clone()))
            .ok_or_else(|| SecurityError::KeyNotFound(key_name.clone()))
    }

    fn does_key_exist(&self, key_name: &Name) -> bool {
        self.keys
            .read()
            .map(|keys| keys.contains_key(key_name))
            .unwrap_or(false)
    }

    fn sign(&self, data: &[u8], key_name: &Name) -> Result<Blob, SecurityError> {
        let keys = self.keys.read().map_err(|_| SecurityError::StoragePoisoned)?;
        let pair = keys
            .get(key_name)
            .ok_or_else(|| SecurityError::KeyNotFound(key_name.clone()))?;
        Ok(security::sign_with_rsa(data, &pair.private_key))
    }

    fn generate_key_pair(
        &self,
        key_name: &Name,
        key_type: KeyType,
        bits: usize,
    ) -> Result<Blob, SecurityError> {
        if key_type != KeyType::Rsa {
            return Err(SecurityError::UnsupportedKeyType(key_type));
        }
        let (public_key_der, private_key_der) = security::generate_rsa_key_pair(bits)?;
        self.insert(key_name, public_key_der.clone(), private_key_der)?;
        Ok(public_key_der)
    }
}
