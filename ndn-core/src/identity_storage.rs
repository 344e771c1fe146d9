use std::collections::HashMap;

use async_trait::async_trait;
use log::debug;
use tokio::sync::RwLock;

use crate::blob::Blob;
use crate::name::Name;
use crate::security::{KeyType, SecurityError};

/// Public key storage consulted by signing and verification
#[async_trait]
pub trait IdentityStorage: Send + Sync {
    /// Store a public key. Fails if `key_name` is already present.
    async fn add_key(
        &self,
        key_name: &Name,
        key_type: KeyType,
        public_key_der: Blob,
    ) -> Result<(), SecurityError>;

    /// DER public key stored under `key_name`
    async fn get_key(&self, key_name: &Name) -> Option<Blob>;

    async fn does_key_exist(&self, key_name: &Name) -> bool;

    async fn get_key_type(&self, key_name: &Name) -> Option<KeyType>;
}

#[derive(Debug, Clone)]
struct KeyRecord {
    key_type: KeyType,
    public_key_der: Blob,
}

/// In-memory [`IdentityStorage`]
#[derive(Debug, Default)]
pub struct MemoryIdentityStorage {
    keys: RwLock<HashMap<Name, KeyRecord>>,
}

impl MemoryIdentityStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl IdentityStorage for MemoryIdentityStorage {
    async fn add_key(
        &self,
        key_name: &Name,
        key_type: KeyType,
        public_key_der: Blob,
    ) -> Result<(), SecurityError> {
        let mut keys = self.keys.write().await;
        if keys.contains_key(key_name) {
            return Err(SecurityError::KeyAlreadyExists(key_name.clone()));
        }

        debug!("Adding {:?} public key {}", key_type, key_name);
        keys.insert(
            key_name.clone(),
            KeyRecord {
                key_type,
                public_key_der,
            },
        );
        Ok(())
    }

    async fn get_key(&self, key_name: &Name) -> Option<Blob> {
        self.keys
            .read()
            .await
            .get(key_name)
            .map(|record| record.public_key_der.clone())
    }

    async fn does_key_exist(&self, key_name: &Name) -> bool {
        self.keys.read().await.contains_key(key_name)
    }

    async fn get_key_type(&self, key_name: &Name) -> Option<KeyType> {
        self.keys
            .read()
            .await
            .get(key_name)
            .map(|record| record.key_type)
    }
}
