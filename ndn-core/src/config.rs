use std::{fs, path::Path, time::Duration};

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::name::{Name, NameParseError};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeyChainConfig {
    /// Certificate used by `KeyChain::sign_with_default`, as a URI
    pub default_certificate_name: Option<String>,
    /// Modulus size for generated RSA keys
    pub rsa_key_bits: usize,
    /// Upper bound on key resolution during verification
    pub key_resolution_timeout_ms: u64,
}

impl Default for KeyChainConfig {
    fn default() -> Self {
        Self {
            default_certificate_name: None,
            rsa_key_bits: 2048,
            key_resolution_timeout_ms: 4000,
        }
    }
}

impl KeyChainConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config: KeyChainConfig = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        Ok(config)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> anyhow::Result<()> {
        let path = path.as_ref();
        let contents = toml::to_string_pretty(self)?;
        fs::write(path, contents)
            .with_context(|| format!("Failed to write config file {}", path.display()))?;
        Ok(())
    }

    pub fn key_resolution_timeout(&self) -> Duration {
        Duration::from_millis(self.key_resolution_timeout_ms)
    }

    /// Parsed default certificate name, if one is configured
    pub fn default_certificate(&self) -> Result<Option<Name>, NameParseError> {
        self.default_certificate_name
            .as_deref()
            .map(Name::from_uri)
            .transpose()
    }
}
