use std::sync::Arc;

use log::{debug, info};
use ndn_common::certificate::{ID_CERT_COMPONENT, KEY_COMPONENT};

use crate::blob::Blob;
use crate::data::Data;
use crate::identity_storage::IdentityStorage;
use crate::name::Name;
use crate::private_key_storage::PrivateKeyStorage;
use crate::security::{KeyType, SecurityError};
use crate::signature::{KeyLocator, Signature};

/// Ties public key storage to private key storage and performs the actual
/// certificate-based signing of packets
pub struct IdentityManager {
    identity_storage: Arc<dyn IdentityStorage>,
    private_key_storage: Arc<dyn PrivateKeyStorage>,
}

impl IdentityManager {
    pub fn new(
        identity_storage: Arc<dyn IdentityStorage>,
        private_key_storage: Arc<dyn PrivateKeyStorage>,
    ) -> Self {
        Self {
            identity_storage,
            private_key_storage,
        }
    }

    pub fn identity_storage(&self) -> &Arc<dyn IdentityStorage> {
        &self.identity_storage
    }

    pub fn private_key_storage(&self) -> &Arc<dyn PrivateKeyStorage> {
        &self.private_key_storage
    }

    /// Key name referenced by a certificate name.
    ///
    /// `/a/KEY/b/ID-CERT/<version>` maps to `/a/b`. The version is optional,
    /// so a KeyLocator name such as `/a/KEY/b/ID-CERT` maps the same way.
    pub fn certificate_name_to_key_name(certificate_name: &Name) -> Result<Name, SecurityError> {
        let (key_index, id_cert_index) = Self::certificate_markers(certificate_name)?;

        let mut key_name = certificate_name.get_sub_name(0, key_index);
        key_name.append_name(
            &certificate_name.get_sub_name(key_index + 1, id_cert_index - key_index - 1),
        );
        Ok(key_name)
    }

    /// Certificate name without its version, ending in `ID-CERT`. This is
    /// the name written into the KeyLocator of signed packets.
    pub fn certificate_name_without_version(
        certificate_name: &Name,
    ) -> Result<Name, SecurityError> {
        let (_, id_cert_index) = Self::certificate_markers(certificate_name)?;
        Ok(certificate_name.get_sub_name(0, id_cert_index + 1))
    }

    /// Positions of the `KEY` component and the `ID-CERT` component after it
    fn certificate_markers(certificate_name: &Name) -> Result<(usize, usize), SecurityError> {
        let components = certificate_name.components();
        let invalid = || SecurityError::InvalidCertificateName(certificate_name.clone());

        let key_index = components
            .iter()
            .position(|c| c.value() == KEY_COMPONENT)
            .ok_or_else(invalid)?;
        let id_cert_index = components[key_index + 1..]
            .iter()
            .position(|c| c.value() == ID_CERT_COMPONENT)
            .map(|i| key_index + 1 + i)
            .ok_or_else(invalid)?;
        Ok((key_index, id_cert_index))
    }

    /// Sign `data` with the key behind `certificate_name`.
    ///
    /// The signed portion covers a SignatureInfo whose KeyLocator names the
    /// certificate up to its `ID-CERT` component, dropping any version. The packet is only
    /// modified once the signature has been computed.
    pub fn sign_by_certificate(
        &self,
        data: &mut Data,
        certificate_name: &Name,
    ) -> Result<(), SecurityError> {
        let key_name = Self::certificate_name_to_key_name(certificate_name)?;
        let key_locator_name = Self::certificate_name_without_version(certificate_name)?;
        if !self.private_key_storage.does_key_exist(&key_name) {
            return Err(SecurityError::KeyNotFound(key_name));
        }

        let signature = Signature::Sha256WithRsa {
            key_locator: KeyLocator::KeyName(key_locator_name),
            signature: Blob::null(),
        };
        let signed_portion = data.signed_portion_with(&signature);
        let value = self.private_key_storage.sign(&signed_portion, &key_name)?;

        debug!(
            "Signed {} with {} ({} byte signature)",
            data.name(),
            key_name,
            value.size()
        );
        data.set_signature(signature.with_signature_value(value));
        Ok(())
    }

    /// Generate an RSA key pair and register it in both storages
    pub async fn generate_rsa_key_pair(
        &self,
        key_name: &Name,
        bits: usize,
    ) -> Result<Blob, SecurityError> {
        if self.identity_storage.does_key_exist(key_name).await {
            return Err(SecurityError::KeyAlreadyExists(key_name.clone()));
        }

        let public_key_der =
            self.private_key_storage
                .generate_key_pair(key_name, KeyType::Rsa, bits)?;
        self.identity_storage
            .add_key(key_name, KeyType::Rsa, public_key_der.clone())
            .await?;

        info!("Generated {}-bit RSA key {}", bits, key_name);
        Ok(public_key_der)
    }
}
