use std::sync::Arc;

use log::{debug, info, warn};
use tokio::task::JoinHandle;

use crate::blob::Blob;
use crate::config::KeyChainConfig;
use crate::data::Data;
use crate::identity_manager::IdentityManager;
use crate::name::Name;
use crate::policy::{PolicyDecision, PolicyManager, VerificationFailure, VerificationOutcome};
use crate::security::{self, SecurityError};
use crate::signature::Signature;

/// Signs packets through an [`IdentityManager`] and verifies them under a
/// [`PolicyManager`]
#[derive(Clone)]
pub struct KeyChain {
    identity_manager: Arc<IdentityManager>,
    policy_manager: Arc<dyn PolicyManager>,
    config: KeyChainConfig,
}

impl KeyChain {
    pub fn new(
        identity_manager: Arc<IdentityManager>,
        policy_manager: Arc<dyn PolicyManager>,
        config: KeyChainConfig,
    ) -> Self {
        Self {
            identity_manager,
            policy_manager,
            config,
        }
    }

    pub fn identity_manager(&self) -> &Arc<IdentityManager> {
        &self.identity_manager
    }

    pub fn config(&self) -> &KeyChainConfig {
        &self.config
    }

    /// Sign `data` with the key behind `certificate_name`.
    ///
    /// On error the packet's signature and cached encoding are untouched.
    pub fn sign(&self, data: &mut Data, certificate_name: &Name) -> Result<(), SecurityError> {
        if !self
            .policy_manager
            .check_signing_policy(data.name(), certificate_name)
        {
            return Err(SecurityError::SigningRejected {
                data_name: data.name().clone(),
                certificate_name: certificate_name.clone(),
            });
        }

        self.identity_manager
            .sign_by_certificate(data, certificate_name)
    }

    /// Sign `data` with the configured default certificate
    pub fn sign_with_default(&self, data: &mut Data) -> Result<(), SecurityError> {
        let certificate_name = self
            .config
            .default_certificate()?
            .ok_or(SecurityError::NoDefaultCertificate)?;
        self.sign(data, &certificate_name)
    }

    /// Install a DigestSha256 signature over the packet's signed portion
    pub fn sign_with_sha256(&self, data: &mut Data) {
        let signature = Signature::DigestSha256 {
            signature: Blob::null(),
        };
        let digest = security::sha256_digest(&data.signed_portion_with(&signature));
        data.set_signature(signature.with_signature_value(digest));
    }

    /// Generate an RSA key of the configured size and register it
    pub async fn generate_rsa_key_pair(&self, key_name: &Name) -> Result<Blob, SecurityError> {
        self.identity_manager
            .generate_rsa_key_pair(key_name, self.config.rsa_key_bits)
            .await
    }

    /// Verify `data` under the active policy. The packet is handed back in
    /// the outcome.
    pub async fn verify_data(&self, mut data: Data) -> VerificationOutcome {
        debug!("Verifying {}", data.name());
        match self.check_signature(&mut data).await {
            Ok(()) => {
                info!("Verified {}", data.name());
                VerificationOutcome::Verified(data)
            }
            Err(failure) => {
                warn!("Verification of {} failed: {}", data.name(), failure);
                VerificationOutcome::Failed(data, failure)
            }
        }
    }

    /// Run [`KeyChain::verify_data`] on the tokio runtime and report the
    /// outcome through exactly one of the two callbacks, exactly once
    pub fn verify_data_with_callbacks<V, F>(
        &self,
        data: Data,
        on_verified: V,
        on_failed: F,
    ) -> JoinHandle<()>
    where
        V: FnOnce(Data) + Send + 'static,
        F: FnOnce(Data, VerificationFailure) + Send + 'static,
    {
        let key_chain = self.clone();
        tokio::spawn(async move {
            match key_chain.verify_data(data).await {
                VerificationOutcome::Verified(data) => on_verified(data),
                VerificationOutcome::Failed(data, failure) => on_failed(data, failure),
            }
        })
    }

    async fn check_signature(&self, data: &mut Data) -> Result<(), VerificationFailure> {
        match self.policy_manager.check_verification_policy(data) {
            PolicyDecision::Accept => Ok(()),
            PolicyDecision::Reject(failure) => Err(failure),
            PolicyDecision::CheckDigest => {
                let expected = security::sha256_digest(data.signed_portion());
                if data.signature().signature_value().buf() == expected.buf() {
                    Ok(())
                } else {
                    Err(VerificationFailure::SignatureMismatch)
                }
            }
            PolicyDecision::ResolveKey(key_locator_name) => {
                let timeout = self.config.key_resolution_timeout();
                let public_key_der = tokio::time::timeout(
                    timeout,
                    self.policy_manager.resolve_key(&key_locator_name),
                )
                .await
                .map_err(|_| VerificationFailure::KeyResolutionTimeout(timeout))??;

                let public_key = security::parse_public_key(&public_key_der).map_err(|e| {
                    VerificationFailure::MalformedKey {
                        key_name: key_locator_name.clone(),
                        reason: e.to_string(),
                    }
                })?;

                let signature = data.signature().signature_value().clone();
                if security::verify_rsa_signature(data.signed_portion(), &signature, &public_key) {
                    Ok(())
                } else {
                    Err(VerificationFailure::SignatureMismatch)
                }
            }
        }
    }
}
