use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use log::debug;

use crate::blob::Blob;
use crate::data::Data;
use crate::identity_manager::IdentityManager;
use crate::identity_storage::IdentityStorage;
use crate::name::Name;
use crate::signature::{KeyLocator, Signature};

/// Why a packet failed verification
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum VerificationFailure {
    #[error("Public key not found: {0}")]
    KeyNotFound(Name),
    #[error("KeyLocator name is not a certificate name: {0}")]
    InvalidCertificateName(Name),
    #[error("Key resolution timed out after {0:?}")]
    KeyResolutionTimeout(Duration),
    #[error("Malformed public key {key_name}: {reason}")]
    MalformedKey { key_name: Name, reason: String },
    #[error("Signature does not match the signed portion")]
    SignatureMismatch,
    #[error("Unsupported KeyLocator: {0}")]
    UnsupportedKeyLocator(String),
    #[error("Rejected by policy: {0}")]
    PolicyRejected(String),
}

/// Terminal state of one verification
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerificationOutcome {
    Verified(Data),
    Failed(Data, VerificationFailure),
}

impl VerificationOutcome {
    pub fn is_verified(&self) -> bool {
        matches!(self, VerificationOutcome::Verified(_))
    }

    pub fn data(&self) -> &Data {
        match self {
            VerificationOutcome::Verified(data) | VerificationOutcome::Failed(data, _) => data,
        }
    }

    pub fn into_result(self) -> Result<Data, (Data, VerificationFailure)> {
        match self {
            VerificationOutcome::Verified(data) => Ok(data),
            VerificationOutcome::Failed(data, failure) => Err((data, failure)),
        }
    }
}

/// What a policy requires before a packet can be trusted
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PolicyDecision {
    /// Trust the packet without checking its signature
    Accept,
    Reject(VerificationFailure),
    /// Recompute the SHA-256 digest of the signed portion
    CheckDigest,
    /// Resolve the public key behind this KeyLocator name, then check the
    /// RSA signature
    ResolveKey(Name),
}

/// Trust rules applied by the KeyChain
#[async_trait]
pub trait PolicyManager: Send + Sync {
    fn check_verification_policy(&self, data: &Data) -> PolicyDecision;

    /// Whether `data_name` may be signed with `certificate_name`
    fn check_signing_policy(&self, data_name: &Name, certificate_name: &Name) -> bool;

    /// DER public key behind a KeyLocator name. May suspend, for example to
    /// fetch a certificate.
    async fn resolve_key(&self, key_locator_name: &Name) -> Result<Blob, VerificationFailure>;
}

/// Trusts any key already present in the local identity storage.
///
/// There is no certificate chain walk, so this is only meant for closed
/// deployments and tests.
pub struct SelfVerifyPolicyManager {
    identity_storage: Arc<dyn IdentityStorage>,
}

impl SelfVerifyPolicyManager {
    pub fn new(identity_storage: Arc<dyn IdentityStorage>) -> Self {
        Self { identity_storage }
    }
}

#[async_trait]
impl PolicyManager for SelfVerifyPolicyManager {
    fn check_verification_policy(&self, data: &Data) -> PolicyDecision {
        let decision = match data.signature() {
            Signature::Empty => PolicyDecision::Reject(VerificationFailure::PolicyRejected(
                "packet is not signed".to_string(),
            )),
            Signature::DigestSha256 { .. } => PolicyDecision::CheckDigest,
            Signature::Sha256WithRsa { key_locator, .. } => match key_locator {
                KeyLocator::KeyName(name) => PolicyDecision::ResolveKey(name.clone()),
                KeyLocator::KeyDigest(_) => PolicyDecision::Reject(
                    VerificationFailure::UnsupportedKeyLocator("KeyDigest".to_string()),
                ),
                KeyLocator::None => PolicyDecision::Reject(
                    VerificationFailure::UnsupportedKeyLocator("missing".to_string()),
                ),
            },
        };
        debug!("Verification policy for {}: {:?}", data.name(), decision);
        decision
    }

    fn check_signing_policy(&self, _data_name: &Name, _certificate_name: &Name) -> bool {
        true
    }

    async fn resolve_key(&self, key_locator_name: &Name) -> Result<Blob, VerificationFailure> {
        let key_name = IdentityManager::certificate_name_to_key_name(key_locator_name)
            .map_err(|_| VerificationFailure::InvalidCertificateName(key_locator_name.clone()))?;

        self.identity_storage
            .get_key(&key_name)
            .await
            .ok_or(VerificationFailure::KeyNotFound(key_name))
    }
}

/// Accepts every packet and allows every signing request
#[derive(Debug, Default, Clone, Copy)]
pub struct NoVerifyPolicyManager;

impl NoVerifyPolicyManager {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl PolicyManager for NoVerifyPolicyManager {
    fn check_verification_policy(&self, _data: &Data) -> PolicyDecision {
        PolicyDecision::Accept
    }

    fn check_signing_policy(&self, _data_name: &Name, _certificate_name: &Name) -> bool {
        true
    }

    async fn resolve_key(&self, key_locator_name: &Name) -> Result<Blob, VerificationFailure> {
        Err(VerificationFailure::KeyNotFound(key_locator_name.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity_storage::MemoryIdentityStorage;
    use crate::security::KeyType;

    fn signed_with(key_locator: KeyLocator) -> Data {
        let mut data = Data::with_name(Name::from_uri("/p").unwrap());
        data.set_signature(Signature::Sha256WithRsa {
            key_locator,
            signature: Blob::from("sig"),
        });
        data
    }

    #[test]
    fn test_self_verify_decisions() {
        let policy = SelfVerifyPolicyManager::new(Arc::new(MemoryIdentityStorage::new()));

        assert!(matches!(
            policy.check_verification_policy(&Data::new()),
            PolicyDecision::Reject(VerificationFailure::PolicyRejected(_))
        ));

        let locator = Name::from_uri("/testname/KEY/DSK-123/ID-CERT").unwrap();
        assert_eq!(
            policy.check_verification_policy(&signed_with(KeyLocator::KeyName(locator.clone()))),
            PolicyDecision::ResolveKey(locator)
        );
        assert!(matches!(
            policy.check_verification_policy(&signed_with(KeyLocator::KeyDigest(Blob::from("d")))),
            PolicyDecision::Reject(VerificationFailure::UnsupportedKeyLocator(_))
        ));

        let mut digest_signed = Data::new();
        digest_signed.set_signature(Signature::DigestSha256 {
            signature: Blob::null(),
        });
        assert_eq!(
            policy.check_verification_policy(&digest_signed),
            PolicyDecision::CheckDigest
        );
    }

    #[tokio::test]
    async fn test_self_verify_resolves_local_keys() {
        let storage = Arc::new(MemoryIdentityStorage::new());
        let key_name = Name::from_uri("/testname/DSK-123").unwrap();
        storage
            .add_key(&key_name, KeyType::Rsa, Blob::from("der"))
            .await
            .unwrap();
        let policy = SelfVerifyPolicyManager::new(storage);

        let locator = Name::from_uri("/testname/KEY/DSK-123/ID-CERT").unwrap();
        assert_eq!(policy.resolve_key(&locator).await, Ok(Blob::from("der")));

        let unknown = Name::from_uri("/other/KEY/DSK-1/ID-CERT").unwrap();
        assert_eq!(
            policy.resolve_key(&unknown).await,
            Err(VerificationFailure::KeyNotFound(
                Name::from_uri("/other/DSK-1").unwrap()
            ))
        );

        let not_a_cert = Name::from_uri("/plain/name").unwrap();
        assert_eq!(
            policy.resolve_key(&not_a_cert).await,
            Err(VerificationFailure::InvalidCertificateName(not_a_cert.clone()))
        );
    }

    #[test]
    fn test_no_verify_accepts_everything() {
        let policy = NoVerifyPolicyManager::new();
        assert_eq!(
            policy.check_verification_policy(&Data::new()),
            PolicyDecision::Accept
        );
        assert!(policy.check_signing_policy(&Name::new(), &Name::new()));
    }
}
