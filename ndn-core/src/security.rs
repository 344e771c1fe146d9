use rsa::pkcs1::{DecodeRsaPrivateKey, EncodeRsaPrivateKey};
use rsa::pkcs1v15::{SigningKey, VerifyingKey};
use rsa::pkcs8::{DecodePublicKey, EncodePublicKey};
use rsa::signature::{RandomizedSigner, SignatureEncoding, Verifier};
use rsa::{RsaPrivateKey, RsaPublicKey};
use sha2::{Digest, Sha256};

use crate::blob::Blob;
use crate::name::{Name, NameParseError};

/// Algorithm family of a stored key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyType {
    Rsa,
    Ecdsa,
}

/// Errors raised synchronously by key storage, signing and key handling
#[derive(Debug, thiserror::Error)]
pub enum SecurityError {
    #[error("Key not found: {0}")]
    KeyNotFound(Name),
    #[error("Key already exists: {0}")]
    KeyAlreadyExists(Name),
    #[error("Invalid certificate name: {0}")]
    InvalidCertificateName(Name),
    #[error("No default certificate is configured")]
    NoDefaultCertificate,
    #[error("Unsupported key type: {0:?}")]
    UnsupportedKeyType(KeyType),
    #[error("Malformed key: {0}")]
    MalformedKey(String),
    #[error("Signing policy rejected {data_name} with certificate {certificate_name}")]
    SigningRejected {
        data_name: Name,
        certificate_name: Name,
    },
    #[error("Invalid name: {0}")]
    InvalidName(#[from] NameParseError),
    #[error("Key storage lock poisoned")]
    StoragePoisoned,
    #[error("RSA error: {0}")]
    Rsa(#[from] rsa::Error),
}

/// SHA-256 digest of `data`
pub fn sha256_digest(data: &[u8]) -> Blob {
    Blob::new(Sha256::digest(data).to_vec())
}

/// PKCS#1 v1.5 SHA-256 signature of `data`
pub(crate) fn sign_with_rsa(data: &[u8], private_key: &RsaPrivateKey) -> Blob {
    let mut rng = rand::thread_rng();
    // SigningKey hashes the message itself
    let signing_key = SigningKey::<Sha256>::new(private_key.clone());
    let signature = signing_key.sign_with_rng(&mut rng, data);
    Blob::new(signature.to_bytes().to_vec())
}

/// Check a PKCS#1 v1.5 SHA-256 signature. Malformed signature bytes are a
/// mismatch, not an error.
pub(crate) fn verify_rsa_signature(data: &[u8], signature: &[u8], public_key: &RsaPublicKey) -> bool {
    let verifying_key = VerifyingKey::<Sha256>::new(public_key.clone());
    match rsa::pkcs1v15::Signature::try_from(signature) {
        Ok(signature) => verifying_key.verify(data, &signature).is_ok(),
        Err(_) => false,
    }
}

/// Parse a DER SubjectPublicKeyInfo RSA public key
pub(crate) fn parse_public_key(der: &[u8]) -> Result<RsaPublicKey, SecurityError> {
    RsaPublicKey::from_public_key_der(der).map_err(|e| SecurityError::MalformedKey(e.to_string()))
}

/// Parse a DER PKCS#1 RSA private key
pub(crate) fn parse_private_key(der: &[u8]) -> Result<RsaPrivateKey, SecurityError> {
    RsaPrivateKey::from_pkcs1_der(der).map_err(|e| SecurityError::MalformedKey(e.to_string()))
}

/// Generate an RSA key pair, returned as (SubjectPublicKeyInfo, PKCS#1) DER
pub(crate) fn generate_rsa_key_pair(bits: usize) -> Result<(Blob, Blob), SecurityError> {
    let mut rng = rand::thread_rng();
    let private_key = RsaPrivateKey::new(&mut rng, bits)?;
    let public_key = RsaPublicKey::from(&private_key);

    let public_der = public_key
        .to_public_key_der()
        .map_err(|e| SecurityError::MalformedKey(e.to_string()))?;
    let private_der = private_key
        .to_pkcs1_der()
        .map_err(|e| SecurityError::MalformedKey(e.to_string()))?;

    Ok((
        Blob::new(public_der.as_bytes()),
        Blob::new(private_der.as_bytes()),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rsa_signing_and_verification() {
        let (public_der, private_der) = generate_rsa_key_pair(1024).unwrap();
        let private_key = parse_private_key(&private_der).unwrap();
        let public_key = parse_public_key(&public_der).unwrap();

        let test_data = b"test data for signing";
        let signature = sign_with_rsa(test_data, &private_key);
        assert_eq!(signature.size(), 128);
        assert!(verify_rsa_signature(test_data, &signature, &public_key));

        // Wrong signature
        let wrong_signature = vec![0u8; signature.size()];
        assert!(!verify_rsa_signature(test_data, &wrong_signature, &public_key));

        // Wrong data
        assert!(!verify_rsa_signature(b"other data", &signature, &public_key));
    }

    #[test]
    fn test_malformed_keys() {
        assert!(matches!(
            parse_public_key(&[0x30, 0x00]),
            Err(SecurityError::MalformedKey(_))
        ));
        assert!(matches!(
            parse_private_key(b"not a key"),
            Err(SecurityError::MalformedKey(_))
        ));
    }

    #[test]
    fn test_sha256_digest() {
        assert_eq!(
            sha256_digest(b"").to_hex(),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }
}
