use log::info;

pub mod blob;
pub mod config;
pub mod data;
pub mod identity_manager;
pub mod identity_storage;
pub mod key_chain;
pub mod meta_info;
pub mod name;
pub mod policy;
pub mod private_key_storage;
pub mod security;
pub mod signature;
pub mod tlv;

pub use blob::Blob;
pub use config::KeyChainConfig;
pub use data::Data;
pub use identity_manager::IdentityManager;
pub use identity_storage::{IdentityStorage, MemoryIdentityStorage};
pub use key_chain::KeyChain;
pub use meta_info::{ContentType, MetaInfo};
pub use name::{Name, NameComponent, NameParseError};
pub use policy::{
    NoVerifyPolicyManager, PolicyDecision, PolicyManager, SelfVerifyPolicyManager,
    VerificationFailure, VerificationOutcome,
};
pub use private_key_storage::{MemoryPrivateKeyStorage, PrivateKeyStorage};
pub use security::{KeyType, SecurityError};
pub use signature::{KeyLocator, KeyLocatorType, Signature, SignatureType};
pub use tlv::{TlvDecoder, TlvElement, TlvError, TlvHeader};

pub fn init() {
    info!("NDN Core initialized");
}
