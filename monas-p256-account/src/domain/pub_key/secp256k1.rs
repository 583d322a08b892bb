use k256::ecdsa::signature::Verifier;
use k256::ecdsa::{Signature, VerifyingKey};

use crate::domain::pub_key::{PubKey, PubKeyError};

/// secp256k1 public key, SEC1 compressed (33 bytes).
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Secp256k1PubKey {
    #[prost(bytes = "vec", tag = "1")]
    pub key: Vec<u8>,
}

impl ::prost::Name for Secp256k1PubKey {
    const NAME: &'static str = "PubKey";
    const PACKAGE: &'static str = "cosmos.crypto.secp256k1";
}

impl Secp256k1PubKey {
    pub fn from_verifying_key(verifying_key: &VerifyingKey) -> Self {
        Self {
            key: verifying_key.to_encoded_point(true).as_bytes().to_vec(),
        }
    }
}

impl PubKey for Secp256k1PubKey {
    fn verify_signature(&self, msg: &[u8], sig: &[u8]) -> bool {
        if sig.len() != 64 {
            return false;
        }
        let Ok(signature) = Signature::from_slice(sig) else {
            return false;
        };
        // malleable
        if signature.normalize_s().is_some() {
            return false;
        }
        let Ok(verifying_key) = VerifyingKey::from_sec1_bytes(&self.key) else {
            return false;
        };
        verifying_key.verify(msg, &signature).is_ok()
    }
}

pub fn validate_secp256k1(pub_key: &Secp256k1PubKey) -> Result<(), PubKeyError> {
    if pub_key.key.len() != 33 {
        return Err(PubKeyError::InvalidPublicKey(format!(
            "expected 33 bytes, got {}",
            pub_key.key.len()
        )));
    }
    VerifyingKey::from_sec1_bytes(&pub_key.key)
        .map(|_| ())
        .map_err(|e| PubKeyError::InvalidPublicKey(e.to_string()))
}
