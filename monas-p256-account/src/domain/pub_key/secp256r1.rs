use p256::ecdsa::signature::Verifier;
use p256::ecdsa::{Signature, VerifyingKey};
use p256::elliptic_curve::sec1::FromEncodedPoint;
use p256::{EncodedPoint, PublicKey};

use crate::domain::pub_key::{PubKey, PubKeyError};

/// P-256 public key, SEC1 compressed (33 bytes).
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Secp256r1PubKey {
    #[prost(bytes = "vec", tag = "1")]
    pub key: Vec<u8>,
}

impl ::prost::Name for Secp256r1PubKey {
    const NAME: &'static str = "PubKey";
    const PACKAGE: &'static str = "cosmos.crypto.secp256r1";
}

impl Secp256r1PubKey {
    pub fn from_verifying_key(verifying_key: &VerifyingKey) -> Self {
        Self {
            key: verifying_key.to_encoded_point(true).as_bytes().to_vec(),
        }
    }
}

impl PubKey for Secp256r1PubKey {
    /// `sig` is `r || s` over SHA-256(msg). High-S signatures are rejected.
    fn verify_signature(&self, msg: &[u8], sig: &[u8]) -> bool {
        if sig.len() != 64 {
            return false;
        }
        let Ok(signature) = Signature::from_slice(sig) else {
            return false;
        };
        if signature.normalize_s().is_some() {
            return false;
        }
        let Ok(verifying_key) = VerifyingKey::from_sec1_bytes(&self.key) else {
            return false;
        };
        verifying_key.verify(msg, &signature).is_ok()
    }
}

/// Accepts only a compressed encoding of a point on P-256.
///
/// Subgroup membership is not checked separately; P-256 has cofactor 1.
pub fn validate_secp256r1(pub_key: &Secp256r1PubKey) -> Result<(), PubKeyError> {
    let point = EncodedPoint::from_bytes(&pub_key.key)
        .map_err(|e| PubKeyError::InvalidPublicKey(e.to_string()))?;
    if !point.is_compressed() {
        return Err(PubKeyError::InvalidPublicKey(
            "expected a compressed point".to_string(),
        ));
    }
    Option::<PublicKey>::from(PublicKey::from_encoded_point(&point))
        .map(|_| ())
        .ok_or_else(|| PubKeyError::InvalidPublicKey("point is not on curve P-256".to_string()))
}
