//! Pluggable public key types for an account.
//!
//! An account never hard-codes the algorithms it accepts. Each key type is
//! registered once, as a pair of type-erased `decode` / `validate` closures
//! stored under the message's fully-qualified protobuf name. The closures
//! capture the concrete type, so `validate` can recover it from a
//! `&dyn PubKey` with a checked downcast.

pub mod secp256k1;
pub mod secp256r1;

use std::any::Any;
use std::collections::HashMap;
use std::fmt;

use prost::{Message, Name};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PubKeyError {
    #[error("failed to decode public key: {0}")]
    Decode(#[from] prost::DecodeError),

    #[error("invalid pubkey type passed for validation, wanted: {wanted}, got: {got}")]
    InvalidType { wanted: String, got: String },

    #[error("invalid public key: {0}")]
    InvalidPublicKey(String),

    #[error("unsupported public key type: {0}")]
    UnsupportedType(String),
}

/// Object-safe view of a prost message.
///
/// Implemented for every sized `Message + Name`, so key types get it for free.
pub trait ErasedMessage: Any {
    fn as_any(&self) -> &dyn Any;

    /// Fully-qualified protobuf name of the concrete message.
    fn message_name(&self) -> String;

    fn encode_message(&self) -> Vec<u8>;
}

impl<T: Message + Name + 'static> ErasedMessage for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn message_name(&self) -> String {
        T::full_name()
    }

    fn encode_message(&self) -> Vec<u8> {
        self.encode_to_vec()
    }
}

/// A public key an account can hold.
pub trait PubKey: ErasedMessage + Send + Sync + fmt::Debug {
    fn verify_signature(&self, msg: &[u8], sig: &[u8]) -> bool;
}

type DecodeFn = Box<dyn Fn(&[u8]) -> Result<Box<dyn PubKey>, PubKeyError> + Send + Sync>;
type ValidateFn = Box<dyn Fn(&dyn PubKey) -> Result<(), PubKeyError> + Send + Sync>;

/// Decode and validate operations for one key type.
pub struct PubKeyImpl {
    decode: DecodeFn,
    validate: ValidateFn,
}

impl PubKeyImpl {
    /// Builds the entry for `T` around a validation function over the concrete type.
    pub fn new<T, F>(validate_fn: F) -> Self
    where
        T: PubKey + Name + Default,
        F: Fn(&T) -> Result<(), PubKeyError> + Send + Sync + 'static,
    {
        let decode: DecodeFn = Box::new(|bytes: &[u8]| -> Result<Box<dyn PubKey>, PubKeyError> {
            let mut key = T::default();
            key.merge(bytes)?;
            Ok(Box::new(key))
        });

        let validate: ValidateFn = Box::new(move |key: &dyn PubKey| {
            let concrete =
                key.as_any()
                    .downcast_ref::<T>()
                    .ok_or_else(|| PubKeyError::InvalidType {
                        wanted: T::full_name(),
                        got: key.message_name(),
                    })?;
            validate_fn(concrete)
        });

        Self { decode, validate }
    }

    pub fn decode(&self, bytes: &[u8]) -> Result<Box<dyn PubKey>, PubKeyError> {
        (self.decode)(bytes)
    }

    pub fn validate(&self, key: &dyn PubKey) -> Result<(), PubKeyError> {
        (self.validate)(key)
    }
}

impl fmt::Debug for PubKeyImpl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PubKeyImpl").finish_non_exhaustive()
    }
}

/// Key type identifier → decode/validate entry.
///
/// Only the owning account inserts into it, and only while it is being built.
#[derive(Debug, Default)]
pub struct PubKeyRegistry {
    entries: HashMap<String, PubKeyImpl>,
}

impl PubKeyRegistry {
    /// Later registrations under the same name replace earlier ones.
    pub(crate) fn register(&mut self, name: String, entry: PubKeyImpl) {
        if self.entries.insert(name.clone(), entry).is_some() {
            tracing::debug!("Replaced public key type {}", name);
        } else {
            tracing::debug!("Registered public key type {}", name);
        }
    }

    fn entry(&self, name: &str) -> Result<&PubKeyImpl, PubKeyError> {
        self.entries
            .get(name)
            .ok_or_else(|| PubKeyError::UnsupportedType(name.to_string()))
    }

    pub fn decode(&self, name: &str, bytes: &[u8]) -> Result<Box<dyn PubKey>, PubKeyError> {
        self.entry(name)?.decode(bytes)
    }

    pub fn validate(&self, name: &str, key: &dyn PubKey) -> Result<(), PubKeyError> {
        self.entry(name)?.validate(key)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Strips a type URL down to the message name, e.g.
/// `/cosmos.crypto.secp256r1.PubKey` → `cosmos.crypto.secp256r1.PubKey`.
pub fn name_from_type_url(url: &str) -> &str {
    match url.rfind('/') {
        Some(i) => &url[i + 1..],
        None => url,
    }
}
