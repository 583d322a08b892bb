use prost::Name;
use thiserror::Error;

use crate::domain::pub_key::secp256k1::{validate_secp256k1, Secp256k1PubKey};
use crate::domain::pub_key::secp256r1::{validate_secp256r1, Secp256r1PubKey};
use crate::domain::pub_key::{name_from_type_url, PubKey, PubKeyError, PubKeyImpl, PubKeyRegistry};

/// Configures an account while it is being built.
pub type AccountOption = Box<dyn FnOnce(&mut Account)>;

/// Account initialization message: the key arrives as a type URL plus bytes.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct MsgInit {
    #[prost(message, optional, tag = "1")]
    pub pub_key: Option<prost_types::Any>,
}

#[derive(Debug, Error)]
pub enum AccountError {
    #[error(transparent)]
    PubKey(#[from] PubKeyError),

    #[error("account is already initialized")]
    AlreadyInitialized,

    #[error("account is not initialized")]
    NotInitialized,

    #[error("init message carries no public key")]
    MissingPubKey,

    #[error("signature verification failed")]
    SignatureVerificationFailed,
}

#[derive(Debug)]
struct ActivePubKey {
    type_name: String,
    key: Box<dyn PubKey>,
}

/// An account that accepts whichever key types it was built with.
///
/// The set of key types is fixed once `new` returns; an account holds at most
/// one public key.
#[derive(Debug)]
pub struct Account {
    supported_pub_keys: PubKeyRegistry,
    pub_key: Option<ActivePubKey>,
}

impl Account {
    pub fn new<I>(options: I) -> Self
    where
        I: IntoIterator<Item = AccountOption>,
    {
        let mut account = Account {
            supported_pub_keys: PubKeyRegistry::default(),
            pub_key: None,
        };
        for option in options {
            option(&mut account);
        }
        account
    }

    pub fn decode_pub_key(
        &self,
        type_name: &str,
        bytes: &[u8],
    ) -> Result<Box<dyn PubKey>, PubKeyError> {
        self.supported_pub_keys.decode(type_name, bytes)
    }

    pub fn validate_pub_key(&self, type_name: &str, key: &dyn PubKey) -> Result<(), PubKeyError> {
        self.supported_pub_keys.validate(type_name, key)
    }

    pub fn supported_pub_keys(&self) -> &PubKeyRegistry {
        &self.supported_pub_keys
    }

    pub fn init(&mut self, msg: MsgInit) -> Result<(), AccountError> {
        if self.pub_key.is_some() {
            return Err(AccountError::AlreadyInitialized);
        }
        let any = msg.pub_key.ok_or(AccountError::MissingPubKey)?;
        let type_name = name_from_type_url(&any.type_url);

        let key = self.decode_pub_key(type_name, &any.value)?;
        if let Err(e) = self.validate_pub_key(type_name, key.as_ref()) {
            tracing::warn!("Rejected {} public key: {}", type_name, e);
            return Err(e.into());
        }

        tracing::info!("Account initialized with {} public key", type_name);
        self.pub_key = Some(ActivePubKey {
            type_name: type_name.to_string(),
            key,
        });
        Ok(())
    }

    pub fn pub_key(&self) -> Option<&dyn PubKey> {
        self.pub_key.as_ref().map(|active| active.key.as_ref())
    }

    pub fn pub_key_type(&self) -> Option<&str> {
        self.pub_key.as_ref().map(|active| active.type_name.as_str())
    }

    pub fn is_initialized(&self) -> bool {
        self.pub_key.is_some()
    }

    /// Checks `signature` over `sign_bytes` with the account's public key.
    pub fn authenticate(&self, sign_bytes: &[u8], signature: &[u8]) -> Result<(), AccountError> {
        let key = self.pub_key().ok_or(AccountError::NotInitialized)?;
        if !key.verify_signature(sign_bytes, signature) {
            return Err(AccountError::SignatureVerificationFailed);
        }
        Ok(())
    }
}

/// Registers `T` with no validation beyond decoding.
pub fn with_pub_key<T>() -> AccountOption
where
    T: PubKey + Name + Default,
{
    with_pub_key_with_validation_fn::<T, _>(|_: &T| Ok(()))
}

/// Registers `T` under its protobuf name, validated by `validate_fn`.
pub fn with_pub_key_with_validation_fn<T, F>(validate_fn: F) -> AccountOption
where
    T: PubKey + Name + Default,
    F: Fn(&T) -> Result<(), PubKeyError> + Send + Sync + 'static,
{
    let entry = PubKeyImpl::new::<T, F>(validate_fn);
    Box::new(move |account: &mut Account| {
        account.supported_pub_keys.register(T::full_name(), entry);
    })
}

pub fn with_secp256r1_pub_key() -> AccountOption {
    with_pub_key_with_validation_fn::<Secp256r1PubKey, _>(validate_secp256r1)
}

pub fn with_secp256k1_pub_key() -> AccountOption {
    with_pub_key_with_validation_fn::<Secp256k1PubKey, _>(validate_secp256k1)
}

#[cfg(test)]
mod account_tests {
    use super::*;
    use p256::ecdsa::signature::Signer;
    use p256::ecdsa::{Signature, SigningKey};
    use prost::Message;

    fn p256_signing_key() -> SigningKey {
        SigningKey::from_slice(&[0x33; 32]).unwrap()
    }

    fn p256_pub_key() -> Secp256r1PubKey {
        Secp256r1PubKey::from_verifying_key(p256_signing_key().verifying_key())
    }

    fn init_msg<T: Message + Name>(key: &T) -> MsgInit {
        MsgInit {
            pub_key: Some(prost_types::Any {
                type_url: T::type_url(),
                value: key.encode_to_vec(),
            }),
        }
    }

    fn account() -> Account {
        Account::new([with_secp256r1_pub_key(), with_secp256k1_pub_key()])
    }

    #[test]
    fn new_registers_options() {
        let account = account();
        assert!(account
            .supported_pub_keys()
            .contains("cosmos.crypto.secp256r1.PubKey"));
        assert!(account
            .supported_pub_keys()
            .contains("cosmos.crypto.secp256k1.PubKey"));
        assert!(!account.is_initialized());

        let mut names: Vec<_> = account.supported_pub_keys().names().collect();
        names.sort_unstable();
        assert_eq!(
            names,
            ["cosmos.crypto.secp256k1.PubKey", "cosmos.crypto.secp256r1.PubKey"]
        );
    }

    #[test]
    fn later_option_overrides_earlier() {
        let account = Account::new([
            with_secp256r1_pub_key(),
            with_pub_key::<Secp256r1PubKey>(),
        ]);
        let malformed = Secp256r1PubKey {
            key: vec![0x05; 33],
        };
        assert_eq!(account.supported_pub_keys().len(), 1);
        assert!(account
            .validate_pub_key("cosmos.crypto.secp256r1.PubKey", &malformed)
            .is_ok());

        let account = Account::new([
            with_pub_key::<Secp256r1PubKey>(),
            with_secp256r1_pub_key(),
        ]);
        assert!(matches!(
            account.validate_pub_key("cosmos.crypto.secp256r1.PubKey", &malformed),
            Err(PubKeyError::InvalidPublicKey(_))
        ));
    }

    #[test]
    fn init_and_authenticate() {
        let mut account = account();
        account.init(init_msg(&p256_pub_key())).unwrap();

        assert_eq!(
            account.pub_key_type(),
            Some("cosmos.crypto.secp256r1.PubKey")
        );
        assert_eq!(
            account.pub_key().unwrap().encode_message(),
            p256_pub_key().encode_to_vec()
        );

        let signature: Signature = p256_signing_key().sign(b"sign bytes");
        let signature = signature.normalize_s().unwrap_or(signature);
        account.authenticate(b"sign bytes", &signature.to_vec()).unwrap();

        assert!(matches!(
            account.authenticate(b"tampered", &signature.to_vec()),
            Err(AccountError::SignatureVerificationFailed)
        ));
    }

    #[test]
    fn init_accepts_bare_type_name() {
        let mut account = account();
        let mut msg = init_msg(&p256_pub_key());
        if let Some(any) = msg.pub_key.as_mut() {
            any.type_url = "cosmos.crypto.secp256r1.PubKey".to_string();
        }
        account.init(msg).unwrap();
        assert!(account.is_initialized());
    }

    #[test]
    fn init_twice_is_rejected() {
        let mut account = account();
        account.init(init_msg(&p256_pub_key())).unwrap();
        assert!(matches!(
            account.init(init_msg(&p256_pub_key())),
            Err(AccountError::AlreadyInitialized)
        ));
    }

    #[test]
    fn init_rejects_invalid_point() {
        let mut account = account();
        let result = account.init(init_msg(&Secp256r1PubKey {
            key: vec![0x05; 33],
        }));
        assert!(matches!(
            result,
            Err(AccountError::PubKey(PubKeyError::InvalidPublicKey(_)))
        ));
        assert!(!account.is_initialized());
    }

    #[test]
    fn init_rejects_unsupported_type() {
        let mut account = Account::new([with_secp256r1_pub_key()]);
        let result = account.init(init_msg(&Secp256k1PubKey {
            key: vec![0x02; 33],
        }));
        assert!(matches!(
            result,
            Err(AccountError::PubKey(PubKeyError::UnsupportedType(_)))
        ));
    }

    #[test]
    fn init_without_key_is_rejected() {
        let mut account = account();
        assert!(matches!(
            account.init(MsgInit { pub_key: None }),
            Err(AccountError::MissingPubKey)
        ));
    }

    #[test]
    fn authenticate_before_init_is_rejected() {
        assert!(matches!(
            account().authenticate(b"msg", &[0; 64]),
            Err(AccountError::NotInitialized)
        ));
    }

    #[test]
    fn account_is_shareable_across_threads() {
        let account = std::sync::Arc::new(account());
        let bytes = p256_pub_key().encode_to_vec();

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let account = account.clone();
                let bytes = bytes.clone();
                std::thread::spawn(move || {
                    let key = account
                        .decode_pub_key("cosmos.crypto.secp256r1.PubKey", &bytes)
                        .unwrap();
                    account
                        .validate_pub_key("cosmos.crypto.secp256r1.PubKey", key.as_ref())
                        .unwrap();
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }
    }
}
