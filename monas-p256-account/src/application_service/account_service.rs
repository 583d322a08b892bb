use crate::config::AccountConfig;
use crate::domain::account::{Account, AccountError, MsgInit};
use crate::domain::pub_key::name_from_type_url;

#[derive(Debug, thiserror::Error)]
pub enum AccountServiceError {
    #[error(transparent)]
    Account(#[from] AccountError),
}

/// A public key that passed decoding and validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PubKeyInfo {
    pub pub_key_type: String,
    pub key_bytes: Vec<u8>,
}

/// Builds accounts with the configured key types.
pub struct AccountService {
    config: AccountConfig,
}

impl AccountService {
    pub fn new(config: AccountConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AccountConfig {
        &self.config
    }

    /// A fresh, uninitialized account.
    pub fn account(&self) -> Account {
        Account::new(self.config.options())
    }

    /// An account initialized with the given key.
    pub fn open(&self, type_url: &str, key_bytes: &[u8]) -> Result<Account, AccountServiceError> {
        let mut account = self.account();
        account.init(MsgInit {
            pub_key: Some(prost_types::Any {
                type_url: type_url.to_string(),
                value: key_bytes.to_vec(),
            }),
        })?;
        Ok(account)
    }

    pub fn validate(
        &self,
        type_url: &str,
        key_bytes: &[u8],
    ) -> Result<PubKeyInfo, AccountServiceError> {
        let account = self.open(type_url, key_bytes)?;
        let key = account.pub_key().ok_or(AccountError::NotInitialized)?;
        Ok(PubKeyInfo {
            pub_key_type: name_from_type_url(type_url).to_string(),
            key_bytes: key.encode_message(),
        })
    }

    pub fn verify(
        &self,
        type_url: &str,
        key_bytes: &[u8],
        message: &[u8],
        signature: &[u8],
    ) -> Result<(), AccountServiceError> {
        let account = self.open(type_url, key_bytes)?;
        account.authenticate(message, signature).map_err(|e| {
            tracing::warn!("Signature rejected for {} key: {}", type_url, e);
            e
        })?;
        Ok(())
    }
}

#[cfg(test)]
mod account_service_tests {
    use super::*;
    use crate::config::KeyTypeConfig;
    use crate::domain::pub_key::secp256k1::Secp256k1PubKey;
    use crate::domain::pub_key::secp256r1::Secp256r1PubKey;
    use crate::domain::pub_key::PubKeyError;
    use k256::ecdsa::signature::Signer;
    use prost::Message;

    const SECP256K1_URL: &str = "/cosmos.crypto.secp256k1.PubKey";

    fn k256_signing_key() -> k256::ecdsa::SigningKey {
        k256::ecdsa::SigningKey::from_slice(&[0x44; 32]).unwrap()
    }

    fn k256_key_bytes() -> Vec<u8> {
        Secp256k1PubKey::from_verifying_key(k256_signing_key().verifying_key()).encode_to_vec()
    }

    #[test]
    fn validate_returns_normalized_type_and_bytes() {
        let service = AccountService::new(AccountConfig::default());
        let info = service.validate(SECP256K1_URL, &k256_key_bytes()).unwrap();

        assert_eq!(info.pub_key_type, "cosmos.crypto.secp256k1.PubKey");
        assert_eq!(info.key_bytes, k256_key_bytes());
    }

    #[test]
    fn verify_accepts_valid_signature() {
        let service = AccountService::new(AccountConfig::default());
        let signature: k256::ecdsa::Signature = k256_signing_key().sign(b"hello");
        let signature = signature.normalize_s().unwrap_or(signature);

        service
            .verify(SECP256K1_URL, &k256_key_bytes(), b"hello", &signature.to_vec())
            .unwrap();
        assert!(matches!(
            service.verify(SECP256K1_URL, &k256_key_bytes(), b"bye", &signature.to_vec()),
            Err(AccountServiceError::Account(
                AccountError::SignatureVerificationFailed
            ))
        ));
    }

    #[test]
    fn unconfigured_key_type_is_unsupported() {
        let service = AccountService::new(AccountConfig {
            supported_key_types: vec![KeyTypeConfig::Secp256r1],
            ..Default::default()
        });

        assert!(matches!(
            service.validate(SECP256K1_URL, &k256_key_bytes()),
            Err(AccountServiceError::Account(AccountError::PubKey(
                PubKeyError::UnsupportedType(_)
            )))
        ));
    }

    #[test]
    fn garbage_bytes_fail_to_decode() {
        let service = AccountService::new(AccountConfig::default());
        assert!(matches!(
            service.validate("/cosmos.crypto.secp256r1.PubKey", &[0xff, 0xff, 0xff]),
            Err(AccountServiceError::Account(AccountError::PubKey(
                PubKeyError::Decode(_)
            )))
        ));
    }

    #[test]
    fn each_account_gets_its_own_registry() {
        let service = AccountService::new(AccountConfig::default());
        let key = Secp256r1PubKey {
            key: vec![0x02; 33],
        };
        let first = service.account();
        let second = service.account();
        assert_eq!(first.supported_pub_keys().len(), 2);
        assert_eq!(second.supported_pub_keys().len(), 2);
        assert!(first
            .decode_pub_key("cosmos.crypto.secp256r1.PubKey", &key.encode_to_vec())
            .is_ok());
    }
}
