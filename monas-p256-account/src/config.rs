//! Configuration for the account service.

use std::fmt;
use std::net::SocketAddr;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::account::{with_secp256k1_pub_key, with_secp256r1_pub_key, AccountOption};

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountConfig {
    /// Key types accounts accept, registered in this order.
    #[serde(default = "default_supported_key_types")]
    pub supported_key_types: Vec<KeyTypeConfig>,

    #[serde(default)]
    pub server: ServerConfig,
}

impl Default for AccountConfig {
    fn default() -> Self {
        Self {
            supported_key_types: default_supported_key_types(),
            server: ServerConfig::default(),
        }
    }
}

fn default_supported_key_types() -> Vec<KeyTypeConfig> {
    vec![KeyTypeConfig::Secp256r1, KeyTypeConfig::Secp256k1]
}

impl AccountConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io(e.to_string()))?;

        Self::from_toml_str(&content)
    }

    /// Load configuration from a TOML string
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// One registration option per configured key type.
    pub fn options(&self) -> Vec<AccountOption> {
        self.supported_key_types
            .iter()
            .map(|key_type| key_type.option())
            .collect()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_listen")]
    pub listen: SocketAddr,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: default_listen(),
        }
    }
}

fn default_listen() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 4002))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum KeyTypeConfig {
    Secp256r1,
    Secp256k1,
}

impl KeyTypeConfig {
    pub fn option(self) -> AccountOption {
        match self {
            KeyTypeConfig::Secp256r1 => with_secp256r1_pub_key(),
            KeyTypeConfig::Secp256k1 => with_secp256k1_pub_key(),
        }
    }
}

impl FromStr for KeyTypeConfig {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "SECP256R1" | "P256" => Ok(KeyTypeConfig::Secp256r1),
            "SECP256K1" | "K256" => Ok(KeyTypeConfig::Secp256k1),
            other => Err(ConfigError::UnsupportedKeyType(other.to_string())),
        }
    }
}

impl TryFrom<String> for KeyTypeConfig {
    type Error = ConfigError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<KeyTypeConfig> for String {
    fn from(key_type: KeyTypeConfig) -> Self {
        key_type.to_string()
    }
}

impl fmt::Display for KeyTypeConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyTypeConfig::Secp256r1 => write!(f, "secp256r1"),
            KeyTypeConfig::Secp256k1 => write!(f, "secp256k1"),
        }
    }
}

/// Configuration error types
#[derive(Debug, Clone, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(String),
    #[error("Parse error: {0}")]
    Parse(String),
    #[error("unsupported key type: {0}")]
    UnsupportedKeyType(String),
}
