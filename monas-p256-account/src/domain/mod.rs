pub mod account;
pub mod pub_key;
