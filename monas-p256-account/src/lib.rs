//! Accounts whose public key algorithms are plugged in at construction.
//!
//! Key types are registered through [`domain::account::AccountOption`]s and
//! looked up by their protobuf message name when an account is initialized.

pub mod application_service;
pub mod config;
pub mod domain;
pub mod presentation;
