//! Core library components.
//!
//! This module contains the credential reconciliation logic, encryption
//! backends, certificate generation, and configuration handling.

pub mod asset;
pub mod cipher;
pub mod config;
pub mod constants;
pub mod credentials;
pub mod fingerprint;
pub mod pki;
pub mod store;
