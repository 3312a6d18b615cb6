//! Directory-backed credential verification for the deadbolt door controller.
//!
//! Members are stored in an LDAP directory; each door-enabled record carries
//! a salted password hash attribute in the classic
//! `{SSHA512}base64(digest‖salt)` form. This crate provides:
//!
//! - [`HashRecord`]: parsing, serialization, and constant-time verification
//!   of that attribute format across the supported algorithms;
//! - [`DirectoryClient`]: the lookup contract, with an [`ldap3`]-backed
//!   implementation in [`LdapDirectoryClient`];
//! - [`CredentialVerifier`]: the fail-closed `check_credentials` entry
//!   point used by the HTTP gateway.
//!
//! # Security
//!
//! Verification never raises to its caller: directory failures, missing
//! records, and malformed hash attributes all collapse to `false` with a
//! logged warning. Digest comparison uses [`subtle`] and does not
//! short-circuit on the first mismatching byte.

pub mod client;
pub mod error;
pub mod record;
pub mod verifier;

pub use client::{DirectoryClient, DirectoryConfig, LdapDirectoryClient, escape_filter_value};
pub use error::{DirectoryError, DirectoryResult};
pub use record::{HashAlgorithm, HashRecord};
pub use verifier::CredentialVerifier;
