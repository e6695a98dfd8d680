//! An implementation of JSON Web Encryption (JWE) as defined in [RFC 7516]
//!
//! A JWE is an authenticated, encrypted envelope addressed to one or more
//! recipients. All recipients share one ciphertext and one content
//! encryption key (CEK), but each recipient may use a different key
//! management algorithm to transport that CEK.
//!
//! The entry points are [`JweBuilder`] for encryption, [`JweDecrypter`] for
//! decryption and [`JsonWebEncryption`] for the envelope itself, which can
//! be converted to and from the compact and JSON serializations via
//! [`JsonWebEncryption::serialize`] and [`str::parse`].
//!
//! The set of algorithms reachable by a builder or decrypter is always an
//! explicit allowlist: construct an [`AlgorithmRegistry`], restrict it with
//! [`AlgorithmRegistry::restrict_to`] and pass it by reference into every
//! operation. There is no process-wide algorithm state.
//!
//! [RFC 7516]: <https://www.rfc-editor.org/rfc/rfc7516.html>
//! [`AlgorithmRegistry`]: registry::AlgorithmRegistry
//! [`AlgorithmRegistry::restrict_to`]: registry::AlgorithmRegistry::restrict_to
#![warn(
    missing_docs,
    missing_debug_implementations,
    trivial_casts,
    trivial_numeric_casts,
    unused_extern_crates,
    unused_import_braces,
    unused_qualifications,
    explicit_outlives_requirements,
    clippy::missing_const_for_fn,
    clippy::missing_errors_doc
)]
#![deny(
    rustdoc::broken_intra_doc_links,
    rustdoc::bare_urls,
    macro_use_extern_crate,
    non_ascii_idents,
    elided_lifetimes_in_paths
)]
#![forbid(unsafe_code)]
#![no_std]

extern crate alloc;

#[cfg(feature = "zip")]
extern crate std;

#[macro_use]
mod macros;

pub(crate) mod base64_url;

pub mod crypto;
pub mod format;
pub mod header;
pub mod jwa;
pub mod jwe;
pub mod jwk;
pub mod registry;
pub mod zip;

pub use base64_url::{Base64UrlString, NoBase64UrlString};
pub use jwe::{
    ConfigError, DecryptError, DecryptionFailed, JsonWebEncryption, JweBuilder, JweDecrypter,
};

/// Type alias to make `JsonWebEncryption` easier to access.
pub type JWE = JsonWebEncryption;
