// Copyright 2025 Contributors to the Veraison project.
// SPDX-License-Identifier: Apache-2.0

//! PSG structures and the chain of trust built from them.
//!
//! A device proves its identity with a short chain of PSG certificate
//! entries: a root entry pinned by the verifier and one or two leaf entries.
//! The first leaf is signed by the root key and the second by the first
//! leaf's key.  Devices stream the leaves first and the root last.  This
//! module provides:
//! * a codec for PSG public keys, signatures and certificate entries
//! * a parser splitting a (base64 or hex encoded) stream into entries
//! * a validator checking chain shape, root pinning and signature linkage
//!
//! # Example
//!
//! ```no_run
//! use fpgaverifier::psg::{parse_chain_text, ChainValidator, TextEncoding};
//!
//! # fn run(chain_b64: &str, trusted_root: &[u8]) -> Result<(), fpgaverifier::psg::Error> {
//! let chain = parse_chain_text(chain_b64, TextEncoding::Base64)?;
//!
//! let leaf = ChainValidator::new(trusted_root).validate(&chain)?;
//!
//! // the leaf key can now be used to verify device-signed data
//! let key = leaf.public_key.to_ec_key()?;
//! # Ok(())
//! # }
//! ```

pub use self::buffer::ByteReader;
pub use self::chain::{parse_chain, parse_chain_text};
pub use self::encoding::TextEncoding;
pub use self::entry::{
    CertificateEntry, CertificateKind, LeafCertificate, PsgCertificate, RootCertificate,
};
pub use self::errors::Error;
pub use self::magic::{CurveType, PublicKeyMagic};
pub use self::pubkey::{CoordinateLayout, PublicKeyRecord};
pub use self::signature::SignatureRecord;
pub use self::validator::{
    find_leaf_certificate, sig_verify, verify_chain_size, verify_parents_in_chain,
    verify_root_certificate, ChainValidator,
};

pub mod encoding;

mod buffer;
mod chain;
mod entry;
mod errors;
mod magic;
mod pubkey;
mod signature;
mod validator;

#[cfg(test)]
pub(crate) mod testutil;
