// Copyright 2025 Contributors to the Veraison project.
// SPDX-License-Identifier: Apache-2.0

#[derive(thiserror::Error, PartialEq, Eq)]
pub enum Error {
    #[error("Malformed structure: requested {requested}, but remaining {remaining}")]
    MalformedStructure { requested: usize, remaining: usize },
    #[error("Malformed structure: {0} unexpected trailing bytes")]
    TrailingBytes(usize),
    #[error("Invalid magic number in {what}. Expected any of: {allowed}, Actual: {actual}.")]
    InvalidMagic {
        what: &'static str,
        allowed: String,
        actual: String,
    },
    #[error("Invalid key coordinates: {0}")]
    InvalidCoordinates(String),
    #[error("Unknown curve: {0}")]
    UnknownCurve(String),
    #[error("Wrong certificate chain size: {0}")]
    ChainShape(String),
    #[error("Untrusted root: {0}")]
    UntrustedRoot(String),
    #[error("Invalid root certificate: {0}")]
    InvalidRoot(String),
    #[error("Invalid leaf certificate: {0}")]
    InvalidLeaf(String),
    #[error("Invalid parent certificate: {0}")]
    InvalidParent(String),
    #[error("Signature verification failed: {0}")]
    SignatureVerification(String),
    #[error("Encoding error: {0}")]
    Encoding(String),
}

impl std::fmt::Debug for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self)
    }
}

impl From<openssl::error::ErrorStack> for Error {
    fn from(e: openssl::error::ErrorStack) -> Self {
        Error::SignatureVerification(e.to_string())
    }
}
