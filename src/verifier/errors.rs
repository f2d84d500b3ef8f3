// Copyright 2025 Contributors to the Veraison project.
// SPDX-License-Identifier: Apache-2.0

use crate::{measurements, psg, rim};

#[derive(thiserror::Error, PartialEq, Eq)]
pub enum Error {
    #[error("Transport error: {0}")]
    Transport(String),
    #[error("Security enclave error: {0}")]
    SecurityEnclave(String),
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
    #[error("Measurements mismatch: {0}")]
    MeasurementsMismatch(String),
    #[error("Reference manifest has no measurements")]
    EmptyManifest,
    #[error("Measurement signature: {0}")]
    MeasurementSignature(String),
    #[error("Invalid session state: {0}")]
    InvalidState(String),
    #[error("Missing evidence: {0}")]
    MissingEvidence(String),
    #[error("Duplicated evidence: {0}")]
    DuplicatedEvidence(String),
    #[error("Cipher error: {0}")]
    Cipher(String),
    #[error("Configuration error: {0}")]
    Config(String),
    #[error(transparent)]
    Chain(#[from] psg::Error),
    #[error(transparent)]
    Measurements(#[from] measurements::Error),
    #[error(transparent)]
    Manifest(#[from] rim::Error),
}

impl Error {
    /// Whether the error means the device evidence was examined and found
    /// wanting, as opposed to the examination itself breaking down
    pub fn is_verification_failure(&self) -> bool {
        match self {
            Error::Chain(e) => matches!(
                e,
                psg::Error::ChainShape(_)
                    | psg::Error::UntrustedRoot(_)
                    | psg::Error::InvalidRoot(_)
                    | psg::Error::InvalidLeaf(_)
                    | psg::Error::InvalidParent(_)
            ),
            Error::MeasurementsMismatch(_)
            | Error::EmptyManifest
            | Error::MeasurementSignature(_) => true,
            _ => false,
        }
    }
}

impl std::fmt::Debug for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self)
    }
}
