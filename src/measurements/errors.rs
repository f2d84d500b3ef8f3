// Copyright 2025 Contributors to the Veraison project.
// SPDX-License-Identifier: Apache-2.0

use crate::psg;

#[derive(thiserror::Error, PartialEq, Eq)]
pub enum Error {
    #[error("Structure error: {0}")]
    Structure(#[from] psg::Error),
    #[error("Unsupported measurement spec: {0}")]
    UnsupportedMeasurementSpec(u8),
    #[error("Unknown section: index 0x{index:02X}, type 0x{kind:02X}")]
    UnknownSection { index: u8, kind: u8 },
    #[error("Invalid measurement size: {0}")]
    InvalidMeasurementSize(String),
}

impl std::fmt::Debug for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self)
    }
}
