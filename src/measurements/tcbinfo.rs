// Copyright 2025 Contributors to the Veraison project.
// SPDX-License-Identifier: Apache-2.0

use super::section::SectionType;
use serde::{Deserialize, Serialize};

/// A protocol-agnostic measurement of one device component
#[serde_with::serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TcbInfoMeasurement {
    /// The measured region
    pub section: SectionType,

    /// Position of the region within its section.  For PR regions this is
    /// the remapped, byte-swapped index.
    #[serde(default)]
    pub index: u32,

    #[serde_as(as = "serde_with::hex::Hex")]
    pub value: Vec<u8>,
}

impl TcbInfoMeasurement {
    pub fn new(section: SectionType, index: u32, value: Vec<u8>) -> Self {
        Self {
            section,
            index,
            value,
        }
    }
}
