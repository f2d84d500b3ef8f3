// Copyright 2025 Contributors to the Veraison project.
// SPDX-License-Identifier: Apache-2.0

use super::errors::Error;
use serde::{Deserialize, Serialize};

/// First measurement index used by partial-reconfiguration regions
pub const PR_SECTION_INDEX_SHIFT: u8 = 0x40;

// DMTF measurement value types
const DMTF_IMMUTABLE_ROM: u8 = 0x01;
const DMTF_MUTABLE_FIRMWARE: u8 = 0x02;
const DMTF_HARDWARE_CONFIG: u8 = 0x03;

/// Device region a measurement describes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SectionType {
    Firmware,
    DeviceState,
    Io,
    Core,
    Hps,
    Pr,
}

impl SectionType {
    /// Map a measurement block index and its DMTF value type to a section
    pub fn from_spdm_parameters(index: u8, kind: u8) -> Result<Self, Error> {
        let section = match (index, kind) {
            (0x00, DMTF_IMMUTABLE_ROM) => SectionType::Firmware,
            (0x01, DMTF_MUTABLE_FIRMWARE) => SectionType::DeviceState,
            (0x02, DMTF_HARDWARE_CONFIG) => SectionType::Io,
            (0x03, DMTF_HARDWARE_CONFIG) => SectionType::Core,
            (0x04, DMTF_HARDWARE_CONFIG) => SectionType::Hps,
            (i, DMTF_HARDWARE_CONFIG) if i >= PR_SECTION_INDEX_SHIFT => SectionType::Pr,
            _ => return Err(Error::UnknownSection { index, kind }),
        };

        Ok(section)
    }
}
