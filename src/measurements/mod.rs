// Copyright 2025 Contributors to the Veraison project.
// SPDX-License-Identifier: Apache-2.0

//! Device-reported measurements.
//!
//! A measurement response carries a stream of measurement records.  Records
//! in the DMTF format that describe a known device section are mapped to
//! [`TcbInfoMeasurement`] values; every other record is skipped.

pub use self::errors::Error;
pub use self::header::{
    DmtfHeader, MeasurementRecordHeader, MeasurementResponse, DMTF_HEADER_LEN,
    RECORD_HEADER_LEN,
};
pub use self::mapper::{extract_measurements, map_record, pr_section_index};
pub use self::section::SectionType;
pub use self::tcbinfo::TcbInfoMeasurement;

mod errors;
mod header;
mod mapper;
mod section;
mod tcbinfo;
