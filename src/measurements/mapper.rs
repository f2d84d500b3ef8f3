// Copyright 2025 Contributors to the Veraison project.
// SPDX-License-Identifier: Apache-2.0

use super::errors::Error;
use super::header::{DmtfHeader, MeasurementRecordHeader};
use super::section::{SectionType, PR_SECTION_INDEX_SHIFT};
use super::tcbinfo::TcbInfoMeasurement;
use crate::psg::ByteReader;

/// Index under which a PR region is reported: its 1-based position among PR
/// regions, byte-swapped
pub fn pr_section_index(index: u8) -> u32 {
    let n = u32::from(index.saturating_sub(PR_SECTION_INDEX_SHIFT)) + 1;
    n.swap_bytes()
}

fn section_index(section: SectionType, index: u8) -> u32 {
    match section {
        SectionType::Pr => pr_section_index(index),
        _ => u32::from(index),
    }
}

/// Map the content of one measurement record, read from `r`, to a
/// measurement.
///
/// Records in an unsupported format or in an unknown section produce no
/// measurement but are still consumed in full, so that `r` is always left at
/// the start of the next record.
pub fn map_record(
    header: &MeasurementRecordHeader,
    r: &mut ByteReader,
) -> Result<Option<TcbInfoMeasurement>, Error> {
    tracing::debug!(?header, "parsing measurement");

    let payload_len = header.payload_len()?;

    let skipped = if header.is_dmtf() {
        let dmtf = DmtfHeader::decode(r)?;

        match SectionType::from_spdm_parameters(header.index, dmtf.kind) {
            Ok(section) => {
                let value = r.get_bytes(payload_len)?.to_vec();
                let index = section_index(section, header.index);
                return Ok(Some(TcbInfoMeasurement::new(section, index, value)));
            }
            Err(e) => e,
        }
    } else {
        Error::UnsupportedMeasurementSpec(header.measurement_spec)
    };

    tracing::warn!(?header, reason = %skipped, "skipping measurement record");
    r.skip(payload_len)?;

    Ok(None)
}

/// Extract every measurement from a stream of concatenated records
pub fn extract_measurements(records: &[u8]) -> Result<Vec<TcbInfoMeasurement>, Error> {
    let mut r = ByteReader::new(records);
    let mut out = Vec::new();

    while !r.is_empty() {
        let header = MeasurementRecordHeader::decode(&mut r)?;
        if let Some(m) = map_record(&header, &mut r)? {
            out.push(m);
        }
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use hex_literal::hex;

    fn dmtf_record(index: u8, kind: u8, value: &[u8]) -> (MeasurementRecordHeader, Vec<u8>) {
        let header = MeasurementRecordHeader {
            index,
            measurement_spec: 1,
            measurement_size: (3 + value.len()) as u16,
        };

        let mut content = DmtfHeader {
            kind,
            raw: false,
            size: value.len() as u16,
        }
        .encode();
        content.extend_from_slice(value);

        (header, content)
    }

    #[test]
    fn recognised_record_advances_by_size() {
        let (header, mut content) = dmtf_record(0, 0x01, &[0xAB; 33]);
        assert_eq!(header.measurement_size, 36);
        content.extend_from_slice(&hex!("DEADBEEF"));

        let mut r = ByteReader::new(&content);
        let m = map_record(&header, &mut r).unwrap();

        assert_eq!(
            m,
            Some(TcbInfoMeasurement::new(
                SectionType::Firmware,
                0,
                vec![0xAB; 33]
            ))
        );
        assert_eq!(r.position(), 36);
        assert_eq!(r.rest(), hex!("DEADBEEF"));
    }

    #[test]
    fn unknown_section_advances_by_size() {
        let (header, mut content) = dmtf_record(0, 0x7E, &[0xAB; 33]);
        content.extend_from_slice(&hex!("DEADBEEF"));

        let mut r = ByteReader::new(&content);
        let m = map_record(&header, &mut r).unwrap();

        assert!(m.is_none());
        assert_eq!(r.position(), 36);
    }

    #[test]
    fn non_dmtf_record_is_skipped_whole() {
        let header = MeasurementRecordHeader {
            index: 0,
            measurement_spec: 2,
            measurement_size: 36,
        };
        let content = [0x11u8; 40];

        let mut r = ByteReader::new(&content);
        let m = map_record(&header, &mut r).unwrap();

        assert!(m.is_none());
        assert_eq!(r.position(), 36);
    }

    #[test]
    fn truncated_record_is_an_error() {
        let (header, content) = dmtf_record(0, 0x01, &[0xAB; 33]);

        let mut r = ByteReader::new(&content[..20]);

        assert!(matches!(
            map_record(&header, &mut r),
            Err(Error::Structure(_))
        ));
    }

    #[test]
    fn pr_index_is_remapped() {
        assert_eq!(pr_section_index(0x40), 0x0100_0000);
        assert_eq!(pr_section_index(0x42), 0x0300_0000);

        let (header, content) = dmtf_record(0x41, 0x03, &hex!("CAFE"));
        let mut r = ByteReader::new(&content);

        let m = map_record(&header, &mut r).unwrap().unwrap();

        assert_eq!(m.section, SectionType::Pr);
        assert_eq!(m.index, 0x0200_0000);
    }

    #[test]
    fn stream_keeps_alignment() {
        let mut stream = Vec::new();
        for (index, kind, value) in [
            (0x00, 0x01, vec![0x01; 32]),
            (0x10, 0x03, vec![0x02; 32]),
            (0x03, 0x03, vec![0x03; 48]),
        ] {
            let (h, c) = dmtf_record(index, kind, &value);
            stream.extend_from_slice(&h.encode());
            stream.extend_from_slice(&c);
        }
        stream.extend_from_slice(&hex!("04 05 0200 FFFF"));

        let ms = extract_measurements(&stream).unwrap();

        assert_eq!(ms.len(), 2);
        assert_eq!(ms[0].section, SectionType::Firmware);
        assert_eq!(ms[1].section, SectionType::Core);
        assert_eq!(ms[1].value, vec![0x03; 48]);
    }
}
