// Copyright 2025 Contributors to the Veraison project.
// SPDX-License-Identifier: Apache-2.0

use super::errors::Error;
use crate::psg::{self, ByteReader, PublicKeyRecord, SignatureRecord};
use openssl::hash::hash;

pub const RECORD_HEADER_LEN: usize = 4;
pub const DMTF_HEADER_LEN: usize = 3;

/// measurementSpec value announcing the DMTF measurement format
pub const DMTF_MEASUREMENT_SPEC: u8 = 1;

/// Header of one measurement block.
///
/// Wire layout: `index u8 | measurementSpec u8 | measurementSize u16 LE`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MeasurementRecordHeader {
    pub index: u8,
    pub measurement_spec: u8,
    pub measurement_size: u16,
}

impl MeasurementRecordHeader {
    pub fn decode(r: &mut ByteReader) -> Result<Self, Error> {
        Ok(Self {
            index: r.get_u8()?,
            measurement_spec: r.get_u8()?,
            measurement_size: r.get_u16_le()?,
        })
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut v = Vec::with_capacity(RECORD_HEADER_LEN);
        v.push(self.index);
        v.push(self.measurement_spec);
        v.extend_from_slice(&self.measurement_size.to_le_bytes());
        v
    }

    pub fn is_dmtf(&self) -> bool {
        self.measurement_spec == DMTF_MEASUREMENT_SPEC
    }

    /// Number of payload bytes that follow any DMTF sub-header
    pub fn payload_len(&self) -> Result<usize, Error> {
        let size = self.measurement_size as usize;

        if !self.is_dmtf() {
            return Ok(size);
        }

        size.checked_sub(DMTF_HEADER_LEN).ok_or_else(|| {
            Error::InvalidMeasurementSize(format!(
                "DMTF record at index 0x{:02X} declares {size} bytes, less than its {DMTF_HEADER_LEN}-byte sub-header",
                self.index
            ))
        })
    }
}

/// DMTF measurement sub-header.
///
/// Wire layout: `type u8 | size u16 LE`.  Bit 7 of `type` flags a raw
/// bit-stream rather than a digest and is not part of the type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DmtfHeader {
    pub kind: u8,
    pub raw: bool,
    pub size: u16,
}

impl DmtfHeader {
    const RAW_FLAG: u8 = 0x80;

    pub fn decode(r: &mut ByteReader) -> Result<Self, Error> {
        let t = r.get_u8()?;

        Ok(Self {
            kind: t & !Self::RAW_FLAG,
            raw: t & Self::RAW_FLAG != 0,
            size: r.get_u16_le()?,
        })
    }

    pub fn encode(&self) -> Vec<u8> {
        let t = if self.raw {
            self.kind | Self::RAW_FLAG
        } else {
            self.kind
        };

        let mut v = Vec::with_capacity(DMTF_HEADER_LEN);
        v.push(t);
        v.extend_from_slice(&self.size.to_le_bytes());
        v
    }
}

// mailbox transports pad responses to whole words
fn is_padding(v: &[u8]) -> bool {
    v.iter().all(|b| *b == 0)
}

/// A device's answer to a measurement request.
///
/// Wire layout: `numberOfBlocks u8 | recordLength u24 LE |
/// records[recordLength] | signature?`, where the optional trailing PSG
/// signature covers every byte before it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MeasurementResponse {
    pub number_of_blocks: u8,
    pub records: Vec<u8>,
    pub signature: Option<SignatureRecord>,
    signed_len: usize,
    raw: Vec<u8>,
}

impl MeasurementResponse {
    pub fn decode(buf: &[u8]) -> Result<Self, Error> {
        let mut r = ByteReader::new(buf);

        let number_of_blocks = r.get_u8()?;
        let record_length = r.get_u24_le()? as usize;
        let records = r.get_bytes(record_length)?.to_vec();
        let signed_len = r.position();

        let signature = if is_padding(r.rest()) {
            None
        } else {
            Some(SignatureRecord::decode(&mut r)?)
        };

        if !is_padding(r.rest()) {
            return Err(psg::Error::TrailingBytes(r.remaining()).into());
        }

        Ok(Self {
            number_of_blocks,
            records,
            signature,
            signed_len,
            raw: buf.to_vec(),
        })
    }

    /// The bytes covered by the trailing signature
    pub fn signed_payload(&self) -> &[u8] {
        &self.raw[..self.signed_len]
    }

    /// Check the trailing signature against `key`.  A response without a
    /// signature, or signed on another curve, does not verify.
    pub fn verify_signature(&self, key: &PublicKeyRecord) -> Result<bool, Error> {
        let sig = match &self.signature {
            Some(s) if s.curve == key.curve => s,
            _ => return Ok(false),
        };

        let ec = key.to_ec_key()?;
        let sig = sig.to_ecdsa_sig()?;

        let ok = hash(key.curve.digest(), self.signed_payload())
            .and_then(|digest| sig.verify(&digest, &ec))
            .map_err(psg::Error::from)?;

        Ok(ok)
    }
}
