// Copyright 2025 Contributors to the Veraison project.
// SPDX-License-Identifier: Apache-2.0

use super::buffer::ByteReader;
use super::errors::Error;
use super::magic::{to_formatted_hex, CurveType, SIGNATURE_MAGIC};
use openssl::bn::BigNum;
use openssl::ecdsa::EcdsaSig;

pub const SIGNATURE_HEADER_LEN: usize = 16;

/// A PSG signature record.
///
/// Wire layout (big-endian): `magic | sizeR | sizeS | curveMagic | r[sizeR] |
/// s[sizeS]`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureRecord {
    pub curve: CurveType,
    pub r: Vec<u8>,
    pub s: Vec<u8>,
}

impl SignatureRecord {
    pub fn from_ecdsa_sig(curve: CurveType, sig: &EcdsaSig) -> Result<Self, Error> {
        let width = curve.coordinate_len() as i32;

        Ok(Self {
            curve,
            r: sig.r().to_vec_padded(width)?,
            s: sig.s().to_vec_padded(width)?,
        })
    }

    pub fn decode(r: &mut ByteReader) -> Result<Self, Error> {
        let magic = r.get_u32_be()?;
        if magic != SIGNATURE_MAGIC {
            return Err(Error::InvalidMagic {
                what: "PSG signature",
                allowed: to_formatted_hex(SIGNATURE_MAGIC),
                actual: to_formatted_hex(magic),
            });
        }

        let size_r = r.get_u32_be()? as usize;
        let size_s = r.get_u32_be()? as usize;
        let curve = CurveType::from_signature_magic(r.get_u32_be()?)?;
        let sig_r = r.get_bytes(size_r)?.to_vec();
        let sig_s = r.get_bytes(size_s)?.to_vec();

        Ok(Self {
            curve,
            r: sig_r,
            s: sig_s,
        })
    }

    pub fn decode_exact(buf: &[u8]) -> Result<Self, Error> {
        let mut r = ByteReader::new(buf);
        let s = Self::decode(&mut r)?;

        if !r.is_empty() {
            return Err(Error::TrailingBytes(r.remaining()));
        }

        Ok(s)
    }

    pub fn encoded_len(&self) -> usize {
        SIGNATURE_HEADER_LEN + self.r.len() + self.s.len()
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut v = Vec::with_capacity(self.encoded_len());

        v.extend_from_slice(&SIGNATURE_MAGIC.to_be_bytes());
        v.extend_from_slice(&(self.r.len() as u32).to_be_bytes());
        v.extend_from_slice(&(self.s.len() as u32).to_be_bytes());
        v.extend_from_slice(&self.curve.signature_magic().to_be_bytes());
        v.extend_from_slice(&self.r);
        v.extend_from_slice(&self.s);

        v
    }

    pub fn to_ecdsa_sig(&self) -> Result<EcdsaSig, Error> {
        let r = BigNum::from_slice(&self.r)?;
        let s = BigNum::from_slice(&self.s)?;

        Ok(EcdsaSig::from_private_components(r, s)?)
    }
}
