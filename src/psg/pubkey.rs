// Copyright 2025 Contributors to the Veraison project.
// SPDX-License-Identifier: Apache-2.0

use super::buffer::ByteReader;
use super::errors::Error;
use super::magic::{CurveType, PublicKeyMagic};
use openssl::bn::{BigNum, BigNumContext};
use openssl::ec::{EcGroup, EcKey, EcKeyRef};
use openssl::pkey::{HasPublic, Public};

/// Size of the fixed part of a public key record (everything but x and y)
pub const PUBKEY_HEADER_LEN: usize = 24;

/// How the point coordinates are sized in the record header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoordinateLayout {
    /// `sizeX` and `sizeY` each give the width of one coordinate
    Split,
    /// `sizeX` covers `x || y` and `sizeY` is zero
    Joined,
}

/// A PSG public key record.
///
/// Wire layout (big-endian): `magic | sizeX | sizeY | curveMagic |
/// permissions | cancellation | coordinates[sizeX + sizeY]`
///
/// The coordinates are `x || y`, both of the same width.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublicKeyRecord {
    pub magic: PublicKeyMagic,
    pub curve: CurveType,
    pub layout: CoordinateLayout,
    pub permissions: u32,
    pub cancellation: u32,
    pub x: Vec<u8>,
    pub y: Vec<u8>,
}

impl PublicKeyRecord {
    /// Build a record from an EC public key, with coordinates left-padded to
    /// the curve's fixed width
    pub fn from_ec_key<T: HasPublic>(
        magic: PublicKeyMagic,
        curve: CurveType,
        key: &EcKeyRef<T>,
    ) -> Result<Self, Error> {
        let group = EcGroup::from_curve_name(curve.nid())?;
        let mut ctx = BigNumContext::new()?;
        let mut x = BigNum::new()?;
        let mut y = BigNum::new()?;

        key.public_key()
            .affine_coordinates(&group, &mut x, &mut y, &mut ctx)?;

        let width = curve.coordinate_len() as i32;

        Ok(Self {
            magic,
            curve,
            layout: CoordinateLayout::Split,
            permissions: 0,
            cancellation: 0,
            x: x.to_vec_padded(width)?,
            y: y.to_vec_padded(width)?,
        })
    }

    pub fn decode(r: &mut ByteReader) -> Result<Self, Error> {
        Self::decode_with(r, <PublicKeyMagic as TryFrom<u32>>::try_from)
    }

    fn decode_with<F>(r: &mut ByteReader, lookup_magic: F) -> Result<Self, Error>
    where
        F: FnOnce(u32) -> Result<PublicKeyMagic, Error>,
    {
        let magic = lookup_magic(r.get_u32_be()?)?;
        let size_x = r.get_u32_be()? as usize;
        let size_y = r.get_u32_be()? as usize;
        let curve = CurveType::from_pubkey_magic(r.get_u32_be()?)?;
        let permissions = r.get_u32_be()?;
        let cancellation = r.get_u32_be()?;

        let layout = match (size_x, size_y) {
            (x, y) if x == y => CoordinateLayout::Split,
            (x, 0) if x % 2 == 0 => CoordinateLayout::Joined,
            (x, y) => {
                return Err(Error::InvalidCoordinates(format!(
                    "unsupported sizes x={x}, y={y}"
                )))
            }
        };

        let total = size_x.checked_add(size_y).ok_or(Error::MalformedStructure {
            requested: usize::MAX,
            remaining: r.remaining(),
        })?;
        let (x, y) = r.get_bytes(total)?.split_at(total / 2);

        Ok(Self {
            magic,
            curve,
            layout,
            permissions,
            cancellation,
            x: x.to_vec(),
            y: y.to_vec(),
        })
    }

    fn exact<F>(buf: &[u8], lookup_magic: F) -> Result<Self, Error>
    where
        F: FnOnce(u32) -> Result<PublicKeyMagic, Error>,
    {
        let mut r = ByteReader::new(buf);
        let k = Self::decode_with(&mut r, lookup_magic)?;

        if !r.is_empty() {
            return Err(Error::TrailingBytes(r.remaining()));
        }

        Ok(k)
    }

    /// Decode a record that must span the whole of `buf`
    pub fn decode_exact(buf: &[u8]) -> Result<Self, Error> {
        Self::exact(buf, <PublicKeyMagic as TryFrom<u32>>::try_from)
    }

    /// Like [`PublicKeyRecord::decode_exact`], for the key of a root entry
    pub fn decode_root_key(buf: &[u8]) -> Result<Self, Error> {
        Self::exact(buf, PublicKeyMagic::for_root_key)
    }

    pub fn encoded_len(&self) -> usize {
        PUBKEY_HEADER_LEN + self.x.len() + self.y.len()
    }

    fn declared_sizes(&self) -> (u32, u32) {
        match self.layout {
            CoordinateLayout::Split => (self.x.len() as u32, self.y.len() as u32),
            CoordinateLayout::Joined => ((self.x.len() + self.y.len()) as u32, 0),
        }
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut v = Vec::with_capacity(self.encoded_len());
        let (size_x, size_y) = self.declared_sizes();

        v.extend_from_slice(&self.magic.value().to_be_bytes());
        v.extend_from_slice(&size_x.to_be_bytes());
        v.extend_from_slice(&size_y.to_be_bytes());
        v.extend_from_slice(&self.curve.pubkey_magic().to_be_bytes());
        v.extend_from_slice(&self.permissions.to_be_bytes());
        v.extend_from_slice(&self.cancellation.to_be_bytes());
        v.extend_from_slice(&self.x);
        v.extend_from_slice(&self.y);

        v
    }

    /// Turn the record into an OpenSSL verification key.  An off-curve point
    /// is a provider failure, reported as [`Error::SignatureVerification`].
    pub fn to_ec_key(&self) -> Result<EcKey<Public>, Error> {
        let group = EcGroup::from_curve_name(self.curve.nid())?;
        let x = BigNum::from_slice(&self.x)?;
        let y = BigNum::from_slice(&self.y)?;

        Ok(EcKey::from_public_key_affine_coordinates(&group, &x, &y)?)
    }
}
