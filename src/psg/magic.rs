// Copyright 2025 Contributors to the Veraison project.
// SPDX-License-Identifier: Apache-2.0

use super::errors::Error;
use openssl::hash::MessageDigest;
use openssl::nid::Nid;

/// Magic opening a leaf (signed) certificate entry
pub const LEAF_ENTRY_MAGIC: u32 = 0x92540917;
/// Magic opening a root certificate entry
pub const ROOT_ENTRY_MAGIC: u32 = 0x89259036;
/// Magic opening a signature record
pub const SIGNATURE_MAGIC: u32 = 0x74881520;

/// Render a 32-bit value the way magics are reported in error messages
pub fn to_formatted_hex(v: u32) -> String {
    format!("0x{v:08X}")
}

/// The magic number carried by a PSG public key.  All comparisons are done on
/// the unsigned 32-bit value.
///
/// `Root` only appears in the key of a root entry and is not part of
/// [`PublicKeyMagic::ALL`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PublicKeyMagic {
    Manifest,
    M1,
    Empty,
    Root,
}

impl PublicKeyMagic {
    pub const ALL: [PublicKeyMagic; 3] = [
        PublicKeyMagic::Manifest,
        PublicKeyMagic::M1,
        PublicKeyMagic::Empty,
    ];

    pub fn value(&self) -> u32 {
        match self {
            PublicKeyMagic::Manifest => 0x40656643,
            PublicKeyMagic::M1 => 0x58700660,
            PublicKeyMagic::Empty => 0x00000000,
            PublicKeyMagic::Root => 0x93105118,
        }
    }

    pub fn allowed() -> String {
        Self::ALL
            .iter()
            .map(|m| to_formatted_hex(m.value()))
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Look up the magic of a key held by a root entry.  The root key magic is
    /// accepted on top of the generic ones.
    pub fn for_root_key(v: u32) -> Result<Self, Error> {
        if v == PublicKeyMagic::Root.value() {
            return Ok(PublicKeyMagic::Root);
        }

        Self::try_from(v).map_err(|_| Error::InvalidMagic {
            what: "PSG root pub key",
            allowed: format!(
                "{}, {}",
                to_formatted_hex(PublicKeyMagic::Root.value()),
                Self::allowed()
            ),
            actual: to_formatted_hex(v),
        })
    }
}

impl TryFrom<u32> for PublicKeyMagic {
    type Error = Error;

    fn try_from(v: u32) -> Result<Self, Error> {
        Self::ALL
            .into_iter()
            .find(|m| m.value() == v)
            .ok_or_else(|| Error::InvalidMagic {
                what: "PSG pub key",
                allowed: Self::allowed(),
                actual: to_formatted_hex(v),
            })
    }
}

/// Elliptic curves understood by PSG structures.  The curve fixes the
/// coordinate width as well as the digest used for ECDSA.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CurveType {
    Secp256R1,
    Secp384R1,
}

impl CurveType {
    const ALL: [CurveType; 2] = [CurveType::Secp256R1, CurveType::Secp384R1];

    /// Magic identifying the curve inside a public key record
    pub fn pubkey_magic(&self) -> u32 {
        match self {
            CurveType::Secp256R1 => 0x49706948,
            CurveType::Secp384R1 => 0x54326648,
        }
    }

    /// Magic identifying the curve inside a signature record
    pub fn signature_magic(&self) -> u32 {
        match self {
            CurveType::Secp256R1 => 0x20548820,
            CurveType::Secp384R1 => 0x30548820,
        }
    }

    /// Width in bytes of a point coordinate (and of r, s)
    pub fn coordinate_len(&self) -> usize {
        match self {
            CurveType::Secp256R1 => 32,
            CurveType::Secp384R1 => 48,
        }
    }

    pub fn digest(&self) -> MessageDigest {
        match self {
            CurveType::Secp256R1 => MessageDigest::sha256(),
            CurveType::Secp384R1 => MessageDigest::sha384(),
        }
    }

    pub fn nid(&self) -> Nid {
        match self {
            CurveType::Secp256R1 => Nid::X9_62_PRIME256V1,
            CurveType::Secp384R1 => Nid::SECP384R1,
        }
    }

    pub fn from_pubkey_magic(v: u32) -> Result<Self, Error> {
        Self::ALL
            .into_iter()
            .find(|c| c.pubkey_magic() == v)
            .ok_or_else(|| Error::UnknownCurve(format!("public key curve {}", to_formatted_hex(v))))
    }

    pub fn from_signature_magic(v: u32) -> Result<Self, Error> {
        Self::ALL
            .into_iter()
            .find(|c| c.signature_magic() == v)
            .ok_or_else(|| Error::UnknownCurve(format!("signature curve {}", to_formatted_hex(v))))
    }
}
