// Copyright 2025 Contributors to the Veraison project.
// SPDX-License-Identifier: Apache-2.0

use super::buffer::ByteReader;
use super::errors::Error;
use super::magic::{to_formatted_hex, LEAF_ENTRY_MAGIC, ROOT_ENTRY_MAGIC};
use super::pubkey::PublicKeyRecord;
use super::signature::SignatureRecord;

pub const LEAF_HEADER_LEN: usize = 24;
pub const ROOT_HEADER_LEN: usize = 32;
const ROOT_RESERVED_LEN: usize = 12;

/// Position of an entry in the chain of trust
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CertificateKind {
    Root,
    Leaf,
}

/// A raw, still undecoded, certificate entry as found in a chain
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CertificateEntry {
    pub kind: CertificateKind,
    pub bytes: Vec<u8>,
}

impl CertificateEntry {
    pub fn new(kind: CertificateKind, bytes: Vec<u8>) -> Self {
        Self { kind, bytes }
    }

    pub fn decode(&self) -> Result<PsgCertificate, Error> {
        match self.kind {
            CertificateKind::Root => RootCertificate::decode(&self.bytes).map(PsgCertificate::Root),
            CertificateKind::Leaf => LeafCertificate::decode(&self.bytes).map(PsgCertificate::Leaf),
        }
    }
}

/// A decoded certificate entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PsgCertificate {
    Root(RootCertificate),
    Leaf(LeafCertificate),
}

impl PsgCertificate {
    pub fn public_key(&self) -> &PublicKeyRecord {
        match self {
            PsgCertificate::Root(r) => &r.public_key,
            PsgCertificate::Leaf(l) => &l.public_key,
        }
    }
}

fn check_magic(r: &mut ByteReader, expected: u32, what: &'static str) -> Result<(), Error> {
    let magic = r.get_u32_be()?;
    if magic != expected {
        return Err(Error::InvalidMagic {
            what,
            allowed: to_formatted_hex(expected),
            actual: to_formatted_hex(magic),
        });
    }
    Ok(())
}

/// The trust anchor entry.  It carries a public key but no signature.
///
/// Wire layout (big-endian): `magic | lengthOffset | dataLength | rootHashType
/// | msbOfPubKey | reserved[12] | publicKey`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RootCertificate {
    pub data_length: u32,
    pub root_hash_type: u32,
    pub msb_of_pub_key: u32,
    pub reserved: [u8; ROOT_RESERVED_LEN],
    pub public_key: PublicKeyRecord,
}

impl RootCertificate {
    pub fn new(public_key: PublicKeyRecord) -> Self {
        Self {
            data_length: public_key.encoded_len() as u32,
            root_hash_type: 0,
            msb_of_pub_key: 0,
            reserved: [0; ROOT_RESERVED_LEN],
            public_key,
        }
    }

    pub fn decode(buf: &[u8]) -> Result<Self, Error> {
        let mut r = ByteReader::new(buf);

        check_magic(&mut r, ROOT_ENTRY_MAGIC, "PSG root entry")?;

        let length_offset = r.get_u32_be()? as usize;
        let data_length = r.get_u32_be()?;
        let root_hash_type = r.get_u32_be()?;
        let msb_of_pub_key = r.get_u32_be()?;

        let mut reserved = [0u8; ROOT_RESERVED_LEN];
        reserved.copy_from_slice(r.get_bytes(ROOT_RESERVED_LEN)?);

        let key_len = length_offset.checked_sub(ROOT_HEADER_LEN).ok_or(
            Error::MalformedStructure {
                requested: ROOT_HEADER_LEN,
                remaining: length_offset,
            },
        )?;
        let public_key = PublicKeyRecord::decode_root_key(r.get_bytes(key_len)?)?;

        if !r.is_empty() {
            return Err(Error::TrailingBytes(r.remaining()));
        }

        Ok(Self {
            data_length,
            root_hash_type,
            msb_of_pub_key,
            reserved,
            public_key,
        })
    }

    pub fn encode(&self) -> Vec<u8> {
        let key = self.public_key.encode();
        let length_offset = (ROOT_HEADER_LEN + key.len()) as u32;

        let mut v = Vec::with_capacity(length_offset as usize);
        v.extend_from_slice(&ROOT_ENTRY_MAGIC.to_be_bytes());
        v.extend_from_slice(&length_offset.to_be_bytes());
        v.extend_from_slice(&self.data_length.to_be_bytes());
        v.extend_from_slice(&self.root_hash_type.to_be_bytes());
        v.extend_from_slice(&self.msb_of_pub_key.to_be_bytes());
        v.extend_from_slice(&self.reserved);
        v.extend_from_slice(&key);

        v
    }
}

/// A signed entry.  Its signature over the public key record was produced by
/// the key of its parent: the root for the first leaf, the first leaf for the
/// second.
///
/// Wire layout (big-endian): `magic | lengthOffset | dataLength |
/// signatureLength | shaLength | reserved | publicKey[dataLength] |
/// signature[signatureLength]`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeafCertificate {
    pub sha_length: u32,
    pub reserved: u32,
    pub public_key: PublicKeyRecord,
    pub signature: SignatureRecord,
}

impl LeafCertificate {
    /// Build a new entry for `public_key`, with `signer` producing the
    /// signature over its signed payload
    pub fn build<F>(public_key: PublicKeyRecord, signer: F) -> Result<Self, Error>
    where
        F: FnOnce(&[u8]) -> Result<SignatureRecord, Error>,
    {
        let signature = signer(&public_key.encode())?;

        Ok(Self {
            sha_length: 0,
            reserved: 0,
            public_key,
            signature,
        })
    }

    pub fn decode(buf: &[u8]) -> Result<Self, Error> {
        let mut r = ByteReader::new(buf);

        check_magic(&mut r, LEAF_ENTRY_MAGIC, "PSG certificate entry")?;

        let length_offset = r.get_u32_be()? as usize;
        let data_length = r.get_u32_be()? as usize;
        let signature_length = r.get_u32_be()? as usize;
        let sha_length = r.get_u32_be()?;
        let reserved = r.get_u32_be()?;

        let public_key = PublicKeyRecord::decode_exact(r.get_bytes(data_length)?)?;
        let signature = SignatureRecord::decode_exact(r.get_bytes(signature_length)?)?;

        if !r.is_empty() {
            return Err(Error::TrailingBytes(r.remaining()));
        }

        if length_offset != r.position() {
            return Err(Error::InvalidLeaf(format!(
                "declared length {length_offset} does not match actual length {}",
                r.position()
            )));
        }

        Ok(Self {
            sha_length,
            reserved,
            public_key,
            signature,
        })
    }

    fn header(&self) -> Vec<u8> {
        let data_length = self.public_key.encoded_len() as u32;
        let signature_length = self.signature.encoded_len() as u32;
        let length_offset = LEAF_HEADER_LEN as u32 + data_length + signature_length;

        let mut v = Vec::with_capacity(LEAF_HEADER_LEN);
        v.extend_from_slice(&LEAF_ENTRY_MAGIC.to_be_bytes());
        v.extend_from_slice(&length_offset.to_be_bytes());
        v.extend_from_slice(&data_length.to_be_bytes());
        v.extend_from_slice(&signature_length.to_be_bytes());
        v.extend_from_slice(&self.sha_length.to_be_bytes());
        v.extend_from_slice(&self.reserved.to_be_bytes());

        v
    }

    /// The bytes covered by the signature: the encoded public key record
    pub fn signed_payload(&self) -> Vec<u8> {
        self.public_key.encode()
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut v = self.header();
        v.extend_from_slice(&self.public_key.encode());
        v.extend_from_slice(&self.signature.encode());
        v
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::psg::encoding::TextEncoding;
    use crate::psg::magic::{CurveType, PublicKeyMagic};
    use crate::psg::pubkey::CoordinateLayout;
    use crate::psg::{parse_chain_text, testutil};

    #[test]
    fn root_roundtrip() {
        let key = testutil::gen_key(CurveType::Secp384R1);
        let root = testutil::root_certificate(&key, CurveType::Secp384R1);

        let raw = root.encode();
        assert_eq!(raw.len(), ROOT_HEADER_LEN + 24 + 96);
        assert_eq!(&raw[..4], &ROOT_ENTRY_MAGIC.to_be_bytes());

        let back = RootCertificate::decode(&raw).unwrap();
        assert_eq!(back, root);
        assert_eq!(back.encode(), raw);
    }

    #[test]
    fn leaf_roundtrip_and_payload() {
        let signer = testutil::gen_key(CurveType::Secp256R1);
        let key = testutil::gen_key(CurveType::Secp256R1);
        let leaf = testutil::leaf_certificate(&key, CurveType::Secp256R1, &signer);

        let raw = leaf.encode();
        let payload = leaf.signed_payload();

        // only the key record is signed, not the header
        assert_eq!(&raw[LEAF_HEADER_LEN..LEAF_HEADER_LEN + payload.len()], &payload[..]);
        assert_eq!(
            raw.len(),
            LEAF_HEADER_LEN + payload.len() + leaf.signature.encoded_len()
        );
        // lengthOffset covers the whole entry
        assert_eq!(
            u32::from_be_bytes([raw[4], raw[5], raw[6], raw[7]]) as usize,
            raw.len()
        );

        let back = LeafCertificate::decode(&raw).unwrap();
        assert_eq!(back, leaf);
        assert_eq!(back.encode(), raw);
    }

    #[test]
    fn decode_short_blobs() {
        assert!(matches!(
            LeafCertificate::decode(&[0u8; 5]),
            Err(Error::InvalidMagic { .. })
        ));
        assert_eq!(
            LeafCertificate::decode(&LEAF_ENTRY_MAGIC.to_be_bytes()[..]).unwrap_err(),
            Error::MalformedStructure {
                requested: 4,
                remaining: 0
            }
        );
        assert!(RootCertificate::decode(&[0u8; 4]).is_err());
    }

    #[test]
    fn leaf_with_inconsistent_length_offset() {
        let signer = testutil::gen_key(CurveType::Secp256R1);
        let key = testutil::gen_key(CurveType::Secp256R1);
        let mut raw = testutil::leaf_certificate(&key, CurveType::Secp256R1, &signer).encode();
        raw[7] ^= 0x01;

        assert!(matches!(
            LeafCertificate::decode(&raw),
            Err(Error::InvalidLeaf(_))
        ));
    }

    #[test]
    fn entry_dispatches_on_kind() {
        let key = testutil::gen_key(CurveType::Secp384R1);
        let root = testutil::root_certificate(&key, CurveType::Secp384R1);
        let entry = CertificateEntry::new(CertificateKind::Root, root.encode());

        let decoded = entry.decode().unwrap();

        assert_eq!(decoded.public_key().magic, PublicKeyMagic::M1);
        assert!(matches!(decoded, PsgCertificate::Root(_)));

        let wrong = CertificateEntry::new(CertificateKind::Leaf, root.encode());
        assert!(wrong.decode().is_err());
    }

    #[test]
    fn device_entries_decode_and_reencode() {
        let chain = parse_chain_text(testutil::DEVICE_CHAIN_B64, TextEncoding::Base64).unwrap();

        let leaf = LeafCertificate::decode(&chain[0].bytes).unwrap();
        assert_eq!(leaf.public_key.magic, PublicKeyMagic::Manifest);
        assert_eq!(leaf.public_key.curve, CurveType::Secp384R1);
        assert_eq!(leaf.public_key.layout, CoordinateLayout::Joined);
        assert_eq!(leaf.public_key.x.len(), 48);
        assert_eq!(leaf.public_key.y.len(), 48);
        assert_eq!(leaf.encode(), chain[0].bytes);
        assert_eq!(leaf.signed_payload(), &chain[0].bytes[LEAF_HEADER_LEN..144]);

        let root = RootCertificate::decode(&chain[1].bytes).unwrap();
        assert_eq!(root.public_key.magic, PublicKeyMagic::Root);
        assert_eq!(root.public_key.layout, CoordinateLayout::Split);
        assert_eq!(root.data_length, 0x80);
        assert_eq!(root.encode(), chain[1].bytes);

        // the root key magic is refused in a leaf
        let mut raw = chain[0].bytes.clone();
        raw[LEAF_HEADER_LEN..LEAF_HEADER_LEN + 4].copy_from_slice(&PublicKeyMagic::Root.value().to_be_bytes());
        assert!(matches!(
            LeafCertificate::decode(&raw),
            Err(Error::InvalidMagic { .. })
        ));
    }
}
