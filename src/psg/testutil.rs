// Copyright 2025 Contributors to the Veraison project.
// SPDX-License-Identifier: Apache-2.0

//! Key and chain minting helpers shared by the unit tests

use super::entry::{CertificateEntry, CertificateKind, LeafCertificate, RootCertificate};
use super::magic::{CurveType, PublicKeyMagic};
use super::pubkey::PublicKeyRecord;
use super::signature::SignatureRecord;
use openssl::ec::{EcGroup, EcKey};
use openssl::ecdsa::EcdsaSig;
use openssl::hash::hash;
use openssl::nid::Nid;
use openssl::pkey::Private;

/// A leaf and root entry as streamed by a device (leaf first).  The leaf key
/// uses the joined coordinate layout and the root key the root key magic.
pub const DEVICE_CHAIN_B64: &str = "\
    klQJFwAAAQEAAAB4AAAAcQAAAAAAAAAAQGVmQwAAAGAAAAAAVDJmSAAAAAAAAAAAya2F1W0d3j9A
    DJVlaI+eTxVZ3s/bo3DUqecSOuolIADT3kRuuXcUjxgTH0PLY9083YSjvQW3qnzRPAHxGy2rztM+
    fsAcEEOlxDjtDsEuo3iyxZthzsp37GB3vwtqdZ1ydIgVIAAAADEAAAAwMFSIIACyX7rxh6JYJl1w
    DD5CF1Yb82Y4nq+3XhxObBKX5AlXURKVnB1BcHEyCoj7oUJPi05zwUiFh3P4f/IOAUcTNGtsGz+b
    EwcAKjvWpiKV3dMzhys+mm8SZtejGckyVioytO+JJZA2AAAAmAAAAIAAAAAAAAAAAAAAAAAAAAAA
    AAAAAJMQURgAAAAwAAAAMFQyZkgAAAAAAAAAAPbj1fueGTJ+o+7059WPUiaeAug0Q09BxXIiunnN
    pcqBXj95VWv75oZCW8JFxZ/I0AwWDUOBAXmogSc8SCNXe0NHJfjRSeGhT8lowHNttjsU1YUPn4ZU
    nI05E6yfsZ0DNw==";

pub fn gen_key(curve: CurveType) -> EcKey<Private> {
    let group = EcGroup::from_curve_name(curve.nid()).unwrap();
    EcKey::generate(&group).unwrap()
}

pub fn curve_of(key: &EcKey<Private>) -> CurveType {
    match key.group().curve_name() {
        Some(Nid::X9_62_PRIME256V1) => CurveType::Secp256R1,
        Some(Nid::SECP384R1) => CurveType::Secp384R1,
        other => panic!("unexpected test curve {other:?}"),
    }
}

pub fn public_key(key: &EcKey<Private>, curve: CurveType) -> PublicKeyRecord {
    PublicKeyRecord::from_ec_key(PublicKeyMagic::M1, curve, key).unwrap()
}

pub fn sign(signer: &EcKey<Private>, data: &[u8]) -> SignatureRecord {
    let curve = curve_of(signer);
    let digest = hash(curve.digest(), data).unwrap();
    let sig = EcdsaSig::sign(&digest, signer).unwrap();
    SignatureRecord::from_ecdsa_sig(curve, &sig).unwrap()
}

pub fn root_certificate(key: &EcKey<Private>, curve: CurveType) -> RootCertificate {
    RootCertificate::new(public_key(key, curve))
}

pub fn leaf_certificate(
    key: &EcKey<Private>,
    curve: CurveType,
    signer: &EcKey<Private>,
) -> LeafCertificate {
    LeafCertificate::build(public_key(key, curve), |payload| {
        Ok(sign(signer, payload))
    })
    .unwrap()
}

pub fn root_entry(key: &EcKey<Private>) -> CertificateEntry {
    CertificateEntry::new(
        CertificateKind::Root,
        root_certificate(key, curve_of(key)).encode(),
    )
}

pub fn leaf_entry(key: &EcKey<Private>, signer: &EcKey<Private>) -> CertificateEntry {
    CertificateEntry::new(
        CertificateKind::Leaf,
        leaf_certificate(key, curve_of(key), signer).encode(),
    )
}

/// Root R, leaf L1 signed by R, leaf L2 signed by L1
pub struct TestChain {
    pub root: EcKey<Private>,
    pub leaf1: EcKey<Private>,
    pub leaf2: EcKey<Private>,
    pub entries: Vec<CertificateEntry>,
}

pub fn three_entry_chain(curve: CurveType) -> TestChain {
    let root = gen_key(curve);
    let leaf1 = gen_key(curve);
    let leaf2 = gen_key(curve);

    let entries = vec![
        root_entry(&root),
        leaf_entry(&leaf1, &root),
        leaf_entry(&leaf2, &leaf1),
    ];

    TestChain {
        root,
        leaf1,
        leaf2,
        entries,
    }
}

/// Concatenate entries the way a device streams them
pub fn stream(entries: &[CertificateEntry]) -> Vec<u8> {
    entries.iter().flat_map(|e| e.bytes.clone()).collect()
}
