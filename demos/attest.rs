// Copyright 2025 Contributors to the Veraison project.
// SPDX-License-Identifier: Apache-2.0

extern crate fpgaverifier;

use fpgaverifier::measurements::{DmtfHeader, MeasurementRecordHeader};
use fpgaverifier::psg::{
    CertificateEntry, CertificateKind, CurveType, LeafCertificate, PublicKeyMagic,
    PublicKeyRecord, RootCertificate, SignatureRecord,
};
use fpgaverifier::verifier::{
    commands, Error, SecurityEnclave, Transport, TransportProvider, VerifierContext,
    VerifierExchange, GET_ATTESTATION_CERTIFICATE, GET_CHIPID, GET_MEASUREMENT,
};
use openssl::ec::{EcGroup, EcKey};
use openssl::ecdsa::EcdsaSig;
use openssl::hash::hash;
use openssl::pkey::Private;
use tracing_subscriber::EnvFilter;

const CURVE: CurveType = CurveType::Secp384R1;
const CHIP_ID: [u8; 8] = [0x00, 0x11, 0x22, 0x33, 0x44, 0x55, 0x66, 0x77];
const FIRMWARE: [u8; 48] = [0x01; 48];
const CORE: [u8; 48] = [0x03; 48];

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let root_key = gen_key();
    let device = SimulatedDevice::new(&root_key);
    let ctx = VerifierContext::new(root_entry(&root_key).bytes);
    let enclave = NoEnclave;

    let exchange = VerifierExchange::new(&ctx, &device, &enclave);

    println!("health check: {:?}", exchange.health_check("sim:fpga0"));

    let good = rim(&[("firmware", &FIRMWARE[..]), ("core", &CORE[..])]);
    let r = exchange.get_device_attestation("sim:fpga0", Some(&good));
    println!("attestation with matching RIM: {:?}", r);

    let bad = rim(&[("core", &[0xEE; 48][..])]);
    let r = exchange.get_device_attestation("sim:fpga0", Some(&bad));
    println!("attestation with stale RIM: {:?}", r);
}

fn gen_key() -> EcKey<Private> {
    let group = EcGroup::from_curve_name(CURVE.nid()).unwrap();
    EcKey::generate(&group).unwrap()
}

fn root_entry(key: &EcKey<Private>) -> CertificateEntry {
    let pk = PublicKeyRecord::from_ec_key(PublicKeyMagic::Root, CURVE, key).unwrap();
    CertificateEntry::new(CertificateKind::Root, RootCertificate::new(pk).encode())
}

fn leaf_entry(key: &EcKey<Private>, signer: &EcKey<Private>) -> CertificateEntry {
    let pk = PublicKeyRecord::from_ec_key(PublicKeyMagic::Manifest, CURVE, key).unwrap();

    let leaf = LeafCertificate::build(pk, |payload| {
        let digest = hash(CURVE.digest(), payload)?;
        let sig = EcdsaSig::sign(&digest, signer)?;
        SignatureRecord::from_ecdsa_sig(CURVE, &sig)
    })
    .unwrap();

    CertificateEntry::new(CertificateKind::Leaf, leaf.encode())
}

/// A reference manifest in its hex-encoded JSON form
fn rim(values: &[(&str, &[u8])]) -> String {
    let m: Vec<_> = values
        .iter()
        .map(|(s, v)| serde_json::json!({ "section": s, "value": hex::encode(v) }))
        .collect();
    let j = serde_json::json!({ "rim-version": "1.0", "reference-measurements": m });

    hex::encode(j.to_string())
}

/// A device answering the SIGMA mailbox commands with a leaf-first chain and
/// an unsigned measurement response
struct SimulatedDevice {
    chain: Vec<u8>,
    measurements: Vec<u8>,
}

impl SimulatedDevice {
    fn new(root_key: &EcKey<Private>) -> Self {
        let alias = gen_key();
        let entries = [leaf_entry(&alias, root_key), root_entry(root_key)];

        Self {
            chain: entries.iter().flat_map(|e| e.bytes.clone()).collect(),
            measurements: measurement_response(),
        }
    }
}

fn measurement_response() -> Vec<u8> {
    let mut records = Vec::new();

    for (index, kind, value) in [(0x00, 0x01, FIRMWARE), (0x03, 0x03, CORE)] {
        let h = MeasurementRecordHeader {
            index,
            measurement_spec: 1,
            measurement_size: 3 + value.len() as u16,
        };
        let d = DmtfHeader {
            kind,
            raw: false,
            size: value.len() as u16,
        };

        records.extend_from_slice(&h.encode());
        records.extend_from_slice(&d.encode());
        records.extend_from_slice(&value);
    }

    // two measurement blocks, then the 24-bit record length
    let mut v = vec![2];
    v.extend_from_slice(&(records.len() as u32).to_le_bytes()[..3]);
    v.extend_from_slice(&records);
    v
}

impl Transport for SimulatedDevice {
    fn send_command(&self, command: &[u8]) -> Result<Vec<u8>, Error> {
        let code = command
            .get(..4)
            .map(|h| (u32::from_le_bytes([h[0], h[1], h[2], h[3]]) & 0x7FF) as u16)
            .ok_or_else(|| Error::Transport("short command".to_string()))?;

        let payload = match code {
            GET_CHIPID => CHIP_ID.to_vec(),
            GET_ATTESTATION_CERTIFICATE => self.chain.clone(),
            GET_MEASUREMENT => self.measurements.clone(),
            other => return Err(Error::Transport(format!("unsupported command 0x{other:03X}"))),
        };

        Ok(commands::encode_response(&payload))
    }
}

impl TransportProvider for SimulatedDevice {
    fn connect(&self, _transport_id: &str) -> Result<Box<dyn Transport>, Error> {
        Ok(Box::new(SimulatedDevice {
            chain: self.chain.clone(),
            measurements: self.measurements.clone(),
        }))
    }
}

/// Platform attestation needs no keys of its own
struct NoEnclave;

impl SecurityEnclave for NoEnclave {
    fn create_key(&self, _curve: CurveType) -> Result<String, Error> {
        Err(Error::SecurityEnclave("no key storage".to_string()))
    }

    fn sign(&self, _key_id: &str, _data: &[u8]) -> Result<Vec<u8>, Error> {
        Err(Error::SecurityEnclave("no key storage".to_string()))
    }

    fn get_public_key(&self, _key_id: &str) -> Result<Vec<u8>, Error> {
        Err(Error::SecurityEnclave("no key storage".to_string()))
    }

    fn exists(&self, _key_id: &str) -> Result<bool, Error> {
        Ok(false)
    }
}
