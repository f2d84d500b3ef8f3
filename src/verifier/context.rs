// Copyright 2025 Contributors to the Veraison project.
// SPDX-License-Identifier: Apache-2.0

use super::crypto::CipherConfig;
use super::errors::Error;
use super::interfaces::DistributionPointFetcher;
use crate::psg::{encoding, RootCertificate};
use serde::Deserialize;

/// Wire protocol used to collect evidence from the device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    #[default]
    Sigma,
    Spdm,
}

const DEFAULT_CERTIFICATE_TYPE: u32 = 1;

fn default_certificate_type() -> u32 {
    DEFAULT_CERTIFICATE_TYPE
}

/// JSON format for the verifier configuration
#[derive(Deserialize, Debug)]
struct ContextDocument {
    /// The pinned PSG root entry, base64 or hex
    #[serde(rename(deserialize = "trusted-root"))]
    trusted_root: String,

    #[serde(rename(deserialize = "protocol"), default)]
    protocol: Protocol,

    #[serde(rename(deserialize = "verify-measurements-signature"), default)]
    verify_measurements_signature: bool,

    /// Certificate type requested with GET_ATTESTATION_CERTIFICATE
    #[serde(
        rename(deserialize = "attestation-certificate-type"),
        default = "default_certificate_type"
    )]
    attestation_certificate_type: u32,
}

/// Settings shared by every operation of a [`super::VerifierExchange`].
/// Built once and passed in by reference.
#[derive(Debug, Clone)]
pub struct VerifierContext {
    /// Raw bytes of the pinned PSG root entry
    pub trusted_root: Vec<u8>,
    pub protocol: Protocol,
    /// Require and check a device signature over measurement responses
    pub verify_measurements_signature: bool,
    pub attestation_certificate_type: u32,
    /// Decrypts the measurement record stream when set
    pub measurement_cipher: Option<CipherConfig>,
}

impl VerifierContext {
    pub fn new(trusted_root: Vec<u8>) -> Self {
        Self {
            trusted_root,
            protocol: Protocol::default(),
            verify_measurements_signature: false,
            attestation_certificate_type: DEFAULT_CERTIFICATE_TYPE,
            measurement_cipher: None,
        }
    }

    fn check_root(root: &[u8]) -> Result<(), Error> {
        RootCertificate::decode(root)
            .map(|_| ())
            .map_err(|e| Error::Config(format!("trusted root: {e}")))
    }

    /// Build a context from its JSON description
    pub fn load_json(j: &str) -> Result<Self, Error> {
        let doc: ContextDocument =
            serde_json::from_str(j).map_err(|e| Error::Config(e.to_string()))?;

        let trusted_root = encoding::decode_auto(&doc.trusted_root)
            .map_err(|e| Error::Config(format!("trusted root: {e}")))?;
        Self::check_root(&trusted_root)?;

        Ok(Self {
            trusted_root,
            protocol: doc.protocol,
            verify_measurements_signature: doc.verify_measurements_signature,
            attestation_certificate_type: doc.attestation_certificate_type,
            measurement_cipher: None,
        })
    }

    /// Replace the pinned root with the one published at `url`
    pub fn with_trusted_root_from(
        mut self,
        fetcher: &dyn DistributionPointFetcher,
        url: &str,
    ) -> Result<Self, Error> {
        let root = fetcher.fetch(url)?;
        Self::check_root(&root)?;

        tracing::info!(url, "trusted root fetched from distribution point");
        self.trusted_root = root;

        Ok(self)
    }

    pub fn with_protocol(mut self, protocol: Protocol) -> Self {
        self.protocol = protocol;
        self
    }

    pub fn with_measurements_signature(mut self, verify: bool) -> Self {
        self.verify_measurements_signature = verify;
        self
    }

    pub fn with_measurement_cipher(mut self, cipher: CipherConfig) -> Self {
        self.measurement_cipher = Some(cipher);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::psg::testutil;
    use crate::psg::CurveType;

    struct StaticFetcher(Vec<u8>);

    impl DistributionPointFetcher for StaticFetcher {
        fn fetch(&self, url: &str) -> Result<Vec<u8>, Error> {
            if url.starts_with("https://") {
                Ok(self.0.clone())
            } else {
                Err(Error::Transport(format!("cannot fetch {url}")))
            }
        }
    }

    fn root() -> Vec<u8> {
        testutil::root_entry(&testutil::gen_key(CurveType::Secp384R1)).bytes
    }

    #[test]
    fn load_json_ok() {
        let r = root();
        let j = format!(
            r#"{{
                "trusted-root": "{}",
                "protocol": "spdm",
                "verify-measurements-signature": true
            }}"#,
            hex::encode(&r)
        );

        let ctx = VerifierContext::load_json(&j).unwrap();

        assert_eq!(ctx.trusted_root, r);
        assert_eq!(ctx.protocol, Protocol::Spdm);
        assert!(ctx.verify_measurements_signature);
        assert_eq!(ctx.attestation_certificate_type, 1);
        assert!(ctx.measurement_cipher.is_none());
    }

    #[test]
    fn load_json_defaults_and_base64() {
        use base64::Engine as _;

        let r = root();
        let j = format!(
            r#"{{ "trusted-root": "{}" }}"#,
            base64::engine::general_purpose::STANDARD.encode(&r)
        );

        let ctx = VerifierContext::load_json(&j).unwrap();

        assert_eq!(ctx.trusted_root, r);
        assert_eq!(ctx.protocol, Protocol::Sigma);
        assert!(!ctx.verify_measurements_signature);
    }

    #[test]
    fn load_json_errors() {
        assert!(matches!(
            VerifierContext::load_json("{}"),
            Err(Error::Config(_))
        ));
        assert!(matches!(
            VerifierContext::load_json(r#"{"trusted-root": "00112233"}"#),
            Err(Error::Config(_))
        ));
        assert!(matches!(
            VerifierContext::load_json(r#"{"trusted-root": "00", "protocol": "tls"}"#),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn trusted_root_from_distribution_point() {
        let r = root();
        let fetcher = StaticFetcher(r.clone());

        let ctx = VerifierContext::new(vec![])
            .with_trusted_root_from(&fetcher, "https://dp.example/root.psg")
            .unwrap();
        assert_eq!(ctx.trusted_root, r);

        assert!(matches!(
            VerifierContext::new(vec![]).with_trusted_root_from(&fetcher, "ftp://x"),
            Err(Error::Transport(_))
        ));

        let junk = StaticFetcher(vec![0; 8]);
        assert!(matches!(
            VerifierContext::new(vec![]).with_trusted_root_from(&junk, "https://x"),
            Err(Error::Config(_))
        ));
    }
}
