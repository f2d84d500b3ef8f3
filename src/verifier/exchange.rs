// Copyright 2025 Contributors to the Veraison project.
// SPDX-License-Identifier: Apache-2.0

use super::commands::{self, CREATE_ATTESTATION_SUBKEY, GET_CHIPID};
use super::context::VerifierContext;
use super::crypto::AesCtrProvider;
use super::errors::Error;
use super::evidence::EvidenceRoutes;
use super::interfaces::{SecurityEnclave, TransportProvider};
use super::session::{DeviceSession, SessionState};
use super::validator::{validate_context, PufType, CONTEXT_MAX_LEN};
use crate::measurements::{extract_measurements, MeasurementResponse};
use crate::psg::{parse_chain, ChainValidator, CurveType, PublicKeyMagic, PublicKeyRecord, SignatureRecord};
use crate::rim::ReferenceManifest;
use openssl::bn::BigNumContext;
use openssl::ec::{EcGroup, EcKey, EcPoint};
use openssl::ecdsa::EcdsaSig;

/// Curve of the attestation sub-keys created in the enclave
const SUBKEY_CURVE: CurveType = CurveType::Secp384R1;

/// Result code of a public operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerifierExchangeResponse {
    Success,
    Error,
    /// The device was examined and not found trustworthy
    Fail,
}

impl VerifierExchangeResponse {
    pub fn code(&self) -> i32 {
        match self {
            VerifierExchangeResponse::Success => 0,
            VerifierExchangeResponse::Error => -1,
            VerifierExchangeResponse::Fail => 1,
        }
    }
}

/// Outcome of a platform attestation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttestationResponse {
    /// Empty when the device could not be identified
    pub device_id: String,
    pub status: VerifierExchangeResponse,
}

fn enclave_err(e: openssl::error::ErrorStack) -> Error {
    Error::SecurityEnclave(e.to_string())
}

/// Turn an enclave public key (uncompressed SEC1 point) into a PSG record
fn enclave_public_key(sec1: &[u8]) -> Result<PublicKeyRecord, Error> {
    let group = EcGroup::from_curve_name(SUBKEY_CURVE.nid()).map_err(enclave_err)?;
    let mut ctx = BigNumContext::new().map_err(enclave_err)?;
    let point = EcPoint::from_bytes(&group, sec1, &mut ctx).map_err(enclave_err)?;
    let key = EcKey::from_public_key(&group, &point).map_err(enclave_err)?;

    Ok(PublicKeyRecord::from_ec_key(PublicKeyMagic::M1, SUBKEY_CURVE, &key)?)
}

/// Runs attestation operations against devices.  Every public operation
/// reports its outcome as a result code and never fails otherwise.
pub struct VerifierExchange<'a> {
    ctx: &'a VerifierContext,
    transports: &'a dyn TransportProvider,
    enclave: &'a dyn SecurityEnclave,
    routes: EvidenceRoutes,
}

impl<'a> VerifierExchange<'a> {
    pub fn new(
        ctx: &'a VerifierContext,
        transports: &'a dyn TransportProvider,
        enclave: &'a dyn SecurityEnclave,
    ) -> Self {
        Self {
            ctx,
            transports,
            enclave,
            routes: EvidenceRoutes::standard(),
        }
    }

    /// Use `routes` instead of the standard SIGMA/SPDM evidence routes
    pub fn with_routes(mut self, routes: EvidenceRoutes) -> Self {
        self.routes = routes;
        self
    }

    fn open_session(&self, transport_id: &str) -> Result<DeviceSession, Error> {
        Ok(DeviceSession::new(self.transports.connect(transport_id)?))
    }

    /// Create an attestation sub-key for the device behind `transport_id`.
    ///
    /// `context` (hex, at most 28 bytes) and `puf_type` are checked before
    /// anything is sent to the device.
    pub fn create_device_attestation_sub_key(
        &self,
        transport_id: &str,
        context: &str,
        puf_type: &str,
    ) -> VerifierExchangeResponse {
        let params = validate_context(context).and_then(|c| Ok((c, puf_type.parse::<PufType>()?)));

        let (context, puf) = match params {
            Ok(p) => p,
            Err(e) => {
                tracing::error!(error = %e, "rejected sub-key parameters");
                return VerifierExchangeResponse::Error;
            }
        };

        match self.create_sub_key(transport_id, &context, puf) {
            Ok(()) => VerifierExchangeResponse::Success,
            Err(e) => {
                tracing::error!(error = %e, "failed to create attestation sub-key");
                VerifierExchangeResponse::Error
            }
        }
    }

    fn create_sub_key(&self, transport_id: &str, context: &[u8], puf: PufType) -> Result<(), Error> {
        let mut session = self.open_session(transport_id)?;
        let device_id = session.initialize()?.to_string();

        tracing::info!(%device_id, ?puf, "creating attestation sub-key");

        match self.request_sub_key(&session, context, puf) {
            Ok(()) => session.transition(SessionState::SubKeyCreated),
            Err(e) => {
                session.fail();
                Err(e)
            }
        }
    }

    // CREATE_ATTESTATION_SUBKEY payload: `pufType u32 LE | context[28] |
    // publicKey | signature`, signed by the new key
    fn request_sub_key(
        &self,
        session: &DeviceSession,
        context: &[u8],
        puf: PufType,
    ) -> Result<(), Error> {
        let key_id = self.enclave.create_key(SUBKEY_CURVE)?;
        if !self.enclave.exists(&key_id)? {
            return Err(Error::SecurityEnclave(format!(
                "key {key_id} missing right after creation"
            )));
        }

        let public_key = enclave_public_key(&self.enclave.get_public_key(&key_id)?)?;

        let mut padded_context = context.to_vec();
        padded_context.resize(CONTEXT_MAX_LEN, 0);

        let mut payload = puf.code().to_le_bytes().to_vec();
        payload.extend_from_slice(&padded_context);
        payload.extend_from_slice(&public_key.encode());

        let der = self.enclave.sign(&key_id, &payload)?;
        let sig = EcdsaSig::from_der(&der).map_err(enclave_err)?;
        payload.extend_from_slice(&SignatureRecord::from_ecdsa_sig(SUBKEY_CURVE, &sig)?.encode());

        let response = commands::exchange(session.transport(), CREATE_ATTESTATION_SUBKEY, &payload)?;
        if response.is_empty() {
            return Err(Error::Transport(
                "empty response to CREATE_ATTESTATION_SUBKEY".to_string(),
            ));
        }

        Ok(())
    }

    /// Attest the device behind `transport_id` against the hex-encoded
    /// reference manifest
    pub fn get_device_attestation(
        &self,
        transport_id: &str,
        reference_manifest_hex: Option<&str>,
    ) -> AttestationResponse {
        let mut device_id = String::new();

        let status = match self.attest(transport_id, reference_manifest_hex, &mut device_id) {
            Ok(()) => {
                tracing::info!(%device_id, "platform attestation succeeded");
                VerifierExchangeResponse::Success
            }
            Err(e) if e.is_verification_failure() => {
                tracing::warn!(%device_id, error = %e, "platform attestation failed");
                VerifierExchangeResponse::Fail
            }
            Err(e) => {
                tracing::error!(%device_id, error = %e, "failed to perform platform attestation");
                VerifierExchangeResponse::Error
            }
        };

        AttestationResponse { device_id, status }
    }

    fn attest(
        &self,
        transport_id: &str,
        reference_manifest_hex: Option<&str>,
        device_id: &mut String,
    ) -> Result<(), Error> {
        let mut session = self.open_session(transport_id)?;
        device_id.push_str(session.initialize()?);

        tracing::info!(%device_id, "platform attestation started");

        let r = self.appraise(&mut session, reference_manifest_hex);
        if r.is_err() && session.state() != SessionState::Mismatched {
            session.fail();
        }

        r
    }

    fn appraise(
        &self,
        session: &mut DeviceSession,
        reference_manifest_hex: Option<&str>,
    ) -> Result<(), Error> {
        let evidence = self.routes.gather(self.ctx, session)?;
        session.transition(SessionState::AttestationRetrieved)?;

        let chain = parse_chain(evidence.chain());
        let leaf = ChainValidator::new(&self.ctx.trusted_root).validate(&chain)?;

        let response = MeasurementResponse::decode(evidence.measurements())?;

        if self.ctx.verify_measurements_signature
            && !response.verify_signature(&leaf.public_key)?
        {
            return Err(Error::MeasurementSignature(
                "measurement response is not signed by the device key".to_string(),
            ));
        }

        let records = match &self.ctx.measurement_cipher {
            Some(c) => AesCtrProvider::new(c.clone()).decrypt(&response.records)?,
            None => response.records,
        };

        let reported = extract_measurements(&records)?;
        tracing::debug!(count = reported.len(), "measurements reported");

        let rim = ReferenceManifest::parse_hex(reference_manifest_hex)?;
        if rim.is_empty() {
            return Err(Error::EmptyManifest);
        }

        let missing = rim.missing(&reported);
        if !missing.is_empty() {
            session.transition(SessionState::Mismatched)?;
            return Err(Error::MeasurementsMismatch(format!(
                "{} expected measurement(s) not reported",
                missing.len()
            )));
        }

        session.transition(SessionState::Matched)
    }

    /// Check that the device behind `transport_id` answers GET_CHIPID
    pub fn health_check(&self, transport_id: &str) -> VerifierExchangeResponse {
        let response = self.transports.connect(transport_id).and_then(|t| {
            let command = commands::encode_command(GET_CHIPID, &[])?;
            t.send_command(&command)
        });

        match response {
            Ok(r) if !r.is_empty() => {
                tracing::info!(response = %hex::encode_upper(&r), "health check response");
                VerifierExchangeResponse::Success
            }
            Ok(_) => {
                tracing::error!("health check: empty response to GET_CHIPID");
                VerifierExchangeResponse::Error
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to perform health check using GET_CHIPID");
                VerifierExchangeResponse::Error
            }
        }
    }
}
