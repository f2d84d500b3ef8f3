// Copyright 2025 Contributors to the Veraison project.
// SPDX-License-Identifier: Apache-2.0

use super::commands::{self, spdm, GET_ATTESTATION_CERTIFICATE, GET_MEASUREMENT};
use super::context::{Protocol, VerifierContext};
use super::errors::Error;
use super::session::DeviceSession;
use bitmask::*;

bitmask! {
    #[derive(Debug)]
    mask EvidenceSet: u8 where flags EvidencePart {
        Chain        = 0x01,
        Measurements = 0x02,
    }
}

/// Raw device evidence: the PSG chain and the measurement response
#[derive(Debug)]
pub struct Evidence {
    chain: Vec<u8>,
    measurements: Vec<u8>,

    parts: EvidenceSet,
}

impl Default for Evidence {
    fn default() -> Self {
        Self::new()
    }
}

impl Evidence {
    pub fn new() -> Self {
        Self {
            chain: Vec::new(),
            measurements: Vec::new(),
            parts: EvidenceSet::none(),
        }
    }

    pub fn set_chain(&mut self, v: Vec<u8>) -> Result<(), Error> {
        if self.parts.contains(EvidencePart::Chain) {
            return Err(Error::DuplicatedEvidence("chain".to_string()));
        }

        self.chain = v;
        self.parts.set(EvidencePart::Chain);

        Ok(())
    }

    pub fn set_measurements(&mut self, v: Vec<u8>) -> Result<(), Error> {
        if self.parts.contains(EvidencePart::Measurements) {
            return Err(Error::DuplicatedEvidence("measurements".to_string()));
        }

        self.measurements = v;
        self.parts.set(EvidencePart::Measurements);

        Ok(())
    }

    /// Check that every mandatory part has been collected
    pub fn validate(&self) -> Result<(), Error> {
        let mandatory_parts = [
            (EvidencePart::Chain, "certificate chain"),
            (EvidencePart::Measurements, "measurements"),
        ];

        for (p, n) in mandatory_parts.iter() {
            if !self.parts.contains(*p) {
                return Err(Error::MissingEvidence(n.to_string()));
            }
        }

        Ok(())
    }

    pub fn chain(&self) -> &[u8] {
        &self.chain
    }

    pub fn measurements(&self) -> &[u8] {
        &self.measurements
    }
}

pub type RoutePredicate = fn(&VerifierContext, &DeviceSession) -> bool;
pub type RouteHandler = fn(&VerifierContext, &DeviceSession) -> Result<Evidence, Error>;

/// Alternative ways of collecting evidence.  Routes are tried in order, the
/// first whose predicate holds is taken, and the default is used when none
/// does.
pub struct EvidenceRoutes {
    routes: Vec<(RoutePredicate, RouteHandler)>,
    default: RouteHandler,
}

impl EvidenceRoutes {
    pub fn new(default: RouteHandler) -> Self {
        Self {
            routes: Vec::new(),
            default,
        }
    }

    pub fn route(mut self, predicate: RoutePredicate, handler: RouteHandler) -> Self {
        self.routes.push((predicate, handler));
        self
    }

    /// SPDM when the context asks for it, SIGMA otherwise
    pub fn standard() -> Self {
        Self::new(sigma_evidence).route(|ctx, _| ctx.protocol == Protocol::Spdm, spdm_evidence)
    }

    fn select(&self, ctx: &VerifierContext, session: &DeviceSession) -> RouteHandler {
        self.routes
            .iter()
            .find(|(p, _)| p(ctx, session))
            .map(|(_, h)| *h)
            .unwrap_or(self.default)
    }

    pub fn gather(&self, ctx: &VerifierContext, session: &DeviceSession) -> Result<Evidence, Error> {
        let evidence = self.select(ctx, session)(ctx, session)?;
        evidence.validate()?;

        Ok(evidence)
    }
}

impl Default for EvidenceRoutes {
    fn default() -> Self {
        Self::standard()
    }
}

impl std::fmt::Debug for EvidenceRoutes {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EvidenceRoutes")
            .field("routes", &self.routes.len())
            .finish()
    }
}

/// Collect evidence with SIGMA mailbox commands
pub fn sigma_evidence(ctx: &VerifierContext, session: &DeviceSession) -> Result<Evidence, Error> {
    let t = session.transport();
    let mut e = Evidence::new();

    e.set_chain(commands::exchange(
        t,
        GET_ATTESTATION_CERTIFICATE,
        &ctx.attestation_certificate_type.to_le_bytes(),
    )?)?;
    e.set_measurements(commands::exchange(t, GET_MEASUREMENT, &[])?)?;

    Ok(e)
}

const SPDM_PORTION_LEN: u16 = 0x400;
const SPDM_CERTIFICATE_SLOT: u8 = 0;

/// Collect evidence with SPDM messages.  The chain may arrive in several
/// portions.
pub fn spdm_evidence(_ctx: &VerifierContext, session: &DeviceSession) -> Result<Evidence, Error> {
    let t = session.transport();
    let mut e = Evidence::new();

    let mut chain = Vec::new();
    loop {
        let offset = u16::try_from(chain.len())
            .map_err(|_| Error::Transport("SPDM certificate chain too long".to_string()))?;

        let resp = t.send_command(&spdm::get_certificate(
            SPDM_CERTIFICATE_SLOT,
            offset,
            SPDM_PORTION_LEN,
        ))?;
        let (portion, remainder) = spdm::certificate_portion(&resp)?;

        if portion.is_empty() && remainder > 0 {
            return Err(Error::Transport(
                "SPDM CERTIFICATE made no progress".to_string(),
            ));
        }

        chain.extend_from_slice(portion);

        if remainder == 0 {
            break;
        }
    }
    e.set_chain(chain)?;

    let resp = t.send_command(&spdm::get_measurements())?;
    e.set_measurements(spdm::measurements(&resp)?.to_vec())?;

    Ok(e)
}
