// Copyright 2025 Contributors to the Veraison project.
// SPDX-License-Identifier: Apache-2.0

//! Attestation sessions with FPGA devices.
//!
//! [`VerifierExchange`] drives the three operations a verifier runs against a
//! device:
//! * creating an attestation sub-key held by a [`SecurityEnclave`]
//! * platform attestation: collecting the PSG chain and the measurement
//!   response, checking the chain against the pinned root and comparing the
//!   measurements with a reference manifest
//! * a health check
//!
//! Devices are reached through a [`TransportProvider`].  Every operation
//! opens its own [`DeviceSession`] and reports a [`VerifierExchangeResponse`]
//! code instead of an error.
//!
//! # Example
//!
//! ```no_run
//! use fpgaverifier::verifier::{
//!     SecurityEnclave, TransportProvider, VerifierContext, VerifierExchange,
//!     VerifierExchangeResponse,
//! };
//!
//! # fn run(
//! #     config: &str,
//! #     transports: &dyn TransportProvider,
//! #     enclave: &dyn SecurityEnclave,
//! #     rim_hex: &str,
//! # ) -> Result<(), fpgaverifier::verifier::Error> {
//! let ctx = VerifierContext::load_json(config)?;
//! let exchange = VerifierExchange::new(&ctx, transports, enclave);
//!
//! let r = exchange.get_device_attestation("host:fpga0", Some(rim_hex));
//! if r.status == VerifierExchangeResponse::Success {
//!     println!("device {} attested", r.device_id);
//! }
//! # Ok(())
//! # }
//! ```

pub use self::commands::{
    CREATE_ATTESTATION_SUBKEY, GET_ATTESTATION_CERTIFICATE, GET_CHIPID, GET_MEASUREMENT,
};
pub use self::context::{Protocol, VerifierContext};
pub use self::crypto::{AesCtrProvider, CipherConfig, FixedIv, IvProvider};
pub use self::errors::Error;
pub use self::evidence::{
    sigma_evidence, spdm_evidence, Evidence, EvidenceRoutes, RouteHandler, RoutePredicate,
};
pub use self::exchange::{AttestationResponse, VerifierExchange, VerifierExchangeResponse};
pub use self::interfaces::{DistributionPointFetcher, SecurityEnclave, Transport, TransportProvider};
pub use self::session::{DeviceSession, SessionState};
pub use self::validator::{validate_context, PufType, CONTEXT_MAX_LEN};

pub mod commands;

mod context;
mod crypto;
mod errors;
mod evidence;
mod exchange;
mod interfaces;
mod session;
mod validator;

#[cfg(test)]
pub(crate) mod mocks;
