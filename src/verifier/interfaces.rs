// Copyright 2025 Contributors to the Veraison project.
// SPDX-License-Identifier: Apache-2.0

use super::errors::Error;
use crate::psg::CurveType;

/// A byte pipe to one device
pub trait Transport {
    /// Send a command and block until the device answers
    fn send_command(&self, command: &[u8]) -> Result<Vec<u8>, Error>;
}

/// Opens transports to devices
pub trait TransportProvider {
    /// Connect to the device identified by `transport_id`.  The returned
    /// transport is owned by a single operation and dropped at its end.
    fn connect(&self, transport_id: &str) -> Result<Box<dyn Transport>, Error>;
}

/// Key storage and signing capability.
///
/// Public keys are exchanged as uncompressed SEC1 points and signatures as
/// DER-encoded ECDSA signatures.
pub trait SecurityEnclave {
    /// Create a new key pair and return its identifier
    fn create_key(&self, curve: CurveType) -> Result<String, Error>;

    fn sign(&self, key_id: &str, data: &[u8]) -> Result<Vec<u8>, Error>;

    fn get_public_key(&self, key_id: &str) -> Result<Vec<u8>, Error>;

    fn exists(&self, key_id: &str) -> Result<bool, Error>;
}

/// Retrieves artifacts (e.g., root entries) published at a distribution
/// point
pub trait DistributionPointFetcher {
    fn fetch(&self, url: &str) -> Result<Vec<u8>, Error>;
}
