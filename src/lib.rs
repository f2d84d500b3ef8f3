// Copyright 2025 Contributors to the Veraison project.
// SPDX-License-Identifier: Apache-2.0

//! FPGA root-of-trust attestation.
//!
//! This crate provides an API to verify the identity of an FPGA device and
//! appraise the measurements it reports.  The device proves its identity
//! with a chain of PSG certificate entries anchored in a pinned root, and
//! reports DMTF-formatted measurements of its sections which are compared
//! against a reference integrity manifest (RIM).
//!
//! The API allows:
//! * Decoding PSG public keys, signatures and certificate entries
//! * Validating a PSG chain against a trusted root
//! * Extracting measurements from a device measurement response
//! * Parsing a reference integrity manifest
//! * Running sub-key creation, platform attestation and health checks
//!   against devices through pluggable transports and key stores

pub mod measurements;
pub mod psg;
pub mod rim;
pub mod verifier;
