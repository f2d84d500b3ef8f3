// Copyright 2025 Contributors to the Veraison project.
// SPDX-License-Identifier: Apache-2.0

//! Reference integrity manifests (RIM): the golden measurements a device is
//! expected to report.
//!
//! A manifest is a JSON document, usually transported as hex-encoded UTF-8:
//!
//! ```json
//! {
//!   "rim-version": "1.0",
//!   "reference-measurements": [
//!     { "section": "core", "value": "A1B2..." },
//!     { "section": "pr", "index": 16777216, "value": "C3D4..." }
//!   ]
//! }
//! ```

pub use self::errors::Error;
pub use self::manifest::ReferenceManifest;

mod errors;
mod manifest;
