// Copyright 2025 Contributors to the Veraison project.
// SPDX-License-Identifier: Apache-2.0

use base64::{
    alphabet,
    engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig},
    Engine as _,
};

use super::errors::Error;

/// Text encodings in which chains and manifests travel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextEncoding {
    Base64,
    Hex,
}

// devices and tooling emit base64 with loose padding and non-canonical trailing
// bits, accept both
const LENIENT: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new()
        .with_decode_allow_trailing_bits(true)
        .with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

fn strip_whitespace(v: &str) -> String {
    v.chars().filter(|c| !c.is_whitespace()).collect()
}

/// decodes bytes from a base64-encoded string (standard alphabet, line breaks
/// allowed)
pub fn decode_base64(v: &str) -> Result<Vec<u8>, Error> {
    LENIENT
        .decode(strip_whitespace(v))
        .map_err(|e| Error::Encoding(e.to_string()))
}

/// decodes bytes from a hex-encoded string, either case
pub fn decode_hex(v: &str) -> Result<Vec<u8>, Error> {
    hex::decode(strip_whitespace(v)).map_err(|e| Error::Encoding(e.to_string()))
}

pub fn decode(v: &str, encoding: TextEncoding) -> Result<Vec<u8>, Error> {
    match encoding {
        TextEncoding::Base64 => decode_base64(v),
        TextEncoding::Hex => decode_hex(v),
    }
}

/// Guess the encoding of `v`: text made only of an even number of hex digits
/// is taken as hex, anything else as base64
pub fn detect(v: &str) -> TextEncoding {
    let s = strip_whitespace(v);

    if s.len() % 2 == 0 && s.chars().all(|c| c.is_ascii_hexdigit()) {
        TextEncoding::Hex
    } else {
        TextEncoding::Base64
    }
}

pub fn decode_auto(v: &str) -> Result<Vec<u8>, Error> {
    decode(v, detect(v))
}
