// Copyright 2025 Contributors to the Veraison project.
// SPDX-License-Identifier: Apache-2.0

//! Device command framing.
//!
//! SIGMA commands travel as mailbox messages: a little-endian header word
//! (`code` in bits 0-10, payload length in words in bits 12-22) followed by
//! the word-aligned payload.  Responses use the same header with an error
//! code in place of the command code.  SPDM messages carry a 4-byte header
//! `{version, code, param1, param2}`.

use super::errors::Error;
use crate::psg::ByteReader;

pub const GET_CHIPID: u16 = 0x12;
pub const GET_ATTESTATION_CERTIFICATE: u16 = 0x181;
pub const CREATE_ATTESTATION_SUBKEY: u16 = 0x182;
pub const GET_MEASUREMENT: u16 = 0x183;

const CODE_MASK: u32 = 0x7FF;
const LENGTH_SHIFT: u32 = 12;
const LENGTH_MASK: u32 = 0x7FF;
const WORD: usize = 4;

fn header(code: u32, words: usize) -> Result<[u8; WORD], Error> {
    let words = u32::try_from(words)
        .ok()
        .filter(|w| *w <= LENGTH_MASK)
        .ok_or_else(|| Error::InvalidParameter(format!("payload of {words} words too long")))?;

    Ok(((code & CODE_MASK) | (words << LENGTH_SHIFT)).to_le_bytes())
}

fn pad_to_words(payload: &[u8]) -> Vec<u8> {
    let mut v = payload.to_vec();
    v.resize(payload.len().div_ceil(WORD) * WORD, 0);
    v
}

/// Frame a mailbox command
pub fn encode_command(code: u16, payload: &[u8]) -> Result<Vec<u8>, Error> {
    let body = pad_to_words(payload);

    let mut v = header(u32::from(code), body.len() / WORD)?.to_vec();
    v.extend_from_slice(&body);

    Ok(v)
}

/// Strip and check the header of a mailbox response, returning its payload
pub fn decode_response(buf: &[u8]) -> Result<Vec<u8>, Error> {
    let mut r = ByteReader::new(buf);

    let h = r
        .get_bytes(WORD)
        .map_err(|e| Error::Transport(format!("response header: {e}")))?;
    let h = u32::from_le_bytes([h[0], h[1], h[2], h[3]]);

    let status = h & CODE_MASK;
    if status != 0 {
        return Err(Error::Transport(format!(
            "device returned error 0x{status:03X}"
        )));
    }

    let len = ((h >> LENGTH_SHIFT) & LENGTH_MASK) as usize * WORD;
    let payload = r
        .get_bytes(len)
        .map_err(|e| Error::Transport(format!("response payload: {e}")))?;

    Ok(payload.to_vec())
}

/// Send a mailbox command and return the payload of its response
pub fn exchange(
    transport: &dyn super::interfaces::Transport,
    code: u16,
    payload: &[u8],
) -> Result<Vec<u8>, Error> {
    let response = transport.send_command(&encode_command(code, payload)?)?;
    decode_response(&response)
}

pub mod spdm {
    use super::Error;
    use crate::psg::{self, ByteReader};

    pub const VERSION: u8 = 0x12;
    pub const GET_CERTIFICATE: u8 = 0x82;
    pub const GET_MEASUREMENTS: u8 = 0xE0;

    const CERTIFICATE: u8 = 0x02;
    const MEASUREMENTS: u8 = 0x60;
    const ERROR: u8 = 0x7F;

    /// Request every measurement block
    pub const ALL_MEASUREMENTS: u8 = 0xFF;

    pub const HEADER_LEN: usize = 4;

    pub fn encode(code: u8, param1: u8, param2: u8, payload: &[u8]) -> Vec<u8> {
        let mut v = vec![VERSION, code, param1, param2];
        v.extend_from_slice(payload);
        v
    }

    /// Check the response header against the expected response code and
    /// return everything after it
    pub fn decode(buf: &[u8], expected: u8) -> Result<&[u8], Error> {
        let mut r = ByteReader::new(buf);

        let h = r
            .get_bytes(HEADER_LEN)
            .map_err(|e| Error::Transport(format!("SPDM header: {e}")))?;

        match h[1] {
            c if c == expected => Ok(r.rest()),
            ERROR => Err(Error::Transport(format!("SPDM error 0x{:02X}", h[2]))),
            c => Err(Error::Transport(format!(
                "unexpected SPDM response 0x{c:02X}, expected 0x{expected:02X}"
            ))),
        }
    }

    pub fn get_certificate(slot: u8, offset: u16, length: u16) -> Vec<u8> {
        let mut p = offset.to_le_bytes().to_vec();
        p.extend_from_slice(&length.to_le_bytes());
        encode(GET_CERTIFICATE, slot, 0, &p)
    }

    /// Portion of the chain carried by a CERTIFICATE response and the number
    /// of bytes still to be fetched
    pub fn certificate_portion(buf: &[u8]) -> Result<(&[u8], u16), Error> {
        let mut r = ByteReader::new(decode(buf, CERTIFICATE)?);

        read_portion(&mut r).map_err(|e| Error::Transport(format!("SPDM CERTIFICATE: {e}")))
    }

    fn read_portion<'a>(r: &mut ByteReader<'a>) -> Result<(&'a [u8], u16), psg::Error> {
        let portion_len = r.get_u16_le()?;
        let remainder = r.get_u16_le()?;
        Ok((r.get_bytes(portion_len as usize)?, remainder))
    }

    pub fn get_measurements() -> Vec<u8> {
        encode(GET_MEASUREMENTS, 0, ALL_MEASUREMENTS, &[])
    }

    pub fn measurements(buf: &[u8]) -> Result<&[u8], Error> {
        decode(buf, MEASUREMENTS)
    }

    #[cfg(test)]
    pub fn certificate_response(portion: &[u8], remainder: u16) -> Vec<u8> {
        let mut p = (portion.len() as u16).to_le_bytes().to_vec();
        p.extend_from_slice(&remainder.to_le_bytes());
        p.extend_from_slice(portion);
        encode(CERTIFICATE, 0, 0, &p)
    }

    #[cfg(test)]
    pub fn measurements_response(body: &[u8]) -> Vec<u8> {
        encode(MEASUREMENTS, 0, 0, body)
    }
}

/// Frame a successful mailbox response, as a device would
pub fn encode_response(payload: &[u8]) -> Vec<u8> {
    let body = pad_to_words(payload);
    let mut v = (((body.len() / WORD) as u32) << LENGTH_SHIFT).to_le_bytes().to_vec();
    v.extend_from_slice(&body);
    v
}
