// Copyright 2025 Contributors to the Veraison project.
// SPDX-License-Identifier: Apache-2.0

use super::errors::Error;
use std::str::FromStr;

/// Largest sub-key context, in bytes
pub const CONTEXT_MAX_LEN: usize = 28;

/// PUF type the attestation sub-key is derived from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PufType {
    Iid,
    Intel,
    Efuse,
    IidUser,
    IntelUser,
}

impl PufType {
    /// Value sent to the device
    pub fn code(&self) -> u32 {
        match self {
            PufType::Iid => 0,
            PufType::Intel => 1,
            PufType::Efuse => 2,
            PufType::IidUser => 3,
            PufType::IntelUser => 4,
        }
    }
}

impl FromStr for PufType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Error> {
        match s {
            "IID" => Ok(PufType::Iid),
            "INTEL" => Ok(PufType::Intel),
            "EFUSE" => Ok(PufType::Efuse),
            "IIDUSER" => Ok(PufType::IidUser),
            "INTEL_USER" => Ok(PufType::IntelUser),
            _ => Err(Error::InvalidParameter(format!("unknown PUF type {s:?}"))),
        }
    }
}

/// Check a sub-key context and return its bytes.  The context is hex text of
/// at most [`CONTEXT_MAX_LEN`] bytes; nothing but hex digits is let through.
pub fn validate_context(context: &str) -> Result<Vec<u8>, Error> {
    if let Some(c) = context.chars().find(|c| !c.is_ascii_hexdigit()) {
        return Err(Error::InvalidParameter(format!(
            "context contains disallowed character {c:?}"
        )));
    }

    if context.len() > 2 * CONTEXT_MAX_LEN {
        return Err(Error::InvalidParameter(format!(
            "context longer than {CONTEXT_MAX_LEN} bytes"
        )));
    }

    hex::decode(context).map_err(|e| Error::InvalidParameter(format!("context: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn context_ok() {
        assert_eq!(validate_context("").unwrap(), Vec::<u8>::new());
        assert_eq!(validate_context("a1B2").unwrap(), vec![0xA1, 0xB2]);
        assert_eq!(validate_context(&"0".repeat(56)).unwrap().len(), 28);
    }

    #[test]
    fn context_rejected() {
        for bad in ["01'", "' OR 1=1", "0g", "abc", " 01", "0".repeat(58).as_str()] {
            assert!(
                matches!(validate_context(bad), Err(Error::InvalidParameter(_))),
                "{bad}"
            );
        }
    }

    #[test]
    fn puf_types() {
        assert_eq!("IID".parse::<PufType>().unwrap(), PufType::Iid);
        assert_eq!("INTEL_USER".parse::<PufType>().unwrap(), PufType::IntelUser);
        assert_eq!("EFUSE".parse::<PufType>().unwrap().code(), 2);
        assert!("iid".parse::<PufType>().is_err());
        assert!("".parse::<PufType>().is_err());
    }
}
