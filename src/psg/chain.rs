// Copyright 2025 Contributors to the Veraison project.
// SPDX-License-Identifier: Apache-2.0

use super::buffer::ByteReader;
use super::encoding::{self, TextEncoding};
use super::entry::{CertificateEntry, CertificateKind, LEAF_HEADER_LEN, ROOT_HEADER_LEN};
use super::errors::Error;
use super::magic::{LEAF_ENTRY_MAGIC, ROOT_ENTRY_MAGIC};

// every entry opens with a 32-bit magic followed by its total length
const ENTRY_PREFIX_LEN: usize = 8;
const WORD: usize = 4;

fn kind_of(magic: u32) -> Option<(CertificateKind, usize)> {
    match magic {
        ROOT_ENTRY_MAGIC => Some((CertificateKind::Root, ROOT_HEADER_LEN)),
        LEAF_ENTRY_MAGIC => Some((CertificateKind::Leaf, LEAF_HEADER_LEN)),
        _ => None,
    }
}

// Try to frame an entry at the cursor.  Returns None when the words at the
// cursor do not open a plausible entry.
fn next_entry(r: &ByteReader) -> Option<CertificateEntry> {
    let mut peek = r.clone();

    let magic = peek.get_u32_be().ok()?;
    let (kind, min_len) = kind_of(magic)?;
    let length = peek.get_u32_be().ok()? as usize;

    if length < min_len || length > r.remaining() {
        return None;
    }

    Some(CertificateEntry::new(kind, r.rest()[..length].to_vec()))
}

/// Split a concatenation of PSG certificate entries into its entries, in
/// stream order.
///
/// Each entry is framed by its own magic and declared length.  Words that do
/// not open an entry (reserved headers, padding) are stepped over.  A stream
/// with no recognisable entry yields an empty chain.
pub fn parse_chain(buf: &[u8]) -> Vec<CertificateEntry> {
    let mut r = ByteReader::new(buf);
    let mut entries = Vec::new();

    while r.remaining() >= ENTRY_PREFIX_LEN {
        match next_entry(&r) {
            Some(entry) => {
                // length was checked against remaining() in next_entry
                let _ = r.skip(entry.bytes.len());
                tracing::trace!(kind = ?entry.kind, len = entry.bytes.len(), "chain entry");
                entries.push(entry);
            }
            None => {
                let _ = r.skip(WORD);
            }
        }
    }

    entries
}

/// Decode `v` from its text encoding and split it into entries
pub fn parse_chain_text(v: &str, enc: TextEncoding) -> Result<Vec<CertificateEntry>, Error> {
    let buf = encoding::decode(v, enc)?;
    Ok(parse_chain(&buf))
}
