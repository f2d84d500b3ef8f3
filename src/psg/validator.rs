// Copyright 2025 Contributors to the Veraison project.
// SPDX-License-Identifier: Apache-2.0

use super::entry::{CertificateEntry, CertificateKind, LeafCertificate, PsgCertificate};
use super::errors::Error;
use openssl::hash::hash;

const MIN_CHAIN_LEN: usize = 2;
const MAX_CHAIN_LEN: usize = 3;

fn count(chain: &[CertificateEntry], kind: CertificateKind) -> usize {
    chain.iter().filter(|e| e.kind == kind).count()
}

/// Check the chain has one of the two accepted shapes: a root and one leaf, or
/// a root and two leaves
pub fn verify_chain_size(chain: &[CertificateEntry]) -> Result<(), Error> {
    if !(MIN_CHAIN_LEN..=MAX_CHAIN_LEN).contains(&chain.len()) {
        return Err(Error::ChainShape(format!(
            "expected {MIN_CHAIN_LEN} or {MAX_CHAIN_LEN} entries, got {}",
            chain.len()
        )));
    }

    let roots = count(chain, CertificateKind::Root);
    if roots != 1 {
        return Err(Error::ChainShape(format!(
            "expected exactly one root entry, got {roots}"
        )));
    }

    Ok(())
}

/// Check that the chain's root entry is byte-for-byte the trusted one
pub fn verify_root_certificate(chain: &[CertificateEntry], trusted_root: &[u8]) -> Result<(), Error> {
    let mut roots = chain.iter().filter(|e| e.kind == CertificateKind::Root);

    let root = match (roots.next(), roots.next()) {
        (Some(root), None) => root,
        (None, _) => return Err(Error::ChainShape("no root entry in chain".to_string())),
        (Some(_), Some(_)) => {
            return Err(Error::ChainShape("more than one root entry in chain".to_string()))
        }
    };

    if root.bytes != trusted_root {
        return Err(Error::UntrustedRoot(
            "root entry in chain does not match the trusted root".to_string(),
        ));
    }

    Ok(())
}

/// Verify that `child` was signed by the key in `parent`.
///
/// Two tiers of outcome: `Ok(false)` when the pair cannot be a parent/child
/// link at all (the child carries no signature, or the signature and the
/// parent key are on different curves) or the signature simply does not
/// verify; `Err` when the cryptographic provider itself fails.
pub fn sig_verify(child: &PsgCertificate, parent: &PsgCertificate) -> Result<bool, Error> {
    let child = match child {
        PsgCertificate::Leaf(l) => l,
        PsgCertificate::Root(_) => return Ok(false),
    };

    let parent_key = parent.public_key();
    let curve = parent_key.curve;

    if child.signature.curve != curve {
        return Ok(false);
    }

    let key = parent_key.to_ec_key()?;
    let sig = child.signature.to_ecdsa_sig()?;
    let digest = hash(curve.digest(), &child.signed_payload())?;

    Ok(sig.verify(&digest, &key)?)
}

/// Entries from the anchor down: the root first, then the leaves in stream
/// order.  Devices stream the root last.
fn trust_order(chain: &[CertificateEntry]) -> impl Iterator<Item = (usize, &CertificateEntry)> {
    let roots = chain
        .iter()
        .enumerate()
        .filter(|(_, e)| e.kind == CertificateKind::Root);
    let leaves = chain
        .iter()
        .enumerate()
        .filter(|(_, e)| e.kind == CertificateKind::Leaf);

    roots.chain(leaves)
}

/// Check every entry is signed by its parent, walking from the root down to
/// the last leaf.  Entries are named by their position in `chain`.
pub fn verify_parents_in_chain(chain: &[CertificateEntry]) -> Result<(), Error> {
    let mut parent: Option<(usize, PsgCertificate)> = None;

    for (i, entry) in trust_order(chain) {
        let current = entry.decode().map_err(|e| match entry.kind {
            CertificateKind::Root => Error::InvalidRoot(format!("entry {i}: {e}")),
            CertificateKind::Leaf => Error::InvalidLeaf(format!("entry {i}: {e}")),
        })?;

        if let Some((p, cert)) = &parent {
            if !sig_verify(&current, cert)? {
                return Err(Error::InvalidParent(format!(
                    "entry {i} is not signed by entry {p}"
                )));
            }
            tracing::debug!(entry = i, parent = *p, "signature verified against parent");
        }

        parent = Some((i, current));
    }

    Ok(())
}

/// Return the deepest leaf entry (the last one streamed) that decodes as a
/// complete certificate
pub fn find_leaf_certificate(chain: &[CertificateEntry]) -> Result<LeafCertificate, Error> {
    let mut last_error = None;

    for entry in chain.iter().rev().filter(|e| e.kind == CertificateKind::Leaf) {
        match LeafCertificate::decode(&entry.bytes) {
            Ok(leaf) => return Ok(leaf),
            Err(e) => last_error = Some(e),
        }
    }

    match last_error {
        None => Err(Error::ChainShape("no leaf entry in chain".to_string())),
        Some(e) => Err(Error::InvalidLeaf(e.to_string())),
    }
}

/// Validates chains against a pinned root entry
#[derive(Debug, Clone)]
pub struct ChainValidator<'a> {
    trusted_root: &'a [u8],
}

impl<'a> ChainValidator<'a> {
    pub fn new(trusted_root: &'a [u8]) -> Self {
        Self { trusted_root }
    }

    /// Run the shape, root pinning and signature checks, and hand back the
    /// leaf whose key is now trusted
    pub fn validate(&self, chain: &[CertificateEntry]) -> Result<LeafCertificate, Error> {
        verify_chain_size(chain)?;
        verify_root_certificate(chain, self.trusted_root)?;
        verify_parents_in_chain(chain)?;

        find_leaf_certificate(chain)
    }
}
