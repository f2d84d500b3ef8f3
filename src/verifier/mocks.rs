// Copyright 2025 Contributors to the Veraison project.
// SPDX-License-Identifier: Apache-2.0

//! Recording test doubles for the capability interfaces

use super::commands;
use super::errors::Error;
use super::interfaces::{SecurityEnclave, Transport, TransportProvider};
use crate::psg::CurveType;
use openssl::bn::BigNumContext;
use openssl::ec::{EcGroup, EcKey, PointConversionForm};
use openssl::ecdsa::EcdsaSig;
use openssl::hash::hash;
use openssl::pkey::Private;
use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::rc::Rc;

#[derive(Default)]
struct TransportState {
    responses: VecDeque<Result<Vec<u8>, Error>>,
    sent: Vec<Vec<u8>>,
}

/// Answers commands from a queue of canned responses and records every
/// command sent.  Clones share state.
#[derive(Clone, Default)]
pub struct MockTransport {
    state: Rc<RefCell<TransportState>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Default::default()
    }

    /// Queue a mailbox response carrying `payload`
    pub fn respond(&self, payload: &[u8]) {
        self.respond_raw(&commands::encode_response(payload));
    }

    /// Queue a response as-is
    pub fn respond_raw(&self, raw: &[u8]) {
        self.state.borrow_mut().responses.push_back(Ok(raw.to_vec()));
    }

    /// Queue a transport failure
    pub fn fail(&self) {
        self.state
            .borrow_mut()
            .responses
            .push_back(Err(Error::Transport("link down".to_string())));
    }

    pub fn sent(&self) -> Vec<Vec<u8>> {
        self.state.borrow().sent.clone()
    }

    /// Command codes of the mailbox commands sent so far
    pub fn mailbox_codes(&self) -> Vec<u16> {
        self.sent()
            .iter()
            .map(|c| (u32::from_le_bytes([c[0], c[1], c[2], c[3]]) & 0x7FF) as u16)
            .collect()
    }
}

impl Transport for MockTransport {
    fn send_command(&self, command: &[u8]) -> Result<Vec<u8>, Error> {
        let mut s = self.state.borrow_mut();
        s.sent.push(command.to_vec());

        s.responses
            .pop_front()
            .unwrap_or_else(|| Err(Error::Transport("no response queued".to_string())))
    }
}

/// Hands out clones of one [`MockTransport`] and records the transport ids
/// asked for
#[derive(Default)]
pub struct MockTransportProvider {
    pub transport: MockTransport,
    pub refuse: bool,
    connects: RefCell<Vec<String>>,
}

impl MockTransportProvider {
    pub fn new(transport: MockTransport) -> Self {
        Self {
            transport,
            ..Default::default()
        }
    }

    pub fn connects(&self) -> Vec<String> {
        self.connects.borrow().clone()
    }
}

impl TransportProvider for MockTransportProvider {
    fn connect(&self, transport_id: &str) -> Result<Box<dyn Transport>, Error> {
        self.connects.borrow_mut().push(transport_id.to_string());

        if self.refuse {
            return Err(Error::Transport(format!("cannot connect to {transport_id}")));
        }

        Ok(Box::new(self.transport.clone()))
    }
}

/// An in-memory enclave backed by OpenSSL keys
#[derive(Default)]
pub struct MockEnclave {
    keys: RefCell<HashMap<String, (CurveType, EcKey<Private>)>>,
    calls: RefCell<Vec<&'static str>>,
    pub broken: bool,
}

impl MockEnclave {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn calls(&self) -> Vec<&'static str> {
        self.calls.borrow().clone()
    }

    pub fn key(&self, key_id: &str) -> Option<EcKey<Private>> {
        self.keys.borrow().get(key_id).map(|(_, k)| k.clone())
    }

    fn call(&self, name: &'static str) -> Result<(), Error> {
        self.calls.borrow_mut().push(name);

        if self.broken {
            return Err(Error::SecurityEnclave(format!("{name} failed")));
        }

        Ok(())
    }

    fn lookup(&self, key_id: &str) -> Result<(CurveType, EcKey<Private>), Error> {
        self.keys
            .borrow()
            .get(key_id)
            .cloned()
            .ok_or_else(|| Error::SecurityEnclave(format!("no key {key_id}")))
    }
}

fn enclave_err(e: openssl::error::ErrorStack) -> Error {
    Error::SecurityEnclave(e.to_string())
}

impl SecurityEnclave for MockEnclave {
    fn create_key(&self, curve: CurveType) -> Result<String, Error> {
        self.call("create_key")?;

        let group = EcGroup::from_curve_name(curve.nid()).map_err(enclave_err)?;
        let key = EcKey::generate(&group).map_err(enclave_err)?;

        let mut keys = self.keys.borrow_mut();
        let id = format!("key-{}", keys.len() + 1);
        keys.insert(id.clone(), (curve, key));

        Ok(id)
    }

    fn sign(&self, key_id: &str, data: &[u8]) -> Result<Vec<u8>, Error> {
        self.call("sign")?;

        let (curve, key) = self.lookup(key_id)?;
        let digest = hash(curve.digest(), data).map_err(enclave_err)?;

        EcdsaSig::sign(&digest, &key)
            .and_then(|s| s.to_der())
            .map_err(enclave_err)
    }

    fn get_public_key(&self, key_id: &str) -> Result<Vec<u8>, Error> {
        self.call("get_public_key")?;

        let (_, key) = self.lookup(key_id)?;
        let mut ctx = BigNumContext::new().map_err(enclave_err)?;

        key.public_key()
            .to_bytes(key.group(), PointConversionForm::UNCOMPRESSED, &mut ctx)
            .map_err(enclave_err)
    }

    fn exists(&self, key_id: &str) -> Result<bool, Error> {
        self.call("exists")?;

        Ok(self.keys.borrow().contains_key(key_id))
    }
}
