// Copyright 2025 Contributors to the Veraison project.
// SPDX-License-Identifier: Apache-2.0

use super::commands::{self, GET_CHIPID};
use super::errors::Error;
use super::interfaces::Transport;

const DEVICE_ID_LEN: usize = 8;

/// Progress of one operation against one device
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    SessionInitialized,
    SubKeyCreated,
    AttestationRetrieved,
    Matched,
    Mismatched,
    Error,
}

impl SessionState {
    fn can_move_to(self, next: SessionState) -> bool {
        use SessionState::*;

        matches!(
            (self, next),
            (Idle, SessionInitialized)
                | (SessionInitialized, SubKeyCreated)
                | (SessionInitialized, AttestationRetrieved)
                | (AttestationRetrieved, Matched)
                | (AttestationRetrieved, Mismatched)
        )
    }
}

/// A device session, exclusively owned by the operation that opened it
pub struct DeviceSession {
    transport: Box<dyn Transport>,
    device_id: Option<String>,
    state: SessionState,
}

impl DeviceSession {
    pub fn new(transport: Box<dyn Transport>) -> Self {
        Self {
            transport,
            device_id: None,
            state: SessionState::Idle,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn device_id(&self) -> Option<&str> {
        self.device_id.as_deref()
    }

    pub fn transport(&self) -> &dyn Transport {
        self.transport.as_ref()
    }

    /// Advance to `next`.  Error is absorbing; any other move not in the
    /// session's life cycle is refused.
    pub fn transition(&mut self, next: SessionState) -> Result<(), Error> {
        if next == SessionState::Error {
            self.fail();
            return Ok(());
        }

        if !self.state.can_move_to(next) {
            return Err(Error::InvalidState(format!(
                "{:?} -> {:?}",
                self.state, next
            )));
        }

        tracing::trace!(from = ?self.state, to = ?next, "session transition");
        self.state = next;

        Ok(())
    }

    pub fn fail(&mut self) {
        self.state = SessionState::Error;
    }

    /// Identify the device and open the session.  The device id is the
    /// upper-case hex of the first 8 bytes of the chip id.
    pub fn initialize(&mut self) -> Result<&str, Error> {
        let chip_id = commands::exchange(self.transport(), GET_CHIPID, &[])?;

        if chip_id.len() < DEVICE_ID_LEN {
            return Err(Error::Transport(format!(
                "chip id of {} bytes, expected at least {DEVICE_ID_LEN}",
                chip_id.len()
            )));
        }

        self.transition(SessionState::SessionInitialized)?;

        let id = self.device_id.insert(hex::encode_upper(&chip_id[..DEVICE_ID_LEN]));

        Ok(id.as_str())
    }
}

impl std::fmt::Debug for DeviceSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeviceSession")
            .field("device_id", &self.device_id)
            .field("state", &self.state)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::verifier::mocks::MockTransport;
    use hex_literal::hex;

    #[test]
    fn life_cycle() {
        let mut s = DeviceSession::new(Box::new(MockTransport::new()));

        assert_eq!(s.state(), SessionState::Idle);
        assert!(s.transition(SessionState::AttestationRetrieved).is_err());

        s.transition(SessionState::SessionInitialized).unwrap();
        s.transition(SessionState::AttestationRetrieved).unwrap();
        assert!(s.transition(SessionState::SubKeyCreated).is_err());
        s.transition(SessionState::Matched).unwrap();
        assert!(matches!(
            s.transition(SessionState::Mismatched),
            Err(Error::InvalidState(_))
        ));
    }

    #[test]
    fn error_is_absorbing() {
        let mut s = DeviceSession::new(Box::new(MockTransport::new()));

        s.transition(SessionState::Error).unwrap();

        assert!(s.transition(SessionState::SessionInitialized).is_err());
        assert!(s.transition(SessionState::Idle).is_err());
        s.transition(SessionState::Error).unwrap();
        assert_eq!(s.state(), SessionState::Error);
    }

    #[test]
    fn initialize_reads_device_id() {
        let t = MockTransport::new();
        t.respond(&hex!("0123456789ABCDEF 00000000"));

        let mut s = DeviceSession::new(Box::new(t.clone()));

        assert_eq!(s.initialize().unwrap(), "0123456789ABCDEF");
        assert_eq!(s.device_id(), Some("0123456789ABCDEF"));
        assert_eq!(s.state(), SessionState::SessionInitialized);
        assert_eq!(t.mailbox_codes(), vec![GET_CHIPID]);
    }

    #[test]
    fn initialize_short_chip_id() {
        let t = MockTransport::new();
        t.respond(&hex!("01234567"));

        let mut s = DeviceSession::new(Box::new(t));

        assert!(matches!(s.initialize(), Err(Error::Transport(_))));
        assert_eq!(s.state(), SessionState::Idle);
    }
}
