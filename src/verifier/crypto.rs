// Copyright 2025 Contributors to the Veraison project.
// SPDX-License-Identifier: Apache-2.0

use super::errors::Error;
use openssl::symm::{decrypt, encrypt, Cipher};
use std::sync::Arc;

/// Supplies the IV for each cipher operation
pub trait IvProvider: Send + Sync {
    fn generate(&self) -> Result<Vec<u8>, Error>;
}

/// Always hands out the same IV
#[derive(Debug, Clone)]
pub struct FixedIv(pub Vec<u8>);

impl IvProvider for FixedIv {
    fn generate(&self) -> Result<Vec<u8>, Error> {
        Ok(self.0.clone())
    }
}

/// Everything an AES-CTR provider needs: key, cipher and IV source
#[derive(Clone)]
pub struct CipherConfig {
    pub secret_key: Vec<u8>,
    pub cipher: Cipher,
    pub iv_provider: Arc<dyn IvProvider>,
}

impl CipherConfig {
    /// AES-256-CTR with the given key and IV source
    pub fn aes_256_ctr(secret_key: Vec<u8>, iv_provider: Arc<dyn IvProvider>) -> Self {
        Self {
            secret_key,
            cipher: Cipher::aes_256_ctr(),
            iv_provider,
        }
    }
}

impl std::fmt::Debug for CipherConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CipherConfig")
            .field("secret_key", &"<redacted>")
            .field("key_len", &self.cipher.key_len())
            .finish()
    }
}

/// Symmetric encryption driven by a [`CipherConfig`]
#[derive(Debug, Clone)]
pub struct AesCtrProvider {
    config: CipherConfig,
}

impl AesCtrProvider {
    pub fn new(config: CipherConfig) -> Self {
        Self { config }
    }

    fn params(&self) -> Result<Vec<u8>, Error> {
        let c = &self.config;

        if c.secret_key.is_empty() {
            return Err(Error::Cipher("key is not set".to_string()));
        }
        if c.secret_key.len() != c.cipher.key_len() {
            return Err(Error::Cipher(format!(
                "key is {} bytes, cipher expects {}",
                c.secret_key.len(),
                c.cipher.key_len()
            )));
        }

        let iv = c.iv_provider.generate()?;
        if Some(iv.len()) != c.cipher.iv_len() {
            return Err(Error::Cipher(format!("IV of unexpected length {}", iv.len())));
        }

        Ok(iv)
    }

    pub fn encrypt(&self, data: &[u8]) -> Result<Vec<u8>, Error> {
        let iv = self.params()?;
        encrypt(self.config.cipher, &self.config.secret_key, Some(&iv), data)
            .map_err(|e| Error::Cipher(format!("AES CTR encryption failed: {e}")))
    }

    pub fn decrypt(&self, data: &[u8]) -> Result<Vec<u8>, Error> {
        let iv = self.params()?;
        decrypt(self.config.cipher, &self.config.secret_key, Some(&iv), data)
            .map_err(|e| Error::Cipher(format!("AES CTR decryption failed: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider(key: Vec<u8>, iv: Vec<u8>) -> AesCtrProvider {
        AesCtrProvider::new(CipherConfig::aes_256_ctr(key, Arc::new(FixedIv(iv))))
    }

    #[test]
    fn encrypt_decrypt() {
        let p = provider(vec![0x11; 32], vec![0x22; 16]);
        let plain = b"measurement records".to_vec();

        let ct = p.encrypt(&plain).unwrap();

        // stream cipher: no padding
        assert_eq!(ct.len(), plain.len());
        assert_ne!(ct, plain);
        assert_eq!(p.decrypt(&ct).unwrap(), plain);
    }

    #[test]
    fn bad_parameters() {
        assert!(matches!(
            provider(vec![], vec![0; 16]).encrypt(b"x"),
            Err(Error::Cipher(_))
        ));
        assert!(matches!(
            provider(vec![0; 16], vec![0; 16]).decrypt(b"x"),
            Err(Error::Cipher(_))
        ));
        assert!(matches!(
            provider(vec![0; 32], vec![0; 8]).decrypt(b"x"),
            Err(Error::Cipher(_))
        ));
    }

    #[test]
    fn debug_hides_key() {
        let c = CipherConfig::aes_256_ctr(vec![0xAB; 32], Arc::new(FixedIv(vec![0; 16])));
        assert!(!format!("{c:?}").contains("171"));
    }
}
