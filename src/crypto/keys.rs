//! Ed25519 signing and verification keys.
//!
//! The server holds a `PrivateKey` and signs every command it publishes.
//! Devices are known by their `PublicKey`, stored as base64 next to the
//! device record; every reply is checked against it.

use std::fmt;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use ed25519_dalek::{Signer, SigningKey, Verifier, VerifyingKey};
use rand::rngs::OsRng;

use super::signature::Signature;
use crate::utils::error::KeyFormatError;

pub use ed25519_dalek::{PUBLIC_KEY_LENGTH, SECRET_KEY_LENGTH};

/// Ed25519 signing key; held by the server for commands and by devices for replies.
#[derive(Clone)]
pub struct PrivateKey {
    inner: SigningKey,
}

impl PrivateKey {
    pub fn generate() -> Self {
        Self {
            inner: SigningKey::generate(&mut OsRng),
        }
    }

    /// Loads a key from its raw seed bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, KeyFormatError> {
        let seed: &[u8; SECRET_KEY_LENGTH] =
            bytes
                .try_into()
                .map_err(|_| KeyFormatError::InvalidLength {
                    expected: SECRET_KEY_LENGTH,
                    received: bytes.len(),
                })?;
        Ok(Self {
            inner: SigningKey::from_bytes(seed),
        })
    }

    pub fn from_base64(text: &str) -> Result<Self, KeyFormatError> {
        Self::from_bytes(&STANDARD.decode(text.trim())?)
    }

    pub fn to_base64(&self) -> String {
        STANDARD.encode(self.inner.to_bytes())
    }

    pub fn sign(&self, bytes: &[u8]) -> Signature {
        self.inner.sign(bytes).into()
    }

    pub fn public_key(&self) -> PublicKey {
        PublicKey {
            inner: self.inner.verifying_key(),
        }
    }
}

impl fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PrivateKey")
            .field("public_key", &self.public_key())
            .finish_non_exhaustive()
    }
}

/// Verification key a signature is checked against.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct PublicKey {
    inner: VerifyingKey,
}

impl PublicKey {
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, KeyFormatError> {
        let raw: &[u8; PUBLIC_KEY_LENGTH] =
            bytes
                .try_into()
                .map_err(|_| KeyFormatError::InvalidLength {
                    expected: PUBLIC_KEY_LENGTH,
                    received: bytes.len(),
                })?;
        let inner = VerifyingKey::from_bytes(raw).map_err(|_| KeyFormatError::InvalidKey)?;
        Ok(Self { inner })
    }

    pub fn from_base64(text: &str) -> Result<Self, KeyFormatError> {
        Self::from_bytes(&STANDARD.decode(text.trim())?)
    }

    pub fn to_base64(&self) -> String {
        STANDARD.encode(self.inner.as_bytes())
    }

    /// Checks `signature` over `bytes`. Mismatches yield `false`, never an error.
    pub fn verify(&self, bytes: &[u8], signature: &Signature) -> bool {
        self.inner
            .verify(bytes, &ed25519_dalek::Signature::from(signature))
            .is_ok()
    }
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PublicKey({})", self.to_base64())
    }
}
