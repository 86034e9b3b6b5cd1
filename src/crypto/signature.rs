use std::fmt;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;

use crate::utils::error::SignatureError;

/// Size of a raw Ed25519 signature.
pub const SIGNATURE_SIZE: usize = ed25519_dalek::SIGNATURE_LENGTH;

/// Size of a signature in padded base64.
pub const SIGNATURE_BASE64_SIZE: usize = SIGNATURE_SIZE.div_ceil(3) * 4;

/// A detached signature over a payload.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Signature([u8; SIGNATURE_SIZE]);

impl Signature {
    pub fn from_bytes(bytes: [u8; SIGNATURE_SIZE]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; SIGNATURE_SIZE] {
        &self.0
    }

    /// Padded base64 form; always `SIGNATURE_BASE64_SIZE` chars long.
    pub fn to_base64(&self) -> String {
        STANDARD.encode(self.0)
    }

    /// Parses the base64 form, rejecting anything that does not decode to
    /// exactly `SIGNATURE_SIZE` bytes.
    pub fn from_base64(text: impl AsRef<[u8]>) -> Result<Self, SignatureError> {
        let decoded = STANDARD.decode(text)?;
        let bytes: [u8; SIGNATURE_SIZE] =
            decoded
                .try_into()
                .map_err(|raw: Vec<u8>| SignatureError::InvalidSize {
                    expected: SIGNATURE_SIZE,
                    received: raw.len(),
                })?;
        Ok(Self(bytes))
    }
}

impl fmt::Debug for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Signature({})", self.to_base64())
    }
}

impl From<ed25519_dalek::Signature> for Signature {
    fn from(sig: ed25519_dalek::Signature) -> Self {
        Self(sig.to_bytes())
    }
}

impl From<&Signature> for ed25519_dalek::Signature {
    fn from(sig: &Signature) -> Self {
        ed25519_dalek::Signature::from_bytes(&sig.0)
    }
}
