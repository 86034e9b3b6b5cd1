//! Signed-envelope framing.
//!
//! A frame is `base64(signature) "." payload`. The base64 alphabet has no
//! period and the encoded signature has a fixed width, so the first period
//! always ends the signature; the payload may contain any bytes.

use crate::crypto::{SIGNATURE_BASE64_SIZE, Signature};
use crate::utils::error::FrameError;

pub const SEPARATOR: u8 = b'.';

/// Builds a frame from a signature and the payload it covers.
pub fn combine(signature: &Signature, payload: &[u8]) -> Vec<u8> {
    let encoded = signature.to_base64();
    let mut frame = Vec::with_capacity(encoded.len() + 1 + payload.len());
    frame.extend_from_slice(encoded.as_bytes());
    frame.push(SEPARATOR);
    frame.extend_from_slice(payload);
    frame
}

/// Splits a frame into the payload bytes and the signature over them.
pub fn split(frame: &[u8]) -> Result<(&[u8], Signature), FrameError> {
    let at = frame
        .iter()
        .position(|b| *b == SEPARATOR)
        .ok_or(FrameError::MissingSeparator)?;

    let (encoded, rest) = frame.split_at(at);
    if encoded.len() != SIGNATURE_BASE64_SIZE {
        return Err(FrameError::InvalidSignatureLength {
            expected: SIGNATURE_BASE64_SIZE,
            received: encoded.len(),
        });
    }

    let signature = Signature::from_base64(encoded)?;
    Ok((&rest[1..], signature))
}

#[cfg(test)]
mod tests;
