//! Classification of one inbound message on a reply topic.
//!
//! Checks run cheapest first: framing, decoding, correlation, and only then
//! the signature. Anything failing before the signature check is noise and
//! is discarded. A correlated reply with a bad signature is rejected and
//! ends the exchange.

use thiserror::Error;

use crate::codec::{self, CorrelationToken, DeviceResponse};
use crate::crypto::PublicKey;
use crate::envelope;
use crate::utils::error::{CodecError, FrameError};

#[derive(Debug)]
pub enum Verdict {
    Accept(DeviceResponse),
    Discard(DiscardReason),
    Reject,
}

#[derive(Debug, Error)]
pub enum DiscardReason {
    #[error("malformed frame: {0}")]
    Frame(#[from] FrameError),

    #[error("undecodable payload: {0}")]
    Decode(#[from] CodecError),

    #[error("correlation mismatch: got {0}")]
    CorrelationMismatch(CorrelationToken),
}

pub fn inspect(frame: &[u8], expected: &CorrelationToken, key: &PublicKey) -> Verdict {
    let (payload, signature) = match envelope::split(frame) {
        Ok(parts) => parts,
        Err(e) => return Verdict::Discard(e.into()),
    };

    let response: DeviceResponse = match codec::decode(payload) {
        Ok(response) => response,
        Err(e) => return Verdict::Discard(e.into()),
    };

    if response.correlation_data != *expected {
        return Verdict::Discard(DiscardReason::CorrelationMismatch(
            response.correlation_data,
        ));
    }

    // Signature covers the exact payload bytes as received.
    if !key.verify(payload, &signature) {
        return Verdict::Reject;
    }

    Verdict::Accept(response)
}
