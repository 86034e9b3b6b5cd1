//! The `crypto` module signs outgoing payloads and verifies incoming ones.
//!
//! Ed25519 is the only scheme. Signatures have a fixed raw width and a
//! fixed-width base64 text form used on the wire.

pub mod keys;
pub mod signature;

pub use keys::{PrivateKey, PublicKey};
pub use signature::{SIGNATURE_BASE64_SIZE, SIGNATURE_SIZE, Signature};
