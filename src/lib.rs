//! # cmdrelay
//!
//! `cmdrelay` sends authenticated commands to remote devices over a
//! publish/subscribe broker and waits for their signed replies.
//!
//! A command is JSON, signed with the server's Ed25519 key and framed as
//! `base64(signature) "." payload`. It is published on
//! `{device}/command/request`; the device answers on
//! `{device}/command/response`, echoing the request's correlation token
//! and signing with its own key. The client only accepts a reply whose
//! token matches and whose signature verifies against the device key.
//!
//! ## Core Modules
//!
//! - `exchange`: `CommandClient`, the request/response orchestrator.
//! - `registry`: routes inbound reply messages to the waiting exchange.
//! - `codec`, `crypto`, `envelope`: payloads, signatures and framing.
//! - `device`: device identity, key directory and a simulated device.
//! - `transport`: the `Transport` contract, an in-process transport and
//!   a WebSocket broker with its client.
//! - `broker`, `client`: the routing engine behind the bundled broker.
//! - `config`: layered settings from files and the environment.
//! - `utils`: error types and logging setup.

pub mod broker;
pub mod client;
pub mod codec;
pub mod config;
pub mod crypto;
pub mod device;
pub mod envelope;
pub mod exchange;
pub mod registry;
pub mod transport;
pub mod utils;
