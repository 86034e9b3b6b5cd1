//! The `exchange` module implements request/response over publish/subscribe:
//! correlating asynchronous replies with the command that caused them and
//! authenticating every reply before it is returned.

pub mod client;
pub mod inspect;
pub mod locks;
mod subscription;

pub use client::{CommandClient, ExchangeState};
pub use inspect::{DiscardReason, Verdict, inspect};
pub use locks::DeviceLocks;
