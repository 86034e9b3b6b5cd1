//! The `utils` module provides definitions shared across `cmdrelay`:
//! the error taxonomy and logging setup.

pub mod error;
pub mod logging;
