//! Utils Module - Helper Functions & Shared Utilities
//!
//! Shared constants and the OKX request signer.

pub mod constants;
pub mod signing;

pub use constants::*;
pub use signing::*;
