//! Providers Module - External Data Sources
//!
//! Outbound HTTP: the transport seam, the rate-limited queue, and the
//! OKX / Jupiter / Solana RPC clients.

pub mod jupiter;
pub mod okx;
pub mod queue;
pub mod solana;
pub mod transport;

#[cfg(test)]
pub(crate) mod mock;

pub use jupiter::*;
pub use okx::*;
pub use queue::*;
pub use solana::*;
pub use transport::*;
