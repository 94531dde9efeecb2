//! Core Module - Request Orchestration
//!
//! Data loading pipeline, route validation, and swap request
//! validation/building.

pub mod builder;
pub mod loader;
pub mod swap_client;
pub mod validator;

pub use builder::*;
pub use loader::*;
pub use swap_client::*;
pub use validator::*;
