//! Solidi client - Core Library
//! Signed REST access to the Solidi exchange API

// Public modules
pub mod core;
pub mod credentials;
pub mod nonce;
pub mod signer;
pub mod solidi_api;

// Re-exports
pub use crate::core::{ClientConfig, Error, Method, Result, Side};
pub use credentials::ApiCredentials;
pub use signer::{RequestSigner, SigningScheme};
pub use solidi_api::{ApiResponse, SolidiClient};
