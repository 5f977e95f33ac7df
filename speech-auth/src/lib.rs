//! # speech-auth
//!
//! Request authentication for the speech providers the worker talks to:
//! - API key headers for the hosted speech recognition service
//! - AWS Signature Version 4 for S3-compatible object storage
//!
//! ## Usage
//!
//! ```rust,ignore
//! use speech_auth::{api_key::{ApiKeyAuth, ProviderAuth}, sigv4::Signer};
//! ```

pub mod api_key;
pub mod error;
pub mod sigv4;

// Re-export commonly used types
pub use error::{Error, ErrorKind};
