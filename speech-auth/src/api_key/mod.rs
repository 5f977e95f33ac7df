//! API key authentication for hosted speech services.

mod auth;

pub use auth::{ApiKeyAuth, ApiKeyProvider, ProviderAuth};
