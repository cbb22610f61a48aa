//! # Touch-ID Common
//!
//! Shared types and constants used by the challenge issuer.
//!
//! ## Modules
//! - `types` - Wire and persisted records (Challenge, ChallengeRequest, etc.)
//! - `error` - Error taxonomy with HTTP status mapping
//! - `constants` - Defaults and store key layout

pub mod constants;
pub mod error;
pub mod types;

pub use error::TouchIdError;
pub use types::*;
