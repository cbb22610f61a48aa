//! Challenge issuance.
//!
//! A client asks for a challenge for its user id; the issuer derives a claim
//! from the id and the current instant, stores it, and hands it back for the
//! client to sign with its platform authenticator.

mod generator;
mod service;
pub mod store;

pub use generator::ChallengeGenerator;
pub use service::ChallengeService;
pub use store::{ChallengeStore, RedisChallengeStore};
