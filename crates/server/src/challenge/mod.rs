//! Challenges issued by the authorization server.
//!
//! - `types` - challenge snapshots, decision payloads and redirects
//! - `gateway` - the capability flows use to read challenges and submit decisions
//! - `hydra` - HTTP implementation against the admin API

pub mod gateway;
pub mod hydra;
pub mod types;

pub use gateway::ChallengeGateway;
pub use hydra::HydraClient;
pub use types::{
    AcceptConsent, AcceptLogin, AcceptPayload, Challenge, ChallengeId, ChallengeMethod,
    ClientInfo, ConsentSession, Redirect, RejectReason, SessionClaims,
};
