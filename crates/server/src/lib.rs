//! Login, consent and logout front-end for an OAuth2/OpenID Connect authorization server.
//!
//! The authorization server owns tokens and sessions. It hands the user agent
//! over to this service with a challenge id whenever a user has to log in,
//! grant consent or confirm a logout; this service decides, tells the server
//! its decision, and sends the user agent back.

pub mod api;
pub mod challenge;
pub mod config;
pub mod entity;
pub mod error;
pub mod flows;
pub mod identity;
