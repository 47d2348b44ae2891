//! Request extractors.
//!
//! - [`auth::AuthUser`] -- the operator behind a JWT Bearer token.

pub mod auth;
