//! Authentication primitives.
//!
//! - [`jwt`] -- access-token validation (and issuing, for tooling and tests).
//!
//! Login is handled by the identity provider; this service only verifies
//! the tokens it issues.

pub mod jwt;
