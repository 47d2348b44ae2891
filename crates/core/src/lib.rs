//! Work lifecycle engine for production planning and shop-floor reporting.
//!
//! Everything in this crate is pure domain logic. The only I/O happens
//! behind the [`store::WorkStore`] trait, which the `db` crate implements
//! against PostgreSQL and tests implement in memory.

pub mod booking;
pub mod deviation;
pub mod error;
pub mod grouping;
pub mod identity;
pub mod lifecycle;
pub mod lost_time;
pub mod pattern;
pub mod status_sync;
pub mod store;
pub mod types;
pub mod work_changes;
pub mod work_code;
