//! Row models and DTOs.
//!
//! Each submodule contains a `FromRow` + `Serialize` struct per table and,
//! where rows are created from requests, a `Deserialize` create DTO.

pub mod planning;
pub mod report;
pub mod work_change;
pub mod work_status;
