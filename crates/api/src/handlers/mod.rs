//! Request handlers, one module per resource.

pub mod allocation;
pub mod planning;
pub mod reporting;
pub mod work_changes;
