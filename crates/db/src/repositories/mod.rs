//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async methods that
//! accept `&PgPool` as the first argument.

pub mod planning_repo;
pub mod report_repo;
pub mod work_change_repo;
pub mod work_status_repo;

pub use planning_repo::PlanningRepo;
pub use report_repo::ReportRepo;
pub use work_change_repo::WorkChangeRepo;
pub use work_status_repo::WorkStatusRepo;
