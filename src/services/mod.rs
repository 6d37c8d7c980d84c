//! Services
//!
//! Per-resource operations. Reads are idempotent and retried; writes are
//! attempted once.

pub mod activities;
pub mod auth;
pub mod dashboard;
pub mod leads;

pub use activities::ActivitiesService;
pub use auth::{AuthService, LoginOutcome};
pub use dashboard::DashboardService;
pub use leads::LeadsService;
