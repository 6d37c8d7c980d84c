//! Resilience
//!
//! Retry with exponential backoff, per-request policies, and the executor
//! that applies them.

pub mod executor;
pub mod policy;
pub mod retry;

pub use executor::{Attempt, RequestExecutor};
pub use policy::{RequestPolicy, ResponseBody};
pub use retry::{should_retry, RetryConfig};
