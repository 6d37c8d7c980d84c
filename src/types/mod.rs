//! Types
//!
//! Configuration, request payloads, and tolerant decoders for the response
//! shapes the backend produces.

pub mod activity;
pub mod auth;
pub mod config;
pub mod dashboard;
pub mod decode;
pub mod lead;
pub mod user;

pub use activity::*;
pub use auth::*;
pub use config::*;
pub use dashboard::*;
pub use decode::*;
pub use lead::*;
pub use user::*;
