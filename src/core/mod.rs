//! Core Components
//!
//! HTTP transport contract shared by the executor, the refresh coordinator,
//! and the services.

pub mod transport;

pub use transport::*;
