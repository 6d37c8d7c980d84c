//! Leads API Integration
//!
//! Resilient access layer for the leads CRM backend.
//!
//! # Features
//!
//! - Retry with exponential backoff for idempotent requests, honoring `Retry-After`
//! - Single-flight access token refresh shared by every request that sees a 401
//! - A stable error contract: every failure surfaces as an [`ApiError`] with an [`ErrorKind`]
//! - Cancellation of in-flight requests, backoff sleeps, and refresh waits
//! - Tolerant decoding of the response shapes the backend produces
//! - Session persistence behind a [`CredentialStorage`] trait
//!
//! # Example
//!
//! ```rust,ignore
//! use leads_integration::{client_config, ApiClient, LeadQuery, LeadStatus};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = client_config()
//!         .base_url("https://crm.example.com/api")
//!         .build()?;
//!     let client = ApiClient::new(config)?;
//!
//!     client.auth().login("agent", "hunter22").await?;
//!
//!     let page = client
//!         .leads()
//!         .list(&LeadQuery {
//!             status: Some(LeadStatus::Qualified),
//!             ..Default::default()
//!         })
//!         .await?;
//!     println!("{} qualified leads", page.total);
//!
//!     Ok(())
//! }
//! ```
//!
//! # Architecture
//!
//! - `types`: configuration, payloads, and tolerant decoders
//! - `error`: error kinds and the pure normalizer
//! - `core`: HTTP transport
//! - `token`: session store, credential storage, refresh coordination
//! - `resilience`: retry policy and the request executor
//! - `telemetry`: request-layer counters
//! - `builders`: fluent configuration builder
//! - `services`: per-resource operations
//! - `client`: the client tying it together

pub mod builders;
pub mod client;
pub mod core;
pub mod error;
pub mod resilience;
pub mod services;
pub mod telemetry;
pub mod token;
pub mod types;

// Re-export main client
pub use client::{api_client_from_env, ApiClient};

// Re-export builders
pub use builders::{client_config, ClientConfigBuilder};

// Re-export errors
pub use error::{get_user_message, ApiError, ApiResult, ErrorKind, RetryAfter};

// Re-export types
pub use types::{
    // Config
    ClientConfig,
    // Auth
    LoginRequest, RegisterRequest, TokenGrant, User,
    // Leads
    Lead, LeadInput, LeadPage, LeadQuery, LeadStatus,
    // Activities
    Activity, ActivityInput, ActivityType,
    // Dashboard
    DashboardStats,
    // Decoding
    CandidateDecoders,
};

// Re-export core components
pub use crate::core::{
    HttpMethod, HttpRequest, HttpResponse, HttpTransport, MockHttpTransport, ReqwestHttpTransport,
    TransportError,
};

// Re-export token management
pub use token::{
    AuthStore, AuthTokens, CredentialStorage, FileCredentialStorage, HttpTokenRefresher,
    InMemoryCredentialStorage, MockTokenRefresher, PersistedSession, RefreshCoordinator,
    StorageError, TokenRefresher,
};

// Re-export resilience
pub use resilience::{Attempt, RequestExecutor, RequestPolicy, ResponseBody, RetryConfig};

// Re-export services
pub use services::{ActivitiesService, AuthService, DashboardService, LeadsService, LoginOutcome};

// Re-export telemetry
pub use telemetry::{ClientMetrics, MetricsSnapshot};
