//! Microsoft Graph directory plugin
//!
//! Implements [`DirectoryClient`](identity_resolver_sdk::DirectoryClient) over
//! the Graph v1.0 REST API: users are read and deleted under `/users`, guest
//! invitations are created under `/invitations`.
//!
//! ## Configuration
//!
//! ```yaml
//! graph:
//!   base_url: "https://graph.microsoft.com/v1.0"
//!   timeout: 30s
//!   max_retries: 3
//! ```
//!
//! Idempotent requests (GET, DELETE) are retried on throttling, gateway
//! errors and transport failures. POST is never retried.

#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

pub mod config;
pub mod domain;

pub use config::{DEFAULT_BASE_URL, GraphConfig};
pub use domain::client::{BuildError, GraphDirectoryClient};
pub use domain::retry::{ExponentialBackoff, RetryPolicy};
