//! Identity Resolver SDK
//!
//! This crate provides the public contract of the `identity-resolver` module:
//!
//! - [`DirectoryClient`] - the remote directory capability the resolver depends on
//! - [`DirectoryError`] - tagged error surface of every directory call
//! - [`Query`], [`Strategy`], [`ResolutionPlan`], [`LookupStep`] - resolution inputs
//! - [`IdentitySummary`], [`ResolutionOutcome`], [`ActionDecision`] - resolution results
//!
//! ## Usage
//!
//! ```ignore
//! use identity_resolver_sdk::{DirectoryClient, Query, Strategy};
//!
//! let query = Query::new("  alice@contoso.com ");
//! let plan = classifier.classify(&query, Strategy::Auto);
//! let outcome = resolver.resolve(&plan).await?;
//! ```
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

pub mod api;
pub mod error;
pub mod models;

// Re-export main types at crate root
pub use api::{DEFAULT_MAX_PAGE_SIZE, DirectoryClient};
pub use error::{DirectoryError, ParseError};
pub use models::{
    Action, ActionDecision, DirectoryIdentity, FilterExpr, FilterField, IDENTITY_FIELDS,
    IdentitySummary, InvitationRecord, InvitationRequest, InvitedUser, LookupStep, Query,
    ResolutionOutcome, ResolutionPlan, Strategy, escape_literal, unescape_literal,
};
