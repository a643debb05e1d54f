//! Identity Resolver Module
//!
//! Turns an operator query into a resolution plan, runs the plan against a
//! [`DirectoryClient`](identity_resolver_sdk::DirectoryClient) with ordered
//! fallback, and gates destructive actions on the outcome.
//!
//! The module is transport-agnostic: the directory implementation is injected
//! by the caller.
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

pub mod config;
pub mod domain;

pub use config::ResolverConfig;
pub use domain::{
    IdentityResolver, IdentityService, InvitationIssuer, QueryClassifier, ResolveError, decide,
    decide_for, is_identifier_shaped,
};
