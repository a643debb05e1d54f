//! Resolution errors.

use identity_resolver_sdk::DirectoryError;
use thiserror::Error;

/// A lookup step failed with an error the resolver does not absorb.
///
/// Carries the directory error unchanged; the resolver never retries.
#[derive(Debug, Error)]
#[error("lookup step {} ({step}) failed: {source}", .step_index + 1)]
pub struct ResolveError {
    /// Zero-based position of the failing step in the plan.
    pub step_index: usize,
    /// Printable form of the failing step.
    pub step: String,
    pub source: DirectoryError,
}

impl ResolveError {
    #[must_use]
    pub fn directory_error(&self) -> &DirectoryError {
        &self.source
    }
}
