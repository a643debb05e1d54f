//! Plan execution with ordered fallback.

use std::sync::Arc;

use identity_resolver_sdk::{
    DirectoryClient, DirectoryError, FilterExpr, IDENTITY_FIELDS, IdentitySummary, LookupStep,
    ResolutionOutcome, ResolutionPlan,
};

use super::ResolveError;
use crate::config::ResolverConfig;

/// Runs resolution plans against a directory.
///
/// Steps run strictly in order, one call at a time. The first step yielding
/// at least one identity decides the outcome; later steps are never tried.
pub struct IdentityResolver {
    client: Arc<dyn DirectoryClient>,
    soft_bad_request_on_direct: bool,
}

impl IdentityResolver {
    #[must_use]
    pub fn new(client: Arc<dyn DirectoryClient>, config: &ResolverConfig) -> Self {
        Self {
            client,
            soft_bad_request_on_direct: config.soft_bad_request_on_direct,
        }
    }

    /// Execute `plan`.
    ///
    /// # Errors
    ///
    /// Returns [`ResolveError`] when a step fails with a directory error that
    /// is not absorbed: anything on a filtered step, and anything other than
    /// `NotFound` / `BadRequest` (when tolerated) on a direct step. No
    /// further steps are attempted after such an error.
    pub async fn resolve(&self, plan: &ResolutionPlan) -> Result<ResolutionOutcome, ResolveError> {
        for (step_index, step) in plan.steps().iter().enumerate() {
            tracing::debug!(step_index, step = %step, "attempting lookup step");

            let matches = match step {
                LookupStep::Direct { key } => self.run_direct(key).await,
                LookupStep::Filtered {
                    filter,
                    max_results,
                } => self.run_filtered(filter, *max_results).await,
            }
            .map_err(|source| {
                tracing::error!(step_index, step = %step, error = %source, "lookup step failed");
                ResolveError {
                    step_index,
                    step: step.to_string(),
                    source,
                }
            })?;

            if matches.is_empty() {
                tracing::debug!(step_index, "no match; advancing to next step");
                continue;
            }

            let outcome = ResolutionOutcome::from_matches(matches);
            tracing::info!(
                step_index,
                step = %step,
                matches = outcome.len(),
                "resolution settled"
            );
            return Ok(outcome);
        }

        tracing::info!(steps = plan.len(), "resolution exhausted without a match");
        Ok(ResolutionOutcome::Empty)
    }

    async fn run_direct(&self, key: &str) -> Result<Vec<IdentitySummary>, DirectoryError> {
        match self.client.fetch_by_key(key, IDENTITY_FIELDS).await {
            Ok(identity) => Ok(vec![identity.into()]),
            Err(DirectoryError::NotFound(message)) => {
                tracing::debug!(%message, "direct lookup: not found");
                Ok(Vec::new())
            }
            Err(DirectoryError::BadRequest(message)) if self.soft_bad_request_on_direct => {
                tracing::debug!(%message, "direct lookup: key shape rejected, treating as no match");
                Ok(Vec::new())
            }
            Err(
                fatal @ (DirectoryError::BadRequest(_)
                | DirectoryError::Unauthorized(_)
                | DirectoryError::RateLimited { .. }
                | DirectoryError::ServerError { .. }
                | DirectoryError::Transport(_)),
            ) => Err(fatal),
        }
    }

    async fn run_filtered(
        &self,
        filter: &FilterExpr,
        max_results: u32,
    ) -> Result<Vec<IdentitySummary>, DirectoryError> {
        let page = self
            .client
            .fetch_by_filter(&filter.render(), max_results, IDENTITY_FIELDS)
            .await?;
        let cap = usize::try_from(max_results).unwrap_or(usize::MAX);
        Ok(page.into_iter().take(cap).map(IdentitySummary::from).collect())
    }
}
