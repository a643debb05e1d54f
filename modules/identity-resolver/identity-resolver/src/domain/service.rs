//! Service facade: classify, resolve, gate.

use std::sync::Arc;

use identity_resolver_sdk::{
    Action, ActionDecision, DirectoryClient, DirectoryError, InvitationRecord, Query,
    ResolutionOutcome, ResolutionPlan, Strategy,
};

use super::{IdentityResolver, InvitationIssuer, QueryClassifier, ResolveError, guard};
use crate::config::ResolverConfig;

/// Entry point used by the application layer.
///
/// Owns the directory client and wires the classifier, resolver and
/// invitation issuer around it.
pub struct IdentityService {
    client: Arc<dyn DirectoryClient>,
    classifier: QueryClassifier,
    resolver: IdentityResolver,
    issuer: InvitationIssuer,
}

impl IdentityService {
    /// `max_results` is clamped to the client's page-size ceiling.
    #[must_use]
    pub fn new(client: Arc<dyn DirectoryClient>, config: &ResolverConfig, max_results: u32) -> Self {
        let classifier = QueryClassifier::new(max_results, client.max_page_size());
        Self {
            resolver: IdentityResolver::new(client.clone(), config),
            issuer: InvitationIssuer::new(client.clone()),
            classifier,
            client,
        }
    }

    #[must_use]
    pub fn plan(&self, raw: &str, strategy: Strategy) -> ResolutionPlan {
        self.classifier.classify(&Query::new(raw), strategy)
    }

    /// Classify `raw` and run the resulting plan.
    ///
    /// # Errors
    ///
    /// See [`IdentityResolver::resolve`].
    pub async fn resolve_query(
        &self,
        raw: &str,
        strategy: Strategy,
    ) -> Result<ResolutionOutcome, ResolveError> {
        let plan = self.plan(raw, strategy);
        self.resolver.resolve(&plan).await
    }

    /// Resolve `raw` and pass the outcome through the safety gate for `action`.
    ///
    /// # Errors
    ///
    /// See [`IdentityResolver::resolve`].
    pub async fn decide(
        &self,
        raw: &str,
        strategy: Strategy,
        action: Action,
    ) -> Result<ActionDecision, ResolveError> {
        let outcome = self.resolve_query(raw, strategy).await?;
        Ok(guard::decide_for(outcome, action))
    }

    /// Delete the identity with object id `id`.
    ///
    /// Callers must only pass the id of a `Proceed` decision.
    ///
    /// # Errors
    ///
    /// Propagates the directory error unchanged.
    pub async fn delete(&self, id: &str) -> Result<(), DirectoryError> {
        tracing::warn!(id, "deleting identity");
        self.client.delete_by_key(id).await?;
        tracing::warn!(id, "identity deleted");
        Ok(())
    }

    /// See [`InvitationIssuer::invite`].
    ///
    /// # Errors
    ///
    /// Propagates the directory error unchanged.
    pub async fn invite(
        &self,
        email: &str,
        redirect_url: &str,
        send_invitation_message: bool,
    ) -> Result<InvitationRecord, DirectoryError> {
        self.issuer
            .invite(email, redirect_url, send_invitation_message)
            .await
    }
}
