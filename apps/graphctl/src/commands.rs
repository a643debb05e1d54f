//! Subcommand handlers: wire the service, run it, print the report.

use std::io::Write;
use std::sync::Arc;

use graph_directory_plugin::GraphDirectoryClient;
use graphctl_oauth::{ClientCredentialsToken, OAuthClientConfig, entra_token_endpoint};
use identity_resolver::IdentityService;
use identity_resolver_sdk::{Action, ActionDecision, Strategy};
use url::Url;

use crate::config::{AppConfig, ConfigError};
use crate::error::AppError;
use crate::report;

/// Build the Graph-backed service described by `config`.
///
/// No request is sent; the token is acquired on the first directory call.
pub fn connect(config: &AppConfig) -> Result<IdentityService, AppError> {
    let invalid = |message: String| AppError::Config(ConfigError::Invalid(message));
    let auth = &config.auth;

    let token_endpoint = match &auth.token_endpoint {
        Some(endpoint) => Url::parse(endpoint.trim())
            .map_err(|e| invalid(format!("auth.token_endpoint '{endpoint}': {e}")))?,
        None => entra_token_endpoint(&auth.authority_host, &auth.tenant_id)
            .map_err(|e| invalid(e.to_string()))?,
    };
    let mut oauth = OAuthClientConfig::new(
        token_endpoint,
        auth.client_id.trim(),
        auth.client_secret.clone(),
    );
    oauth.scopes = auth.scope.split_whitespace().map(str::to_owned).collect();
    oauth.auth_method = auth.auth_method;
    oauth.timeout = config.graph.timeout;

    let tokens = ClientCredentialsToken::new(oauth).map_err(|e| invalid(e.to_string()))?;
    let client = GraphDirectoryClient::new(&config.graph, Arc::new(tokens))
        .map_err(|e| invalid(e.to_string()))?;
    tracing::debug!(base_url = %config.graph.base_url, "directory client ready");

    Ok(IdentityService::new(
        Arc::new(client),
        &config.resolver,
        config.search.max_results,
    ))
}

fn require_query(query: &str) -> Result<&str, AppError> {
    let query = query.trim();
    if query.is_empty() {
        return Err(AppError::Validation("query must not be blank".to_owned()));
    }
    Ok(query)
}

/// List every identity `query` resolves to.
pub async fn search<W: Write>(
    service: &IdentityService,
    query: &str,
    strategy: Strategy,
    out: &mut W,
) -> Result<(), AppError> {
    let query = require_query(query)?;
    let candidates = match service.decide(query, strategy, Action::Search).await? {
        ActionDecision::Display(candidates) | ActionDecision::RefuseAmbiguous(candidates) => {
            candidates
        }
        ActionDecision::Proceed(identity) => vec![identity],
        ActionDecision::RefuseEmpty => Vec::new(),
    };
    tracing::info!(query, matches = candidates.len(), "search finished");
    report::matches(out, &candidates)?;
    Ok(())
}

/// Delete the identity `query` resolves to, but only if it resolves to
/// exactly one.
pub async fn delete<W: Write>(
    service: &IdentityService,
    query: &str,
    strategy: Strategy,
    dry_run: bool,
    out: &mut W,
) -> Result<(), AppError> {
    let query = require_query(query)?;
    match service.decide(query, strategy, Action::Delete).await? {
        ActionDecision::Proceed(target) if dry_run => {
            tracing::info!(id = target.id(), "dry run, delete skipped");
            report::delete_dry_run(out, &target)?;
        }
        ActionDecision::Proceed(target) => {
            service
                .delete(target.id())
                .await
                .map_err(|source| AppError::Action {
                    action: "delete",
                    source,
                })?;
            report::delete_completed(out, target.id())?;
        }
        ActionDecision::RefuseEmpty => {
            tracing::warn!(query, "delete refused: no match");
            report::delete_refused_empty(out, query)?;
        }
        ActionDecision::RefuseAmbiguous(candidates) => {
            tracing::error!(query, matches = candidates.len(), "delete refused: ambiguous");
            report::delete_refused_ambiguous(out, query, &candidates)?;
        }
        ActionDecision::Display(candidates) => report::matches(out, &candidates)?,
    }
    Ok(())
}

/// Send a guest invitation to `email`.
pub async fn invite<W: Write>(
    service: &IdentityService,
    email: &str,
    redirect_url: &str,
    send_invitation_message: bool,
    dry_run: bool,
    out: &mut W,
) -> Result<(), AppError> {
    let email = email.trim();
    if email.is_empty() || !email.contains('@') {
        return Err(AppError::Validation(format!(
            "'{email}' is not an email address"
        )));
    }
    if dry_run {
        report::invite_dry_run(out, email)?;
        return Ok(());
    }

    let record = service
        .invite(email, redirect_url, send_invitation_message)
        .await
        .map_err(|source| AppError::Action {
            action: "invite",
            source,
        })?;
    report::invitation(out, &record)?;
    Ok(())
}
