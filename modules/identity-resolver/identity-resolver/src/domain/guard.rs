//! Action safety gate.

use identity_resolver_sdk::{Action, ActionDecision, ResolutionOutcome};

/// Decide whether an action may proceed on `outcome`.
///
/// Destructive actions proceed only on exactly one match. Read-only actions
/// always display every candidate.
#[must_use]
pub fn decide(outcome: ResolutionOutcome, destructive: bool) -> ActionDecision {
    if !destructive {
        return ActionDecision::Display(outcome.into_candidates());
    }
    match outcome {
        ResolutionOutcome::Empty => ActionDecision::RefuseEmpty,
        ResolutionOutcome::Single(target) => ActionDecision::Proceed(target),
        ResolutionOutcome::Multiple(candidates) => ActionDecision::RefuseAmbiguous(candidates),
    }
}

/// [`decide`] for a named action.
#[must_use]
pub fn decide_for(outcome: ResolutionOutcome, action: Action) -> ActionDecision {
    let decision = decide(outcome, action.is_destructive());
    tracing::debug!(action = %action, decision = decision_kind(&decision), "safety gate");
    decision
}

fn decision_kind(decision: &ActionDecision) -> &'static str {
    match decision {
        ActionDecision::Proceed(_) => "proceed",
        ActionDecision::RefuseEmpty => "refuse-empty",
        ActionDecision::RefuseAmbiguous(_) => "refuse-ambiguous",
        ActionDecision::Display(_) => "display",
    }
}
