//! Query classification: raw query + strategy -> resolution plan.

use identity_resolver_sdk::{
    FilterExpr, FilterField, LookupStep, Query, ResolutionPlan, Strategy,
};
use uuid::Uuid;

/// Length of the hyphenated 8-4-4-4-12 identifier form.
const HYPHENATED_ID_LEN: usize = 36;

/// Whether `raw` is a canonical hyphenated identifier (hex, any case).
#[must_use]
pub fn is_identifier_shaped(raw: &str) -> bool {
    // `Uuid::try_parse` also accepts simple, braced and URN forms; only the
    // hyphenated form is exactly 36 characters long.
    raw.len() == HYPHENATED_ID_LEN && Uuid::try_parse(raw).is_ok()
}

/// Builds resolution plans.
///
/// Pure: holds only the result cap applied to every filtered step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryClassifier {
    max_results: u32,
}

impl QueryClassifier {
    /// `max_results` is clamped to `1..=page_ceiling`.
    #[must_use]
    pub fn new(max_results: u32, page_ceiling: u32) -> Self {
        Self {
            max_results: max_results.clamp(1, page_ceiling.max(1)),
        }
    }

    /// Effective cap of filtered steps.
    #[must_use]
    pub fn max_results(&self) -> u32 {
        self.max_results
    }

    /// Produce the ordered lookup plan for `query`.
    ///
    /// An empty query yields an empty plan.
    #[must_use]
    pub fn classify(&self, query: &Query, strategy: Strategy) -> ResolutionPlan {
        if query.is_empty() {
            return ResolutionPlan::empty();
        }
        let q = query.as_str();

        let steps = match strategy {
            Strategy::Auto if is_identifier_shaped(q) => vec![LookupStep::direct(q)],
            Strategy::Auto if q.contains('@') => vec![
                LookupStep::direct(q),
                self.filtered(FilterExpr::eq(FilterField::PrincipalName, q)),
                self.filtered(FilterExpr::eq(FilterField::Mail, q)),
            ],
            Strategy::Auto | Strategy::ByNamePrefix => {
                vec![self.filtered(FilterExpr::starts_with(FilterField::DisplayName, q))]
            }
            Strategy::ById => vec![LookupStep::direct(q)],
            Strategy::ByUpn => vec![
                LookupStep::direct(q),
                self.filtered(FilterExpr::eq(FilterField::PrincipalName, q)),
            ],
            Strategy::ByEmail => vec![self.filtered(FilterExpr::eq(FilterField::Mail, q))],
        };

        tracing::debug!(
            query = %q,
            strategy = %strategy,
            steps = steps.len(),
            "classified query"
        );
        ResolutionPlan::new(steps)
    }

    fn filtered(&self, filter: FilterExpr) -> LookupStep {
        LookupStep::filtered(filter, self.max_results)
    }
}
