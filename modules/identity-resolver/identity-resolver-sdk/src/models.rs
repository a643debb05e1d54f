//! Domain models for identity resolution.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::error::ParseError;

/// Directory attributes selected for every identity lookup.
pub const IDENTITY_FIELDS: &[&str] = &[
    "id",
    "displayName",
    "userPrincipalName",
    "mail",
    "userType",
    "accountEnabled",
    "externalUserState",
    "externalUserStateChangeDateTime",
];

// ---------------------------------------------------------------------------
// Inputs
// ---------------------------------------------------------------------------

/// Operator-supplied identifier, trimmed of surrounding whitespace.
///
/// No other normalization is applied; case handling is left to the
/// directory's filter semantics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query(String);

impl Query {
    #[must_use]
    pub fn new(raw: &str) -> Self {
        Self(raw.trim().to_owned())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// How a query is turned into lookups.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Strategy {
    /// Infer the lookup kind from the shape of the query.
    #[default]
    Auto,
    ById,
    ByUpn,
    ByEmail,
    ByNamePrefix,
}

impl Strategy {
    pub const ALL: [Strategy; 5] = [
        Strategy::Auto,
        Strategy::ById,
        Strategy::ByUpn,
        Strategy::ByEmail,
        Strategy::ByNamePrefix,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Strategy::Auto => "auto",
            Strategy::ById => "by-id",
            Strategy::ByUpn => "by-upn",
            Strategy::ByEmail => "by-email",
            Strategy::ByNamePrefix => "by-name-prefix",
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Strategy {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Self::ALL
            .into_iter()
            .find(|strategy| strategy.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| ParseError {
                what: "strategy",
                value: s.to_owned(),
                expected: "auto, by-id, by-upn, by-email, by-name-prefix",
            })
    }
}

/// Operation the resolved identity is used for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Action {
    Search,
    Delete,
    Invite,
}

impl Action {
    /// Whether the action irreversibly mutates the directory.
    #[must_use]
    pub const fn is_destructive(self) -> bool {
        matches!(self, Action::Delete)
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Action::Search => "search",
            Action::Delete => "delete",
            Action::Invite => "invite",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Filter expressions
// ---------------------------------------------------------------------------

/// Directory attribute a filter step matches on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterField {
    PrincipalName,
    Mail,
    DisplayName,
}

impl FilterField {
    /// Attribute name as understood by the directory.
    #[must_use]
    pub const fn attribute(self) -> &'static str {
        match self {
            FilterField::PrincipalName => "userPrincipalName",
            FilterField::Mail => "mail",
            FilterField::DisplayName => "displayName",
        }
    }
}

/// Escape a string literal for use inside a single-quoted filter literal.
#[must_use]
pub fn escape_literal(raw: &str) -> String {
    raw.replace('\'', "''")
}

/// Inverse of [`escape_literal`].
#[must_use]
pub fn unescape_literal(escaped: &str) -> String {
    escaped.replace("''", "'")
}

/// Server-side filter over one attribute.
///
/// The literal is stored unescaped and only escaped when rendered, so the
/// rendered expression can never be broken out of by a quote in the query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterExpr {
    /// `<field> eq '<value>'`
    Eq { field: FilterField, value: String },
    /// `startswith(<field>,'<value>')`
    StartsWith { field: FilterField, value: String },
}

impl FilterExpr {
    #[must_use]
    pub fn eq(field: FilterField, value: &str) -> Self {
        FilterExpr::Eq {
            field,
            value: value.to_owned(),
        }
    }

    #[must_use]
    pub fn starts_with(field: FilterField, value: &str) -> Self {
        FilterExpr::StartsWith {
            field,
            value: value.to_owned(),
        }
    }

    /// Render the expression in the directory's filter syntax.
    #[must_use]
    pub fn render(&self) -> String {
        match self {
            FilterExpr::Eq { field, value } => {
                format!("{} eq '{}'", field.attribute(), escape_literal(value))
            }
            FilterExpr::StartsWith { field, value } => {
                format!("startswith({},'{}')", field.attribute(), escape_literal(value))
            }
        }
    }
}

impl fmt::Display for FilterExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

// ---------------------------------------------------------------------------
// Resolution plan
// ---------------------------------------------------------------------------

/// One attempt within a resolution plan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LookupStep {
    /// Fetch a single identity by key.
    Direct { key: String },
    /// Fetch up to `max_results` identities matching `filter`.
    Filtered { filter: FilterExpr, max_results: u32 },
}

impl LookupStep {
    #[must_use]
    pub fn direct(key: &str) -> Self {
        LookupStep::Direct {
            key: key.to_owned(),
        }
    }

    #[must_use]
    pub fn filtered(filter: FilterExpr, max_results: u32) -> Self {
        LookupStep::Filtered {
            filter,
            max_results,
        }
    }
}

impl fmt::Display for LookupStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LookupStep::Direct { key } => write!(f, "direct(key={key})"),
            LookupStep::Filtered {
                filter,
                max_results,
            } => write!(f, "filter({filter}, top={max_results})"),
        }
    }
}

/// Ordered lookup attempts; resolution stops at the first step with a match.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolutionPlan {
    steps: Vec<LookupStep>,
}

impl ResolutionPlan {
    #[must_use]
    pub fn new(steps: Vec<LookupStep>) -> Self {
        Self { steps }
    }

    /// A plan that resolves to `Empty` without contacting the directory.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn steps(&self) -> &[LookupStep] {
        &self.steps
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

impl<'a> IntoIterator for &'a ResolutionPlan {
    type Item = &'a LookupStep;
    type IntoIter = std::slice::Iter<'a, LookupStep>;

    fn into_iter(self) -> Self::IntoIter {
        self.steps.iter()
    }
}

// ---------------------------------------------------------------------------
// Identities
// ---------------------------------------------------------------------------

/// Identity record as returned by the directory.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectoryIdentity {
    pub id: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub user_principal_name: Option<String>,
    #[serde(default)]
    pub mail: Option<String>,
    #[serde(default)]
    pub user_type: Option<String>,
    #[serde(default)]
    pub account_enabled: Option<bool>,
    #[serde(default)]
    pub external_user_state: Option<String>,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub external_user_state_change_date_time: Option<OffsetDateTime>,
}

/// Read-only projection of a resolved identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentitySummary {
    id: String,
    display_name: Option<String>,
    principal_name: Option<String>,
    mail: Option<String>,
    user_type: Option<String>,
    enabled: Option<bool>,
    external_state: Option<String>,
    external_state_changed_at: Option<OffsetDateTime>,
}

impl IdentitySummary {
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    #[must_use]
    pub fn display_name(&self) -> Option<&str> {
        self.display_name.as_deref()
    }

    #[must_use]
    pub fn principal_name(&self) -> Option<&str> {
        self.principal_name.as_deref()
    }

    #[must_use]
    pub fn mail(&self) -> Option<&str> {
        self.mail.as_deref()
    }

    #[must_use]
    pub fn user_type(&self) -> Option<&str> {
        self.user_type.as_deref()
    }

    #[must_use]
    pub fn enabled(&self) -> Option<bool> {
        self.enabled
    }

    #[must_use]
    pub fn external_state(&self) -> Option<&str> {
        self.external_state.as_deref()
    }

    #[must_use]
    pub fn external_state_changed_at(&self) -> Option<OffsetDateTime> {
        self.external_state_changed_at
    }
}

impl From<DirectoryIdentity> for IdentitySummary {
    fn from(identity: DirectoryIdentity) -> Self {
        Self {
            id: identity.id,
            display_name: identity.display_name,
            principal_name: identity.user_principal_name,
            mail: identity.mail,
            user_type: identity.user_type,
            enabled: identity.account_enabled,
            external_state: identity.external_user_state,
            external_state_changed_at: identity.external_user_state_change_date_time,
        }
    }
}

// ---------------------------------------------------------------------------
// Outcomes and decisions
// ---------------------------------------------------------------------------

/// Result of running a resolution plan.
///
/// `Multiple` is never collapsed into `Single`; consumers must branch on it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolutionOutcome {
    Empty,
    Single(IdentitySummary),
    /// Two or more matches, in the order the directory returned them.
    Multiple(Vec<IdentitySummary>),
}

impl ResolutionOutcome {
    /// Build the outcome for the matches of one lookup step.
    #[must_use]
    pub fn from_matches(mut matches: Vec<IdentitySummary>) -> Self {
        if matches.len() > 1 {
            return ResolutionOutcome::Multiple(matches);
        }
        matches
            .pop()
            .map_or(ResolutionOutcome::Empty, ResolutionOutcome::Single)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            ResolutionOutcome::Empty => 0,
            ResolutionOutcome::Single(_) => 1,
            ResolutionOutcome::Multiple(all) => all.len(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        matches!(self, ResolutionOutcome::Empty)
    }

    /// All matched identities in directory order.
    #[must_use]
    pub fn into_candidates(self) -> Vec<IdentitySummary> {
        match self {
            ResolutionOutcome::Empty => Vec::new(),
            ResolutionOutcome::Single(one) => vec![one],
            ResolutionOutcome::Multiple(all) => all,
        }
    }
}

/// What the caller may do with a resolution outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionDecision {
    /// Exactly one identity resolved; a destructive action may target it.
    Proceed(IdentitySummary),
    /// Nothing resolved; no change must be made.
    RefuseEmpty,
    /// More than one identity resolved; the caller must not guess.
    RefuseAmbiguous(Vec<IdentitySummary>),
    /// Read-only action: show every candidate (possibly none).
    Display(Vec<IdentitySummary>),
}

// ---------------------------------------------------------------------------
// Invitations
// ---------------------------------------------------------------------------

/// Guest invitation to create.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InvitationRequest {
    #[serde(rename = "invitedUserEmailAddress")]
    pub email: String,
    #[serde(rename = "inviteRedirectUrl")]
    pub redirect_url: String,
    pub send_invitation_message: bool,
}

/// Invitation as created by the directory.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvitationRecord {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub invited_user_email_address: Option<String>,
    #[serde(default)]
    pub invite_redeem_url: Option<String>,
    #[serde(default)]
    pub invited_user: Option<InvitedUser>,
    #[serde(default)]
    pub status: Option<String>,
}

impl InvitationRecord {
    #[must_use]
    pub fn invited_user_id(&self) -> Option<&str> {
        self.invited_user.as_ref().map(|u| u.id.as_str())
    }
}

/// Directory user created for an invitation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct InvitedUser {
    pub id: String,
}
