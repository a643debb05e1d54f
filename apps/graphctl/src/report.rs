//! Operator-facing output on stdout.

use std::io::{self, Write};

use identity_resolver_sdk::{IdentitySummary, InvitationRecord};

/// One identity as a single `- key=value | ...` line. Missing values print empty.
#[must_use]
pub fn identity_line(identity: &IdentitySummary) -> String {
    let enabled = match identity.enabled() {
        Some(true) => "true",
        Some(false) => "false",
        None => "",
    };
    format!(
        "- id={} | displayName={} | upn={} | mail={} | type={} | enabled={} | externalState={}",
        identity.id(),
        identity.display_name().unwrap_or_default(),
        identity.principal_name().unwrap_or_default(),
        identity.mail().unwrap_or_default(),
        identity.user_type().unwrap_or_default(),
        enabled,
        identity.external_state().unwrap_or_default(),
    )
}

fn identities<W: Write>(out: &mut W, candidates: &[IdentitySummary]) -> io::Result<()> {
    for identity in candidates {
        writeln!(out, "{}", identity_line(identity))?;
    }
    Ok(())
}

pub fn matches<W: Write>(out: &mut W, candidates: &[IdentitySummary]) -> io::Result<()> {
    writeln!(out, "Matched users: {}", candidates.len())?;
    identities(out, candidates)
}

pub fn delete_refused_empty<W: Write>(out: &mut W, query: &str) -> io::Result<()> {
    writeln!(out, "No user found for '{query}'; no changes made.")
}

pub fn delete_refused_ambiguous<W: Write>(
    out: &mut W,
    query: &str,
    candidates: &[IdentitySummary],
) -> io::Result<()> {
    writeln!(
        out,
        "Multiple users matched '{query}'; refusing to delete. Matches:"
    )?;
    identities(out, candidates)
}

pub fn delete_dry_run<W: Write>(out: &mut W, target: &IdentitySummary) -> io::Result<()> {
    writeln!(
        out,
        "DRY RUN: would delete user id={} ({})",
        target.id(),
        target.principal_name().unwrap_or_default()
    )
}

pub fn delete_completed<W: Write>(out: &mut W, id: &str) -> io::Result<()> {
    writeln!(out, "Delete completed for id={id}")
}

pub fn invitation<W: Write>(out: &mut W, record: &InvitationRecord) -> io::Result<()> {
    writeln!(out, "Invitation created.")?;
    writeln!(
        out,
        "- invitedUserEmailAddress={}",
        record.invited_user_email_address.as_deref().unwrap_or_default()
    )?;
    writeln!(
        out,
        "- inviteRedeemUrl={}",
        record.invite_redeem_url.as_deref().unwrap_or_default()
    )?;
    if let Some(id) = record.invited_user_id() {
        writeln!(out, "- invitedUser.id={id}")?;
    }
    writeln!(out, "- status={}", record.status.as_deref().unwrap_or_default())
}

pub fn invite_dry_run<W: Write>(out: &mut W, email: &str) -> io::Result<()> {
    writeln!(out, "DRY RUN: would invite {email}")
}

pub fn config_valid<W: Write>(out: &mut W) -> io::Result<()> {
    writeln!(out, "Configuration is valid")
}
