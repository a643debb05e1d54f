//! Guest invitations.

use std::sync::Arc;

use identity_resolver_sdk::{DirectoryClient, DirectoryError, InvitationRecord, InvitationRequest};

/// Issues one create-invitation call per request. No resolution, no retry.
pub struct InvitationIssuer {
    client: Arc<dyn DirectoryClient>,
}

impl InvitationIssuer {
    #[must_use]
    pub fn new(client: Arc<dyn DirectoryClient>) -> Self {
        Self { client }
    }

    /// Invite `email` as a guest.
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
        let request = InvitationRequest {
            email: email.trim().to_owned(),
            redirect_url: redirect_url.to_owned(),
            send_invitation_message,
        };
        tracing::warn!(email = %request.email, send_invitation_message, "creating guest invitation");

        let record = self.client.create_invitation(&request).await?;
        tracing::info!(
            invitation_id = record.id.as_deref().unwrap_or_default(),
            status = record.status.as_deref().unwrap_or_default(),
            "invitation created"
        );
        Ok(record)
    }
}
