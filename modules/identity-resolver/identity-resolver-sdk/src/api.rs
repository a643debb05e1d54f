//! Directory client trait.
//!
//! The resolver, the action guard's callers and the invitation issuer only
//! ever talk to the directory through this trait. The HTTPS implementation
//! lives in the graph directory plugin; tests substitute in-memory mocks.

use async_trait::async_trait;

use crate::error::DirectoryError;
use crate::models::{DirectoryIdentity, InvitationRecord, InvitationRequest};

/// Largest page the directory's user collection will return for one request.
pub const DEFAULT_MAX_PAGE_SIZE: u32 = 999;

/// Remote identity directory capability.
///
/// Every call is a single remote round trip. Implementations own transport
/// concerns (authentication, retries, timeouts); callers only see the tagged
/// [`DirectoryError`] classification.
///
/// ```ignore
/// let user = client.fetch_by_key("alice@contoso.com", IDENTITY_FIELDS).await?;
/// let page = client.fetch_by_filter("mail eq 'alice@contoso.com'", 25, IDENTITY_FIELDS).await?;
/// client.delete_by_key(&user.id).await?;
/// ```
#[async_trait]
pub trait DirectoryClient: Send + Sync {
    /// Fetch exactly one identity by its key (object id or principal name).
    ///
    /// # Errors
    ///
    /// - `NotFound` if no identity has this key
    /// - `BadRequest` if the directory rejected the shape of the key
    /// - any other variant for authorization, throttling, server or transport failures
    async fn fetch_by_key(
        &self,
        key: &str,
        fields: &[&str],
    ) -> Result<DirectoryIdentity, DirectoryError>;

    /// Fetch up to `max_results` identities matching a server-side filter.
    ///
    /// The returned order is the order the directory produced; an empty
    /// vector means no match.
    ///
    /// # Errors
    ///
    /// Any [`DirectoryError`] reported by the directory or the transport.
    async fn fetch_by_filter(
        &self,
        filter: &str,
        max_results: u32,
        fields: &[&str],
    ) -> Result<Vec<DirectoryIdentity>, DirectoryError>;

    /// Delete the identity with the given key.
    ///
    /// # Errors
    ///
    /// Any [`DirectoryError`] reported by the directory or the transport.
    async fn delete_by_key(&self, key: &str) -> Result<(), DirectoryError>;

    /// Create a guest invitation.
    ///
    /// # Errors
    ///
    /// Any [`DirectoryError`] reported by the directory or the transport.
    async fn create_invitation(
        &self,
        request: &InvitationRequest,
    ) -> Result<InvitationRecord, DirectoryError>;

    /// Page-size ceiling of filtered queries.
    fn max_page_size(&self) -> u32 {
        DEFAULT_MAX_PAGE_SIZE
    }
}
