//! In-memory directory used by the domain tests.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use identity_resolver_sdk::{
    DirectoryClient, DirectoryError, DirectoryIdentity, IdentitySummary, InvitationRecord,
    InvitationRequest,
};

/// A directory call as observed by the mock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    FetchByKey(String),
    FetchByFilter { filter: String, top: u32 },
    Delete(String),
    Invite(String),
}

/// Scripted directory.
///
/// Unscripted keys answer `NotFound`, unscripted filters answer an empty
/// page, unscripted deletes succeed.
pub struct MockDirectory {
    by_key: HashMap<String, Result<DirectoryIdentity, DirectoryError>>,
    by_filter: HashMap<String, Result<Vec<DirectoryIdentity>, DirectoryError>>,
    invitation: Result<InvitationRecord, DirectoryError>,
    page_size: u32,
    calls: Mutex<Vec<Call>>,
}

impl Default for MockDirectory {
    fn default() -> Self {
        Self {
            by_key: HashMap::new(),
            by_filter: HashMap::new(),
            invitation: Ok(InvitationRecord::default()),
            page_size: identity_resolver_sdk::DEFAULT_MAX_PAGE_SIZE,
            calls: Mutex::new(Vec::new()),
        }
    }
}

impl MockDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_key(mut self, key: &str, result: Result<DirectoryIdentity, DirectoryError>) -> Self {
        self.by_key.insert(key.to_owned(), result);
        self
    }

    pub fn with_filter(
        mut self,
        filter: &str,
        result: Result<Vec<DirectoryIdentity>, DirectoryError>,
    ) -> Self {
        self.by_filter.insert(filter.to_owned(), result);
        self
    }

    pub fn with_invitation(mut self, result: Result<InvitationRecord, DirectoryError>) -> Self {
        self.invitation = result;
        self
    }

    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size;
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl DirectoryClient for MockDirectory {
    async fn fetch_by_key(
        &self,
        key: &str,
        _fields: &[&str],
    ) -> Result<DirectoryIdentity, DirectoryError> {
        self.record(Call::FetchByKey(key.to_owned()));
        self.by_key
            .get(key)
            .cloned()
            .unwrap_or_else(|| Err(DirectoryError::NotFound(format!("'{key}'"))))
    }

    async fn fetch_by_filter(
        &self,
        filter: &str,
        max_results: u32,
        _fields: &[&str],
    ) -> Result<Vec<DirectoryIdentity>, DirectoryError> {
        self.record(Call::FetchByFilter {
            filter: filter.to_owned(),
            top: max_results,
        });
        self.by_filter.get(filter).cloned().unwrap_or(Ok(Vec::new()))
    }

    async fn delete_by_key(&self, key: &str) -> Result<(), DirectoryError> {
        self.record(Call::Delete(key.to_owned()));
        Ok(())
    }

    async fn create_invitation(
        &self,
        request: &InvitationRequest,
    ) -> Result<InvitationRecord, DirectoryError> {
        self.record(Call::Invite(request.email.clone()));
        self.invitation.clone()
    }

    fn max_page_size(&self) -> u32 {
        self.page_size
    }
}

pub fn identity(id: &str, name: &str) -> DirectoryIdentity {
    DirectoryIdentity {
        id: id.to_owned(),
        display_name: Some(name.to_owned()),
        ..Default::default()
    }
}

pub fn summary(id: &str, name: &str) -> IdentitySummary {
    identity(id, name).into()
}
