//! Identity-provider collaborator.
//!
//! Account provisioning lives outside the document store: creating a mobile
//! or web user also creates a login account, editing one keeps the account's
//! email and display name in sync, deleting one removes the account. The
//! trait keeps the provider swappable; the in-memory implementation backs
//! local runs and tests.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum IdentityError {
    #[error("email already in use")]
    EmailTaken,

    #[error("account not found")]
    NotFound,

    #[error("identity provider error: {0}")]
    Provider(String),
}

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Create an account; returns the new account UID.
    async fn create_account(
        &self,
        email: &str,
        password: &str,
        display_name: &str,
    ) -> Result<String, IdentityError>;

    /// Update an account's email and display name.
    async fn update_account(
        &self,
        uid: &str,
        email: &str,
        display_name: &str,
    ) -> Result<(), IdentityError>;

    /// Delete an account.
    async fn delete_account(&self, uid: &str) -> Result<(), IdentityError>;
}

#[derive(Debug, Clone)]
struct AccountRecord {
    email: String,
    #[allow(dead_code)]
    display_name: String,
}

/// In-memory provider. Email uniqueness is enforced under one lock, the same
/// guarantee a real provider gives.
#[derive(Default)]
pub struct InMemoryIdentityProvider {
    accounts: Mutex<HashMap<String, AccountRecord>>,
}

impl InMemoryIdentityProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn account_count(&self) -> usize {
        self.accounts.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn has_account(&self, uid: &str) -> bool {
        self.accounts
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .contains_key(uid)
    }
}

#[async_trait]
impl IdentityProvider for InMemoryIdentityProvider {
    async fn create_account(
        &self,
        email: &str,
        _password: &str,
        display_name: &str,
    ) -> Result<String, IdentityError> {
        let mut accounts = self.accounts.lock().unwrap_or_else(|e| e.into_inner());
        if accounts.values().any(|a| a.email == email) {
            return Err(IdentityError::EmailTaken);
        }
        let uid = uuid::Uuid::now_v7().to_string();
        accounts.insert(
            uid.clone(),
            AccountRecord {
                email: email.to_string(),
                display_name: display_name.to_string(),
            },
        );
        Ok(uid)
    }

    async fn update_account(
        &self,
        uid: &str,
        email: &str,
        display_name: &str,
    ) -> Result<(), IdentityError> {
        let mut accounts = self.accounts.lock().unwrap_or_else(|e| e.into_inner());
        if accounts
            .iter()
            .any(|(other, a)| other != uid && a.email == email)
        {
            return Err(IdentityError::EmailTaken);
        }
        let account = accounts.get_mut(uid).ok_or(IdentityError::NotFound)?;
        account.email = email.to_string();
        account.display_name = display_name.to_string();
        Ok(())
    }

    async fn delete_account(&self, uid: &str) -> Result<(), IdentityError> {
        let mut accounts = self.accounts.lock().unwrap_or_else(|e| e.into_inner());
        accounts.remove(uid).ok_or(IdentityError::NotFound)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn create_rejects_duplicate_email() {
        let provider = InMemoryIdentityProvider::new();
        provider
            .create_account("ana@x.com", "pw", "Ana Lopez")
            .await
            .unwrap();

        let err = provider
            .create_account("ana@x.com", "pw", "Otra Ana")
            .await
            .unwrap_err();
        assert_eq!(err, IdentityError::EmailTaken);
    }

    #[tokio::test]
    async fn update_allows_keeping_own_email() {
        let provider = InMemoryIdentityProvider::new();
        let uid = provider
            .create_account("ana@x.com", "pw", "Ana")
            .await
            .unwrap();

        provider
            .update_account(&uid, "ana@x.com", "Ana Lopez")
            .await
            .unwrap();
        provider
            .update_account(&uid, "ana.lopez@x.com", "Ana Lopez")
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn delete_missing_account_is_not_found() {
        let provider = InMemoryIdentityProvider::new();
        assert_eq!(
            provider.delete_account("nope").await,
            Err(IdentityError::NotFound)
        );
    }
}
