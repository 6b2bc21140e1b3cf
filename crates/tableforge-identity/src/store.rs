//! The account store contract.
//!
//! Persistence belongs to the host; Tableforge only *writes* profile data
//! onto an existing account, once. [`AccountStore`] is that single write.
//! [`MemoryAccountStore`] backs demos and tests.

use std::collections::HashMap;

use serde_json::Value;
use tableforge_protocol::UserId;
use tokio::sync::Mutex;

use crate::AccountStoreError;

/// A durable player record.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Account {
    pub user_id: UserId,
    pub username: String,
    pub display_name: Option<String>,
    pub lang_tag: Option<String>,
    pub avatar_url: Option<String>,
    pub metadata: HashMap<String, Value>,
}

impl Account {
    /// A fresh account as the host creates it on first login.
    pub fn new(user_id: impl Into<UserId>, username: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            username: username.into(),
            ..Default::default()
        }
    }
}

/// An update-by-id request. `None` fields are left untouched; `metadata`
/// replaces the stored map wholesale.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AccountUpdate {
    pub user_id: UserId,
    pub display_name: Option<String>,
    pub lang_tag: Option<String>,
    pub avatar_url: Option<String>,
    pub metadata: HashMap<String, Value>,
}

/// Write access to the host's account storage.
///
/// `Send + Sync + 'static` because one store is shared by every
/// authentication task for the life of the server.
pub trait AccountStore: Send + Sync + 'static {
    /// Applies `update` to the account it names.
    ///
    /// # Errors
    /// [`AccountStoreError::NotFound`] if there is no such account;
    /// [`AccountStoreError::Backend`] if storage fails.
    fn update_account(
        &self,
        update: AccountUpdate,
    ) -> impl std::future::Future<Output = Result<(), AccountStoreError>> + Send;
}

/// An in-process [`AccountStore`].
#[derive(Debug, Default)]
pub struct MemoryAccountStore {
    accounts: Mutex<HashMap<UserId, Account>>,
}

impl MemoryAccountStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds (or replaces) an account, as the host does on first login.
    pub async fn insert(&self, account: Account) {
        self.accounts
            .lock()
            .await
            .insert(account.user_id.clone(), account);
    }

    pub async fn get(&self, user_id: &UserId) -> Option<Account> {
        self.accounts.lock().await.get(user_id).cloned()
    }
}

impl AccountStore for MemoryAccountStore {
    async fn update_account(&self, update: AccountUpdate) -> Result<(), AccountStoreError> {
        let mut accounts = self.accounts.lock().await;
        let account = accounts
            .get_mut(&update.user_id)
            .ok_or_else(|| AccountStoreError::NotFound(update.user_id.clone()))?;

        if let Some(name) = update.display_name {
            account.display_name = Some(name);
        }
        if let Some(lang) = update.lang_tag {
            account.lang_tag = Some(lang);
        }
        if let Some(url) = update.avatar_url {
            account.avatar_url = Some(url);
        }
        account.metadata = update.metadata;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_update_account_unknown_id_returns_not_found() {
        let store = MemoryAccountStore::new();

        let result = store
            .update_account(AccountUpdate {
                user_id: UserId::new("ghost"),
                ..Default::default()
            })
            .await;

        assert!(matches!(result, Err(AccountStoreError::NotFound(id)) if id.as_str() == "ghost"));
    }

    #[tokio::test]
    async fn test_update_account_leaves_none_fields_untouched() {
        let store = MemoryAccountStore::new();
        let mut account = Account::new("u1", "gm");
        account.lang_tag = Some("de".into());
        store.insert(account).await;

        store
            .update_account(AccountUpdate {
                user_id: UserId::new("u1"),
                display_name: Some("Foo".into()),
                ..Default::default()
            })
            .await
            .unwrap();

        let stored = store.get(&UserId::new("u1")).await.unwrap();
        assert_eq!(stored.display_name.as_deref(), Some("Foo"));
        assert_eq!(stored.lang_tag.as_deref(), Some("de"));
        assert_eq!(stored.username, "gm");
    }
}
