/// In-process repositories
///
/// One mutex guards all tables so the account cascade and the refresh-token
/// compare-and-set stay atomic.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use uuid::Uuid;

use super::{AccountRepository, ChirpRepository, RefreshTokenRepository, StorageError};
use crate::models::{Account, Chirp, NewAccount, NewChirp, RefreshToken, SortOrder};

#[derive(Default)]
struct Tables {
    accounts: HashMap<Uuid, Account>,
    refresh_tokens: HashMap<String, RefreshToken>,
    // insertion order
    chirps: Vec<Chirp>,
}

#[derive(Default)]
pub struct InMemoryStorage {
    tables: Mutex<Tables>,
}

impl InMemoryStorage {
    fn tables(&self) -> Result<MutexGuard<'_, Tables>, StorageError> {
        self.tables
            .lock()
            .map_err(|_| StorageError::Backend("in-memory store lock poisoned".to_string()))
    }
}

#[async_trait]
impl AccountRepository for InMemoryStorage {
    async fn create_account(&self, account: NewAccount) -> Result<Account, StorageError> {
        let mut tables = self.tables()?;
        if tables.accounts.values().any(|a| a.email == account.email) {
            return Err(StorageError::Conflict(format!(
                "email {} already registered",
                account.email
            )));
        }

        let now = Utc::now();
        let created = Account {
            id: Uuid::new_v4(),
            created_at: now,
            updated_at: now,
            email: account.email,
            hashed_password: account.hashed_password,
            is_chirpy_red: false,
        };
        tables.accounts.insert(created.id, created.clone());
        Ok(created)
    }

    async fn get_account_by_email(&self, email: &str) -> Result<Account, StorageError> {
        self.tables()?
            .accounts
            .values()
            .find(|a| a.email == email)
            .cloned()
            .ok_or(StorageError::NotFound)
    }

    async fn get_account_by_id(&self, id: Uuid) -> Result<Account, StorageError> {
        self.tables()?
            .accounts
            .get(&id)
            .cloned()
            .ok_or(StorageError::NotFound)
    }

    async fn update_account_credentials(
        &self,
        id: Uuid,
        email: &str,
        hashed_password: &str,
    ) -> Result<Account, StorageError> {
        let mut tables = self.tables()?;
        if tables
            .accounts
            .values()
            .any(|a| a.id != id && a.email == email)
        {
            return Err(StorageError::Conflict(format!("email {} already registered", email)));
        }

        let account = tables.accounts.get_mut(&id).ok_or(StorageError::NotFound)?;
        account.email = email.to_string();
        account.hashed_password = hashed_password.to_string();
        account.updated_at = Utc::now();
        Ok(account.clone())
    }

    async fn upgrade_account(&self, id: Uuid) -> Result<(), StorageError> {
        let mut tables = self.tables()?;
        let account = tables.accounts.get_mut(&id).ok_or(StorageError::NotFound)?;
        account.is_chirpy_red = true;
        account.updated_at = Utc::now();
        Ok(())
    }

    async fn delete_all_accounts(&self) -> Result<(), StorageError> {
        let mut tables = self.tables()?;
        tables.accounts.clear();
        tables.refresh_tokens.clear();
        tables.chirps.clear();
        Ok(())
    }
}

#[async_trait]
impl RefreshTokenRepository for InMemoryStorage {
    async fn create_refresh_token(&self, token: &RefreshToken) -> Result<(), StorageError> {
        let mut tables = self.tables()?;
        if !tables.accounts.contains_key(&token.user_id) {
            return Err(StorageError::Backend(format!(
                "refresh token owner {} does not exist",
                token.user_id
            )));
        }
        if tables.refresh_tokens.contains_key(&token.token) {
            return Err(StorageError::Conflict("refresh token already exists".to_string()));
        }
        tables
            .refresh_tokens
            .insert(token.token.clone(), token.clone());
        Ok(())
    }

    async fn get_refresh_token(&self, token: &str) -> Result<RefreshToken, StorageError> {
        self.tables()?
            .refresh_tokens
            .get(token)
            .cloned()
            .ok_or(StorageError::NotFound)
    }

    async fn revoke_refresh_token(
        &self,
        token: &str,
        revoked_at: DateTime<Utc>,
    ) -> Result<bool, StorageError> {
        let mut tables = self.tables()?;
        match tables.refresh_tokens.get_mut(token) {
            Some(record) if record.revoked_at.is_none() => {
                record.revoked_at = Some(revoked_at);
                record.updated_at = revoked_at;
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

#[async_trait]
impl ChirpRepository for InMemoryStorage {
    async fn create_chirp(&self, chirp: NewChirp) -> Result<Chirp, StorageError> {
        let mut tables = self.tables()?;
        if !tables.accounts.contains_key(&chirp.user_id) {
            return Err(StorageError::Backend(format!(
                "chirp author {} does not exist",
                chirp.user_id
            )));
        }

        let now = Utc::now();
        let created = Chirp {
            id: Uuid::new_v4(),
            created_at: now,
            updated_at: now,
            body: chirp.body,
            user_id: chirp.user_id,
        };
        tables.chirps.push(created.clone());
        Ok(created)
    }

    async fn list_chirps(
        &self,
        author: Option<Uuid>,
        order: SortOrder,
    ) -> Result<Vec<Chirp>, StorageError> {
        let tables = self.tables()?;
        let matching = tables
            .chirps
            .iter()
            .filter(|c| author.map_or(true, |id| c.user_id == id))
            .cloned();

        let chirps = match order {
            SortOrder::Ascending => {
                let mut chirps: Vec<Chirp> = matching.collect();
                chirps.sort_by_key(|c| c.created_at);
                chirps
            }
            SortOrder::Descending => {
                let mut chirps: Vec<Chirp> = matching.rev().collect();
                chirps.sort_by(|a, b| b.created_at.cmp(&a.created_at));
                chirps
            }
        };
        Ok(chirps)
    }

    async fn get_chirp(&self, id: Uuid) -> Result<Chirp, StorageError> {
        self.tables()?
            .chirps
            .iter()
            .find(|c| c.id == id)
            .cloned()
            .ok_or(StorageError::NotFound)
    }

    async fn delete_chirp(&self, id: Uuid) -> Result<(), StorageError> {
        let mut tables = self.tables()?;
        let before = tables.chirps.len();
        tables.chirps.retain(|c| c.id != id);
        if tables.chirps.len() == before {
            return Err(StorageError::NotFound);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    async fn seeded() -> (InMemoryStorage, Account) {
        let store = InMemoryStorage::default();
        let account = store
            .create_account(NewAccount {
                email: "walt@breakingbad.com".to_string(),
                hashed_password: "hash".to_string(),
            })
            .await
            .expect("Failed to create account");
        (store, account)
    }

    fn refresh_for(user_id: Uuid) -> RefreshToken {
        let now = Utc::now();
        RefreshToken {
            token: "t0k3n".to_string(),
            user_id,
            created_at: now,
            updated_at: now,
            expires_at: now + Duration::days(60),
            revoked_at: None,
        }
    }

    #[tokio::test]
    async fn test_duplicate_email_is_conflict() {
        let (store, _) = seeded().await;
        let result = store
            .create_account(NewAccount {
                email: "walt@breakingbad.com".to_string(),
                hashed_password: "other".to_string(),
            })
            .await;

        assert!(matches!(result, Err(StorageError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_revoke_sets_revoked_at_once() {
        let (store, account) = seeded().await;
        store
            .create_refresh_token(&refresh_for(account.id))
            .await
            .unwrap();

        let first = Utc::now();
        assert!(store.revoke_refresh_token("t0k3n", first).await.unwrap());
        assert!(!store
            .revoke_refresh_token("t0k3n", first + Duration::seconds(5))
            .await
            .unwrap());

        let record = store.get_refresh_token("t0k3n").await.unwrap();
        assert_eq!(record.revoked_at, Some(first));
    }

    #[tokio::test]
    async fn test_revoke_unknown_token_reports_no_transition() {
        let store = InMemoryStorage::default();
        assert!(!store
            .revoke_refresh_token("missing", Utc::now())
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn test_upgrade_unknown_account_is_not_found() {
        let store = InMemoryStorage::default();
        let result = store.upgrade_account(Uuid::new_v4()).await;
        assert!(matches!(result, Err(StorageError::NotFound)));
    }

    #[tokio::test]
    async fn test_delete_all_cascades() {
        let (store, account) = seeded().await;
        store
            .create_refresh_token(&refresh_for(account.id))
            .await
            .unwrap();
        store
            .create_chirp(NewChirp {
                body: "hello".to_string(),
                user_id: account.id,
            })
            .await
            .unwrap();

        store.delete_all_accounts().await.unwrap();

        assert!(store.get_refresh_token("t0k3n").await.is_err());
        assert!(store
            .list_chirps(None, SortOrder::Ascending)
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_list_chirps_filters_and_sorts() {
        let (store, walt) = seeded().await;
        let jesse = store
            .create_account(NewAccount {
                email: "jesse@breakingbad.com".to_string(),
                hashed_password: "hash".to_string(),
            })
            .await
            .unwrap();

        for (body, user_id) in [("one", walt.id), ("two", jesse.id), ("three", walt.id)] {
            store
                .create_chirp(NewChirp {
                    body: body.to_string(),
                    user_id,
                })
                .await
                .unwrap();
        }

        let walts: Vec<String> = store
            .list_chirps(Some(walt.id), SortOrder::Ascending)
            .await
            .unwrap()
            .into_iter()
            .map(|c| c.body)
            .collect();
        assert_eq!(walts, vec!["one", "three"]);

        let all_desc: Vec<String> = store
            .list_chirps(None, SortOrder::Descending)
            .await
            .unwrap()
            .into_iter()
            .map(|c| c.body)
            .collect();
        assert_eq!(all_desc, vec!["three", "two", "one"]);
    }
}
