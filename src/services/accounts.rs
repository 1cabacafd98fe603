//! Account registration
//!
//! The referrer is chosen once at registration and cannot change afterwards.

use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use uuid::Uuid;

use crate::models::claim::AccountClaimState;
use crate::store::{PlatformStore, StoreError, with_timeout};

#[derive(Debug)]
pub enum AccountError {
    Validation(String),
    NotFound(String),
    AlreadyExists(Uuid),
    Store(StoreError),
}

impl AccountError {
    pub fn code(&self) -> &'static str {
        match self {
            AccountError::Validation(_) | AccountError::AlreadyExists(_) => "VALIDATION_ERROR",
            AccountError::NotFound(_) => "NOT_FOUND",
            AccountError::Store(_) => "EXTERNAL_OPERATION_FAILED",
        }
    }
}

impl std::fmt::Display for AccountError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AccountError::Validation(msg) => write!(f, "{}", msg),
            AccountError::NotFound(msg) => write!(f, "{}", msg),
            AccountError::AlreadyExists(id) => write!(f, "Account {} is already registered", id),
            AccountError::Store(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for AccountError {}

impl From<StoreError> for AccountError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(msg) => AccountError::NotFound(msg),
            other => AccountError::Store(other),
        }
    }
}

pub struct AccountService {
    store: Arc<dyn PlatformStore>,
    timeout: Duration,
}

impl AccountService {
    pub fn new(store: Arc<dyn PlatformStore>, timeout: Duration) -> Self {
        Self { store, timeout }
    }

    pub async fn register(
        &self,
        id: Uuid,
        referred_by: Option<Uuid>,
    ) -> Result<AccountClaimState, AccountError> {
        if referred_by == Some(id) {
            return Err(AccountError::Validation(
                "An account cannot refer itself".to_string(),
            ));
        }

        if let Some(referrer) = referred_by {
            let exists = with_timeout(self.timeout, self.store.account_claim_state(referrer))
                .await?
                .is_some();
            if !exists {
                warn!(account_id = %id, referrer = %referrer, "Registration with unknown referrer");
                return Err(AccountError::NotFound("Referrer not found".to_string()));
            }
        }

        let account = match with_timeout(self.timeout, self.store.create_account(id, referred_by)).await
        {
            Ok(account) => account,
            Err(StoreError::Conflict(_)) => return Err(AccountError::AlreadyExists(id)),
            Err(e) => return Err(e.into()),
        };

        info!(account_id = %id, referred_by = ?referred_by, "Account registered");
        Ok(account)
    }

    pub async fn account(&self, id: Uuid) -> Result<AccountClaimState, AccountError> {
        with_timeout(self.timeout, self.store.account_claim_state(id))
            .await?
            .ok_or_else(|| AccountError::NotFound("Account not found".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn service() -> AccountService {
        AccountService::new(Arc::new(MemoryStore::new()), Duration::from_secs(1))
    }

    #[tokio::test]
    async fn test_register_with_referrer() {
        let service = service();
        let referrer = Uuid::new_v4();
        let referee = Uuid::new_v4();
        service.register(referrer, None).await.unwrap();

        let account = service.register(referee, Some(referrer)).await.unwrap();
        assert_eq!(account.referred_by, Some(referrer));
        assert_eq!(service.account(referee).await.unwrap().referred_by, Some(referrer));
    }

    #[tokio::test]
    async fn test_self_referral_is_rejected() {
        let service = service();
        let id = Uuid::new_v4();
        let err = service.register(id, Some(id)).await.unwrap_err();
        assert_eq!(err.code(), "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_unknown_referrer_is_rejected() {
        let service = service();
        let err = service.register(Uuid::new_v4(), Some(Uuid::new_v4())).await.unwrap_err();
        assert!(matches!(err, AccountError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_second_registration_cannot_change_referrer() {
        let service = service();
        let referrer = Uuid::new_v4();
        let id = Uuid::new_v4();
        service.register(referrer, None).await.unwrap();
        service.register(id, None).await.unwrap();

        let err = service.register(id, Some(referrer)).await.unwrap_err();
        assert!(matches!(err, AccountError::AlreadyExists(_)));
        assert_eq!(service.account(id).await.unwrap().referred_by, None);
    }

    #[tokio::test]
    async fn test_missing_account() {
        let err = service().account(Uuid::new_v4()).await.unwrap_err();
        assert_eq!(err.code(), "NOT_FOUND");
    }
}
