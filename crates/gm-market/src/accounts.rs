//! Account registration, profile reads and super-admin tooling.

use gm_core::error::{GmError, GmResult};
use gm_core::models::account::{Account, CreateAccount, Role, UpdateAccount};
use gm_core::repository::AccountRepository;
use tracing::{info, warn};
use uuid::Uuid;

use crate::guard;

pub struct AccountService<A: AccountRepository> {
    account_repo: A,
}

impl<A: AccountRepository> AccountService<A> {
    pub fn new(account_repo: A) -> Self {
        Self { account_repo }
    }

    /// Create the marketplace record for a freshly signed-up identity.
    /// New accounts are plain clients with no vendor state.
    pub async fn register(&self, input: CreateAccount) -> GmResult<Account> {
        let input = CreateAccount {
            name: guard::required(&input.name, "name")?,
            phone: guard::required(&input.phone, "phone")?,
            email: input
                .email
                .map(|e| e.trim().to_string())
                .filter(|e| !e.is_empty()),
        };
        let account = self.account_repo.create(input).await?;
        info!(account_id = %account.id, "account registered");
        Ok(account)
    }

    pub async fn get_profile(&self, actor: Uuid, account_id: Uuid) -> GmResult<Account> {
        guard::require_self_or_admin(&self.account_repo, actor, account_id, "read other profiles")
            .await?;
        self.account_repo.get_by_id(account_id).await
    }

    /// Sign-in lookup by phone number.
    pub async fn find_by_phone(&self, phone: &str) -> GmResult<Account> {
        self.account_repo.get_by_phone(phone.trim()).await
    }

    pub async fn list_accounts(&self, actor: Uuid) -> GmResult<Vec<Account>> {
        guard::require_admin(&self.account_repo, actor, "list accounts").await?;
        self.account_repo.list().await
    }

    /// Change an account's role. A super-admin cannot demote itself,
    /// so the platform always keeps one.
    pub async fn set_role(&self, actor: Uuid, account_id: Uuid, role: Role) -> GmResult<Account> {
        guard::require_super_admin(&self.account_repo, actor, "change roles").await?;
        if actor == account_id && role != Role::SuperAdmin {
            return Err(GmError::conflict("a super-admin cannot demote itself"));
        }

        let updated = self
            .account_repo
            .update(
                account_id,
                UpdateAccount {
                    role: Some(role),
                    ..Default::default()
                },
            )
            .await?;
        info!(%account_id, role = role.as_str(), changed_by = %actor, "role changed");
        Ok(updated)
    }

    /// Delete every account. Returns how many were removed.
    pub async fn purge_all(&self, actor: Uuid) -> GmResult<u64> {
        guard::require_super_admin(&self.account_repo, actor, "purge accounts").await?;
        let removed = self.account_repo.delete_all().await?;
        warn!(removed, purged_by = %actor, "all accounts purged");
        Ok(removed)
    }
}
