//! One-deep administrator mailbox on each account.
//!
//! Writing replaces whatever is there; acknowledging clears it.

use gm_core::error::GmResult;
use gm_core::models::account::UpdateAccount;
use gm_core::repository::AccountRepository;
use tracing::info;
use uuid::Uuid;

use crate::guard;

/// Update that overwrites the mailbox with `text`.
pub(crate) fn post(text: String) -> UpdateAccount {
    UpdateAccount {
        admin_message: Some(Some(text)),
        ..Default::default()
    }
}

pub struct NotificationService<A: AccountRepository> {
    account_repo: A,
}

impl<A: AccountRepository> NotificationService<A> {
    pub fn new(account_repo: A) -> Self {
        Self { account_repo }
    }

    pub async fn set_message(&self, actor: Uuid, account_id: Uuid, text: &str) -> GmResult<()> {
        guard::require_admin(&self.account_repo, actor, "send notifications").await?;
        let text = guard::required(text, "message")?;
        self.account_repo.update(account_id, post(text)).await?;
        info!(%account_id, sent_by = %actor, "admin message posted");
        Ok(())
    }

    /// Clear the mailbox. Clearing an empty mailbox succeeds.
    pub async fn acknowledge(&self, actor: Uuid, account_id: Uuid) -> GmResult<()> {
        guard::require_self_or_admin(&self.account_repo, actor, account_id, "clear messages")
            .await?;
        self.account_repo
            .update(
                account_id,
                UpdateAccount {
                    admin_message: Some(None),
                    ..Default::default()
                },
            )
            .await?;
        Ok(())
    }

    pub async fn pending_message(&self, actor: Uuid, account_id: Uuid) -> GmResult<Option<String>> {
        guard::require_self_or_admin(&self.account_repo, actor, account_id, "read messages")
            .await?;
        let account = self.account_repo.get_by_id(account_id).await?;
        Ok(account.admin_message)
    }
}
