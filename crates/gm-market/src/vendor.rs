//! Vendor lifecycle: application, approval, rejection, direct activation.

use chrono::Utc;
use gm_core::error::{GmError, GmResult};
use gm_core::models::account::{Account, Role, UpdateAccount, VendorStatus};
use gm_core::repository::AccountRepository;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::access_code::{AccessCodeAuthorizer, CodeGenerator, RandomCodeGenerator};
use crate::config::{MarketConfig, fill_code};
use crate::error::MarketError;
use crate::guard;

/// Role an account holds once it is (or stops being) a vendor.
/// Administrators keep their role either way.
fn vendor_role(current: Role, vendor: bool) -> Option<Role> {
    if current.is_admin() {
        None
    } else if vendor {
        Some(Role::Vendor)
    } else {
        Some(Role::Client)
    }
}

pub struct VendorService<A: AccountRepository, G: CodeGenerator = RandomCodeGenerator> {
    account_repo: A,
    codes: AccessCodeAuthorizer<A, G>,
    config: MarketConfig,
}

impl<A: AccountRepository + Clone, G: CodeGenerator> VendorService<A, G> {
    pub fn new(account_repo: A, generator: G, config: MarketConfig) -> Self {
        let codes =
            AccessCodeAuthorizer::new(account_repo.clone(), generator, config.max_code_attempts);
        Self {
            account_repo,
            codes,
            config,
        }
    }
}

impl<A: AccountRepository, G: CodeGenerator> VendorService<A, G> {
    pub fn authorizer(&self) -> &AccessCodeAuthorizer<A, G> {
        &self.codes
    }

    /// Put the account in the approval queue.
    ///
    /// Repeating the request while pending is a no-op; an active vendor
    /// cannot re-apply.
    pub async fn request_vendor_access(&self, actor: Uuid, account_id: Uuid) -> GmResult<Account> {
        guard::require_self_or_admin(&self.account_repo, actor, account_id, "apply for others")
            .await?;
        let account = self.account_repo.get_by_id(account_id).await?;

        match account.vendor_status {
            VendorStatus::Pending => {
                debug!(%account_id, "vendor application already pending");
                return Ok(account);
            }
            VendorStatus::Active => {
                return Err(GmError::conflict("this account is already an active vendor"));
            }
            VendorStatus::None | VendorStatus::Rejected => {}
        }

        let update = UpdateAccount {
            is_vendor: Some(true),
            vendor_status: Some(VendorStatus::Pending),
            vendor_application_date: Some(Some(Utc::now())),
            ..Default::default()
        };
        let expected = VendorStatus::predecessors(VendorStatus::Pending);
        match self
            .account_repo
            .update_if_vendor_status(account_id, &expected, update)
            .await
        {
            Ok(updated) => {
                info!(%account_id, "vendor application submitted");
                Ok(updated)
            }
            // A concurrent request got there first.
            Err(GmError::StateConflict { message }) => {
                let current = self.account_repo.get_by_id(account_id).await?;
                if current.vendor_status == VendorStatus::Pending {
                    Ok(current)
                } else {
                    Err(GmError::StateConflict { message })
                }
            }
            Err(e) => Err(e),
        }
    }

    /// Approve a pending application, minting the vendor's code.
    ///
    /// `{code}` in `message` is replaced with the minted code.
    pub async fn approve_vendor(
        &self,
        actor: Uuid,
        account_id: Uuid,
        message: &str,
    ) -> GmResult<Account> {
        guard::require_admin(&self.account_repo, actor, "approve vendors").await?;
        let message = guard::required(message, "approval message")?;
        let account = self.account_repo.get_by_id(account_id).await?;

        if account.vendor_status != VendorStatus::Pending {
            return Err(GmError::conflict(format!(
                "only pending applications can be approved (account is {})",
                account.vendor_status.as_str()
            )));
        }

        let role = vendor_role(account.role, true);
        let updated = self
            .activate_with_code(account_id, &[VendorStatus::Pending], |code| UpdateAccount {
                role,
                is_vendor: Some(true),
                vendor_status: Some(VendorStatus::Active),
                vendor_code: Some(Some(code.to_string())),
                vendor_approval_date: Some(Some(Utc::now())),
                admin_message: Some(Some(fill_code(&message, code))),
                ..Default::default()
            })
            .await?;

        info!(%account_id, approved_by = %actor, "vendor approved");
        Ok(updated)
    }

    /// Reject a pending application or revoke an active vendor.
    /// The vendor code is invalidated immediately.
    pub async fn reject_vendor(
        &self,
        actor: Uuid,
        account_id: Uuid,
        message: &str,
    ) -> GmResult<Account> {
        guard::require_admin(&self.account_repo, actor, "reject vendors").await?;
        let message = guard::required(message, "rejection message")?;
        let account = self.account_repo.get_by_id(account_id).await?;

        let expected = VendorStatus::predecessors(VendorStatus::Rejected);
        if !expected.contains(&account.vendor_status) {
            return Err(GmError::conflict(format!(
                "only pending or active vendors can be rejected (account is {})",
                account.vendor_status.as_str()
            )));
        }

        let role = if account.role == Role::Vendor {
            Some(Role::Client)
        } else {
            None
        };
        let update = UpdateAccount {
            role,
            vendor_status: Some(VendorStatus::Rejected),
            vendor_code: Some(None),
            revoke_vendor_code: account.vendor_code.clone(),
            admin_message: Some(Some(message)),
            ..Default::default()
        };
        let updated = self
            .account_repo
            .update_if_vendor_status(account_id, &expected, update)
            .await?;

        info!(
            %account_id,
            rejected_by = %actor,
            was = account.vendor_status.as_str(),
            "vendor rejected"
        );
        Ok(updated)
    }

    /// Activate an account without an application.
    pub async fn direct_activate(&self, actor: Uuid, account_id: Uuid) -> GmResult<Account> {
        guard::require_admin(&self.account_repo, actor, "activate vendors").await?;
        let account = self.account_repo.get_by_id(account_id).await?;

        if !account.vendor_status.can_activate_directly() {
            return Err(GmError::conflict("this account is already an active vendor"));
        }

        let expected: Vec<VendorStatus> = VendorStatus::ALL
            .into_iter()
            .filter(VendorStatus::can_activate_directly)
            .collect();
        let role = vendor_role(account.role, true);
        let now = Utc::now();
        let application_date = account.vendor_application_date.unwrap_or(now);
        let updated = self
            .activate_with_code(account_id, &expected, |code| UpdateAccount {
                role,
                is_vendor: Some(true),
                vendor_status: Some(VendorStatus::Active),
                vendor_code: Some(Some(code.to_string())),
                vendor_application_date: Some(Some(application_date)),
                vendor_approval_date: Some(Some(now)),
                admin_message: Some(Some(self.config.activation_message(code))),
                ..Default::default()
            })
            .await?;

        info!(%account_id, activated_by = %actor, "vendor activated directly");
        Ok(updated)
    }

    /// Flip the vendor flag and the matching Client/Vendor role.
    /// Vendor status and code are left untouched.
    pub async fn toggle_vendor_flag(&self, actor: Uuid, account_id: Uuid) -> GmResult<Account> {
        guard::require_admin(&self.account_repo, actor, "change vendor flags").await?;
        let account = self.account_repo.get_by_id(account_id).await?;

        let is_vendor = !account.is_vendor;
        let update = UpdateAccount {
            is_vendor: Some(is_vendor),
            role: vendor_role(account.role, is_vendor),
            ..Default::default()
        };
        let updated = self.account_repo.update(account_id, update).await?;

        info!(%account_id, is_vendor, "vendor flag toggled");
        Ok(updated)
    }

    /// Replace an active vendor's code; the old code stops resolving.
    pub async fn rotate_code(&self, actor: Uuid, account_id: Uuid) -> GmResult<Account> {
        guard::require_self_or_admin(&self.account_repo, actor, account_id, "rotate codes")
            .await?;
        let account = self.account_repo.get_by_id(account_id).await?;

        if !account.is_active_vendor() {
            return Err(GmError::conflict("only active vendors have a code to rotate"));
        }

        let updated = self
            .activate_with_code(account_id, &[VendorStatus::Active], |code| UpdateAccount {
                vendor_code: Some(Some(code.to_string())),
                revoke_vendor_code: account.vendor_code.clone(),
                ..Default::default()
            })
            .await?;

        info!(%account_id, "vendor code rotated");
        Ok(updated)
    }

    /// Accounts waiting in the approval queue.
    pub async fn list_vendor_applications(&self, actor: Uuid) -> GmResult<Vec<Account>> {
        guard::require_admin(&self.account_repo, actor, "review vendor applications").await?;
        self.account_repo
            .list_by_vendor_status(VendorStatus::Pending)
            .await
    }

    pub async fn list_active_vendors(&self, actor: Uuid) -> GmResult<Vec<Account>> {
        guard::require_admin(&self.account_repo, actor, "list vendors").await?;
        self.account_repo
            .list_by_vendor_status(VendorStatus::Active)
            .await
    }

    /// Mint a code and write it with `build`, guarded on `expected`.
    /// A code claimed by another account between mint and write is
    /// rejected by the store, so mint again.
    async fn activate_with_code<F>(
        &self,
        account_id: Uuid,
        expected: &[VendorStatus],
        build: F,
    ) -> GmResult<Account>
    where
        F: Fn(&str) -> UpdateAccount,
    {
        for _ in 0..self.config.max_code_attempts {
            let code = self.codes.mint_code().await?;
            match self
                .account_repo
                .update_if_vendor_status(account_id, expected, build(&code))
                .await
            {
                Err(GmError::AlreadyExists { .. }) => {
                    warn!(%account_id, "vendor code taken before write, minting again");
                }
                other => return other,
            }
        }
        Err(MarketError::CodeSpaceExhausted(self.config.max_code_attempts).into())
    }
}
