//! Caller privilege checks shared by the services.
//!
//! The caller id comes from the external identity provider and is
//! trusted as-is; privileges are read from the caller's account record.

use gm_core::error::{GmError, GmResult};
use gm_core::models::account::{Account, Role};
use gm_core::repository::AccountRepository;
use uuid::Uuid;

use crate::error::MarketError;

async fn load_caller<A: AccountRepository>(accounts: &A, actor: Uuid) -> GmResult<Account> {
    match accounts.get_by_id(actor).await {
        Ok(account) => Ok(account),
        Err(GmError::NotFound { .. }) => Err(MarketError::UnknownCaller.into()),
        Err(e) => Err(e),
    }
}

/// Load the caller and require a Manager or Super-admin role.
pub(crate) async fn require_admin<A: AccountRepository>(
    accounts: &A,
    actor: Uuid,
    action: &'static str,
) -> GmResult<Account> {
    let caller = load_caller(accounts, actor).await?;
    if !caller.role.is_admin() {
        return Err(MarketError::AdminOnly(action).into());
    }
    Ok(caller)
}

pub(crate) async fn require_super_admin<A: AccountRepository>(
    accounts: &A,
    actor: Uuid,
    action: &'static str,
) -> GmResult<Account> {
    let caller = load_caller(accounts, actor).await?;
    if caller.role != Role::SuperAdmin {
        return Err(MarketError::SuperAdminOnly(action).into());
    }
    Ok(caller)
}

/// Owners act on their own record without a lookup; anyone else must
/// be an administrator.
pub(crate) async fn require_self_or_admin<A: AccountRepository>(
    accounts: &A,
    actor: Uuid,
    target: Uuid,
    action: &'static str,
) -> GmResult<()> {
    if actor == target {
        return Ok(());
    }
    require_admin(accounts, actor, action).await.map(|_| ())
}

/// Trimmed text, or `MissingField` when nothing is left.
pub(crate) fn required(value: &str, field: &'static str) -> GmResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(MarketError::MissingField(field).into());
    }
    Ok(trimmed.to_string())
}
