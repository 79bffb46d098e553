//! SurrealDB implementation of [`AccountRepository`].
//!
//! Vendor codes live under a UNIQUE index, so two accounts can never
//! hold the same code even when two administrators race. Guarded
//! updates put the expected vendor status into the `WHERE` clause of
//! the same `UPDATE` statement.

use chrono::{DateTime, Utc};
use gm_core::error::{GmError, GmResult};
use gm_core::models::account::{Account, CreateAccount, Role, UpdateAccount, VendorStatus};
use gm_core::repository::AccountRepository;
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use crate::error::DbError;

/// DB-side row struct for queries where the UUID is already known.
#[derive(Debug, SurrealValue)]
struct AccountRow {
    name: String,
    phone: String,
    email: Option<String>,
    role: String,
    is_admin: bool,
    is_vendor: bool,
    vendor_status: String,
    vendor_code: Option<String>,
    revoked_vendor_codes: Vec<String>,
    vendor_application_date: Option<DateTime<Utc>>,
    vendor_approval_date: Option<DateTime<Utc>>,
    admin_message: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// DB-side row struct that includes the record ID via `meta::id(id)`.
#[derive(Debug, SurrealValue)]
struct AccountRowWithId {
    record_id: String,
    name: String,
    phone: String,
    email: Option<String>,
    role: String,
    is_admin: bool,
    is_vendor: bool,
    vendor_status: String,
    vendor_code: Option<String>,
    revoked_vendor_codes: Vec<String>,
    vendor_application_date: Option<DateTime<Utc>>,
    vendor_approval_date: Option<DateTime<Utc>>,
    admin_message: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, SurrealValue)]
struct CountRow {
    total: u64,
}

fn parse_role(s: &str) -> Result<Role, DbError> {
    Role::parse(s).ok_or_else(|| DbError::Decode(format!("unknown role: {s}")))
}

fn parse_vendor_status(s: &str) -> Result<VendorStatus, DbError> {
    VendorStatus::parse(s).ok_or_else(|| DbError::Decode(format!("unknown vendor status: {s}")))
}

impl AccountRow {
    fn into_account(self, id: Uuid) -> Result<Account, DbError> {
        Ok(Account {
            id,
            name: self.name,
            phone: self.phone,
            email: self.email,
            role: parse_role(&self.role)?,
            is_admin: self.is_admin,
            is_vendor: self.is_vendor,
            vendor_status: parse_vendor_status(&self.vendor_status)?,
            vendor_code: self.vendor_code,
            revoked_vendor_codes: self.revoked_vendor_codes,
            vendor_application_date: self.vendor_application_date,
            vendor_approval_date: self.vendor_approval_date,
            admin_message: self.admin_message,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

impl AccountRowWithId {
    fn try_into_account(self) -> Result<Account, DbError> {
        let id = Uuid::parse_str(&self.record_id)
            .map_err(|e| DbError::Decode(format!("invalid UUID: {e}")))?;
        Ok(Account {
            id,
            name: self.name,
            phone: self.phone,
            email: self.email,
            role: parse_role(&self.role)?,
            is_admin: self.is_admin,
            is_vendor: self.is_vendor,
            vendor_status: parse_vendor_status(&self.vendor_status)?,
            vendor_code: self.vendor_code,
            revoked_vendor_codes: self.revoked_vendor_codes,
            vendor_application_date: self.vendor_application_date,
            vendor_approval_date: self.vendor_approval_date,
            admin_message: self.admin_message,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

/// `vendor_status IN ['pending', 'active']` built from enum literals only.
fn status_guard(expected: &[VendorStatus]) -> String {
    let list = expected
        .iter()
        .map(|s| format!("'{}'", s.as_str()))
        .collect::<Vec<_>>()
        .join(", ");
    format!("vendor_status IN [{list}]")
}

/// SurrealDB implementation of the Account repository.
#[derive(Clone)]
pub struct SurrealAccountRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealAccountRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }

    /// First account matching `condition`, which refers to `$value`.
    async fn find_one(&self, condition: &'static str, value: &str) -> GmResult<Account> {
        let query = format!(
            "SELECT meta::id(id) AS record_id, * FROM account \
             WHERE {condition}"
        );
        let mut result = self
            .db
            .query(&query)
            .bind(("value", value.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<AccountRowWithId> = result.take(0).map_err(DbError::from)?;
        let row = rows
            .into_iter()
            .next()
            .ok_or_else(|| DbError::not_found("account", format!("{condition} ({value})")))?;

        Ok(row.try_into_account()?)
    }

    /// Run an `UPDATE`, optionally guarded on the vendor status.
    /// Returns `None` when no record matched.
    async fn apply_update(
        &self,
        id: Uuid,
        guard: Option<&[VendorStatus]>,
        input: UpdateAccount,
    ) -> Result<Option<Account>, DbError> {
        let id_str = id.to_string();

        let mut sets = Vec::new();
        if input.name.is_some() {
            sets.push("name = $name");
        }
        if input.phone.is_some() {
            sets.push("phone = $phone");
        }
        if input.email.is_some() {
            sets.push("email = $email");
        }
        if input.role.is_some() {
            sets.push("role = $role");
            sets.push("is_admin = $is_admin");
        }
        if input.is_vendor.is_some() {
            sets.push("is_vendor = $is_vendor");
        }
        if input.vendor_status.is_some() {
            sets.push("vendor_status = $vendor_status");
        }
        if input.vendor_code.is_some() {
            sets.push("vendor_code = $vendor_code");
        }
        if input.revoke_vendor_code.is_some() {
            sets.push(
                "revoked_vendor_codes = \
                 array::union(revoked_vendor_codes, [$revoke_vendor_code])",
            );
        }
        if input.vendor_application_date.is_some() {
            sets.push("vendor_application_date = $vendor_application_date");
        }
        if input.vendor_approval_date.is_some() {
            sets.push("vendor_approval_date = $vendor_approval_date");
        }
        if input.admin_message.is_some() {
            sets.push("admin_message = $admin_message");
        }
        sets.push("updated_at = time::now()");

        let mut query = format!(
            "UPDATE type::record('account', $id) SET {}",
            sets.join(", ")
        );
        if let Some(expected) = guard {
            query.push_str(" WHERE ");
            query.push_str(&status_guard(expected));
        }

        let mut builder = self.db.query(&query).bind(("id", id_str));

        if let Some(name) = input.name {
            builder = builder.bind(("name", name));
        }
        if let Some(phone) = input.phone {
            builder = builder.bind(("phone", phone));
        }
        if let Some(email) = input.email {
            builder = builder.bind(("email", email));
        }
        if let Some(role) = input.role {
            builder = builder
                .bind(("role", role.as_str().to_string()))
                .bind(("is_admin", role.is_admin()));
        }
        if let Some(is_vendor) = input.is_vendor {
            builder = builder.bind(("is_vendor", is_vendor));
        }
        if let Some(status) = input.vendor_status {
            builder = builder.bind(("vendor_status", status.as_str().to_string()));
        }
        if let Some(code) = input.vendor_code {
            builder = builder.bind(("vendor_code", code));
        }
        if let Some(code) = input.revoke_vendor_code {
            builder = builder.bind(("revoke_vendor_code", code));
        }
        if let Some(date) = input.vendor_application_date {
            builder = builder.bind(("vendor_application_date", date));
        }
        if let Some(date) = input.vendor_approval_date {
            builder = builder.bind(("vendor_approval_date", date));
        }
        if let Some(message) = input.admin_message {
            builder = builder.bind(("admin_message", message));
        }

        let result = builder.await?;
        let mut result = result
            .check()
            .map_err(|e| DbError::from_statement("account", e.to_string()))?;

        let rows: Vec<AccountRow> = result.take(0)?;
        rows.into_iter()
            .next()
            .map(|row| row.into_account(id))
            .transpose()
    }
}

impl<C: Connection> AccountRepository for SurrealAccountRepository<C> {
    async fn create(&self, input: CreateAccount) -> GmResult<Account> {
        let id = Uuid::new_v4();
        let id_str = id.to_string();

        let result = self
            .db
            .query(
                "CREATE type::record('account', $id) SET \
                 name = $name, phone = $phone, email = $email, \
                 role = 'client', is_admin = false, \
                 is_vendor = false, vendor_status = 'none', \
                 vendor_code = NONE, revoked_vendor_codes = [], \
                 vendor_application_date = NONE, \
                 vendor_approval_date = NONE, \
                 admin_message = NONE",
            )
            .bind(("id", id_str.clone()))
            .bind(("name", input.name))
            .bind(("phone", input.phone))
            .bind(("email", input.email))
            .await
            .map_err(DbError::from)?;

        let mut result = result
            .check()
            .map_err(|e| DbError::from_statement("account", e.to_string()))?;

        let rows: Vec<AccountRow> = result.take(0).map_err(DbError::from)?;
        let row = rows
            .into_iter()
            .next()
            .ok_or_else(|| DbError::not_found("account", id_str))?;

        Ok(row.into_account(id)?)
    }

    async fn get_by_id(&self, id: Uuid) -> GmResult<Account> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query("SELECT * FROM type::record('account', $id)")
            .bind(("id", id_str.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<AccountRow> = result.take(0).map_err(DbError::from)?;
        let row = rows
            .into_iter()
            .next()
            .ok_or_else(|| DbError::not_found("account", id_str))?;

        Ok(row.into_account(id)?)
    }

    async fn get_by_phone(&self, phone: &str) -> GmResult<Account> {
        self.find_one("phone = $value", phone).await
    }

    async fn get_by_vendor_code(&self, code: &str) -> GmResult<Account> {
        self.find_one("vendor_code = $value", code).await
    }

    async fn get_by_revoked_code(&self, code: &str) -> GmResult<Account> {
        self.find_one("revoked_vendor_codes CONTAINS $value", code).await
    }

    async fn update(&self, id: Uuid, input: UpdateAccount) -> GmResult<Account> {
        self.apply_update(id, None, input)
            .await?
            .ok_or_else(|| GmError::not_found("account", id))
    }

    async fn update_if_vendor_status(
        &self,
        id: Uuid,
        expected: &[VendorStatus],
        input: UpdateAccount,
    ) -> GmResult<Account> {
        if expected.is_empty() {
            return Err(GmError::conflict("no vendor status allows this change"));
        }
        if let Some(account) = self.apply_update(id, Some(expected), input).await? {
            return Ok(account);
        }

        // Nothing matched: either the account is gone or its status moved.
        let current = self.get_by_id(id).await?;
        Err(GmError::conflict(format!(
            "vendor status is {}, expected {}",
            current.vendor_status.as_str(),
            expected
                .iter()
                .map(VendorStatus::as_str)
                .collect::<Vec<_>>()
                .join(" or ")
        )))
    }

    async fn list(&self) -> GmResult<Vec<Account>> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM account \
                 ORDER BY created_at ASC",
            )
            .await
            .map_err(DbError::from)?;

        let rows: Vec<AccountRowWithId> = result.take(0).map_err(DbError::from)?;
        let items = rows
            .into_iter()
            .map(|row| row.try_into_account())
            .collect::<Result<Vec<_>, DbError>>()?;
        Ok(items)
    }

    async fn list_by_vendor_status(&self, status: VendorStatus) -> GmResult<Vec<Account>> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM account \
                 WHERE vendor_status = $status \
                 ORDER BY vendor_application_date ASC, created_at ASC",
            )
            .bind(("status", status.as_str().to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<AccountRowWithId> = result.take(0).map_err(DbError::from)?;
        let items = rows
            .into_iter()
            .map(|row| row.try_into_account())
            .collect::<Result<Vec<_>, DbError>>()?;
        Ok(items)
    }

    async fn delete_all(&self) -> GmResult<u64> {
        let mut count_result = self
            .db
            .query("SELECT count() AS total FROM account GROUP ALL")
            .await
            .map_err(DbError::from)?;
        let count_rows: Vec<CountRow> = count_result.take(0).map_err(DbError::from)?;
        let total = count_rows.first().map(|r| r.total).unwrap_or(0);

        self.db
            .query("DELETE account")
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(|e| DbError::Query(e.to_string()))?;

        Ok(total)
    }
}
