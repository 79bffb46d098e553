//! Repository trait definitions for data access abstraction.
//!
//! These traits are the record-store boundary: services are generic
//! over them and never see the database. All operations are async.
//! Guarded updates (`*_if_*`) are conditional writes executed by the
//! store in one statement, so a concurrent writer that changed the
//! guarded field first makes the call fail with `StateConflict`.

use uuid::Uuid;

use crate::error::GmResult;
use crate::models::{
    account::{Account, CreateAccount, UpdateAccount, VendorStatus},
    order::{CreateOrder, Order, OrderStatus},
    product::{CreateProduct, Product, UpdateProduct},
};

// ---------------------------------------------------------------------------
// Accounts
// ---------------------------------------------------------------------------

pub trait AccountRepository: Send + Sync {
    fn create(&self, input: CreateAccount) -> impl Future<Output = GmResult<Account>> + Send;
    fn get_by_id(&self, id: Uuid) -> impl Future<Output = GmResult<Account>> + Send;
    fn get_by_phone(&self, phone: &str) -> impl Future<Output = GmResult<Account>> + Send;
    /// Indexed lookup on the unique `vendor_code` field.
    fn get_by_vendor_code(&self, code: &str) -> impl Future<Output = GmResult<Account>> + Send;
    fn get_by_revoked_code(&self, code: &str) -> impl Future<Output = GmResult<Account>> + Send;
    fn update(&self, id: Uuid, input: UpdateAccount)
    -> impl Future<Output = GmResult<Account>> + Send;
    /// Apply `input` only while the account's vendor status is one of
    /// `expected`. Fails with `StateConflict` otherwise, `NotFound` if
    /// the account is missing, and `AlreadyExists` if the write would
    /// duplicate a vendor code.
    fn update_if_vendor_status(
        &self,
        id: Uuid,
        expected: &[VendorStatus],
        input: UpdateAccount,
    ) -> impl Future<Output = GmResult<Account>> + Send;
    fn list(&self) -> impl Future<Output = GmResult<Vec<Account>>> + Send;
    fn list_by_vendor_status(
        &self,
        status: VendorStatus,
    ) -> impl Future<Output = GmResult<Vec<Account>>> + Send;
    /// Hard-delete every account. Returns how many were removed.
    fn delete_all(&self) -> impl Future<Output = GmResult<u64>> + Send;
}

// ---------------------------------------------------------------------------
// Catalog
// ---------------------------------------------------------------------------

pub trait ProductRepository: Send + Sync {
    fn create(&self, input: CreateProduct) -> impl Future<Output = GmResult<Product>> + Send;
    fn get_by_id(&self, id: Uuid) -> impl Future<Output = GmResult<Product>> + Send;
    fn update(&self, id: Uuid, input: UpdateProduct)
    -> impl Future<Output = GmResult<Product>> + Send;
    fn delete(&self, id: Uuid) -> impl Future<Output = GmResult<()>> + Send;
    fn list(&self) -> impl Future<Output = GmResult<Vec<Product>>> + Send;
    /// Products whose status is `Active`.
    fn list_active(&self) -> impl Future<Output = GmResult<Vec<Product>>> + Send;
    fn list_by_vendor(&self, vendor_id: Uuid)
    -> impl Future<Output = GmResult<Vec<Product>>> + Send;
}

// ---------------------------------------------------------------------------
// Orders
// ---------------------------------------------------------------------------

pub trait OrderRepository: Send + Sync {
    /// Persist a new order with status `En attente`.
    fn create(&self, input: CreateOrder) -> impl Future<Output = GmResult<Order>> + Send;
    fn get_by_id(&self, id: Uuid) -> impl Future<Output = GmResult<Order>> + Send;
    fn list(&self) -> impl Future<Output = GmResult<Vec<Order>>> + Send;
    fn list_by_account(&self, account_id: Uuid)
    -> impl Future<Output = GmResult<Vec<Order>>> + Send;
    /// Move the order from `from` to `to`; `StateConflict` if the stored
    /// status is no longer `from`.
    fn update_status_if(
        &self,
        id: Uuid,
        from: OrderStatus,
        to: OrderStatus,
    ) -> impl Future<Output = GmResult<Order>> + Send;
}
