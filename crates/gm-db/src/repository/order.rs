//! SurrealDB implementation of [`OrderRepository`].
//!
//! Orders are written once; the only mutation offered is the guarded
//! status transition.

use chrono::{DateTime, Utc};
use gm_core::error::{GmError, GmResult};
use gm_core::models::order::{
    CreateOrder, CustomerDetails, FulfilmentMethod, Order, OrderItem, OrderStatus, PaymentMethod,
};
use gm_core::repository::OrderRepository;
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use crate::error::DbError;

#[derive(Debug, SurrealValue)]
struct OrderRow {
    account_id: Option<String>,
    items: serde_json::Value,
    subtotal: u64,
    delivery_fee: u64,
    total: u64,
    customer_name: String,
    customer_phone: String,
    city: String,
    district: String,
    landmark: String,
    method: String,
    pickup_time: Option<String>,
    payment_method: String,
    status: String,
    created_at: DateTime<Utc>,
}

#[derive(Debug, SurrealValue)]
struct OrderRowWithId {
    record_id: String,
    account_id: Option<String>,
    items: serde_json::Value,
    subtotal: u64,
    delivery_fee: u64,
    total: u64,
    customer_name: String,
    customer_phone: String,
    city: String,
    district: String,
    landmark: String,
    method: String,
    pickup_time: Option<String>,
    payment_method: String,
    status: String,
    created_at: DateTime<Utc>,
}

fn parse_status(s: &str) -> Result<OrderStatus, DbError> {
    OrderStatus::parse(s).ok_or_else(|| DbError::Decode(format!("unknown order status: {s}")))
}

impl OrderRow {
    fn into_order(self, id: Uuid) -> Result<Order, DbError> {
        let account_id = self
            .account_id
            .map(|v| {
                Uuid::parse_str(&v)
                    .map_err(|e| DbError::Decode(format!("invalid account UUID: {e}")))
            })
            .transpose()?;
        let items: Vec<OrderItem> = serde_json::from_value(self.items)
            .map_err(|e| DbError::Decode(format!("invalid order items: {e}")))?;
        let method = FulfilmentMethod::parse(&self.method)
            .ok_or_else(|| DbError::Decode(format!("unknown method: {}", self.method)))?;
        let payment_method = PaymentMethod::parse(&self.payment_method).ok_or_else(|| {
            DbError::Decode(format!("unknown payment method: {}", self.payment_method))
        })?;

        Ok(Order {
            id,
            account_id,
            items,
            subtotal: self.subtotal,
            delivery_fee: self.delivery_fee,
            total: self.total,
            customer: CustomerDetails {
                name: self.customer_name,
                phone: self.customer_phone,
                city: self.city,
                district: self.district,
                landmark: self.landmark,
                method,
                pickup_time: self.pickup_time,
            },
            payment_method,
            status: parse_status(&self.status)?,
            created_at: self.created_at,
        })
    }
}

impl OrderRowWithId {
    fn try_into_order(self) -> Result<Order, DbError> {
        let id = Uuid::parse_str(&self.record_id)
            .map_err(|e| DbError::Decode(format!("invalid UUID: {e}")))?;
        OrderRow {
            account_id: self.account_id,
            items: self.items,
            subtotal: self.subtotal,
            delivery_fee: self.delivery_fee,
            total: self.total,
            customer_name: self.customer_name,
            customer_phone: self.customer_phone,
            city: self.city,
            district: self.district,
            landmark: self.landmark,
            method: self.method,
            pickup_time: self.pickup_time,
            payment_method: self.payment_method,
            status: self.status,
            created_at: self.created_at,
        }
        .into_order(id)
    }
}

/// SurrealDB implementation of the Order repository.
#[derive(Clone)]
pub struct SurrealOrderRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealOrderRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> OrderRepository for SurrealOrderRepository<C> {
    async fn create(&self, input: CreateOrder) -> GmResult<Order> {
        let id = Uuid::new_v4();
        let id_str = id.to_string();
        let (Some(subtotal), Some(total)) = (input.subtotal(), input.total()) else {
            return Err(GmError::validation("order total is out of range"));
        };
        let items = serde_json::to_value(&input.items)
            .map_err(|e| DbError::Query(format!("cannot encode order items: {e}")))?;

        let result = self
            .db
            .query(
                "CREATE type::record('customer_order', $id) SET \
                 account_id = $account_id, items = $items, \
                 subtotal = $subtotal, delivery_fee = $delivery_fee, \
                 total = $total, \
                 customer_name = $customer_name, \
                 customer_phone = $customer_phone, \
                 city = $city, district = $district, \
                 landmark = $landmark, method = $method, \
                 pickup_time = $pickup_time, \
                 payment_method = $payment_method, \
                 status = $status",
            )
            .bind(("id", id_str.clone()))
            .bind(("account_id", input.account_id.map(|v| v.to_string())))
            .bind(("items", items))
            .bind(("subtotal", subtotal))
            .bind(("delivery_fee", input.delivery_fee))
            .bind(("total", total))
            .bind(("customer_name", input.customer.name))
            .bind(("customer_phone", input.customer.phone))
            .bind(("city", input.customer.city))
            .bind(("district", input.customer.district))
            .bind(("landmark", input.customer.landmark))
            .bind(("method", input.customer.method.as_str().to_string()))
            .bind(("pickup_time", input.customer.pickup_time))
            .bind(("payment_method", input.payment_method.as_str().to_string()))
            .bind(("status", OrderStatus::Pending.as_str().to_string()))
            .await
            .map_err(DbError::from)?;

        let mut result = result
            .check()
            .map_err(|e| DbError::from_statement("order", e.to_string()))?;

        let rows: Vec<OrderRow> = result.take(0).map_err(DbError::from)?;
        let row = rows
            .into_iter()
            .next()
            .ok_or_else(|| DbError::not_found("order", id_str))?;

        Ok(row.into_order(id)?)
    }

    async fn get_by_id(&self, id: Uuid) -> GmResult<Order> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query("SELECT * FROM type::record('customer_order', $id)")
            .bind(("id", id_str.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<OrderRow> = result.take(0).map_err(DbError::from)?;
        let row = rows
            .into_iter()
            .next()
            .ok_or_else(|| DbError::not_found("order", id_str))?;

        Ok(row.into_order(id)?)
    }

    async fn list(&self) -> GmResult<Vec<Order>> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM customer_order \
                 ORDER BY created_at DESC",
            )
            .await
            .map_err(DbError::from)?;

        let rows: Vec<OrderRowWithId> = result.take(0).map_err(DbError::from)?;
        let items = rows
            .into_iter()
            .map(|row| row.try_into_order())
            .collect::<Result<Vec<_>, DbError>>()?;
        Ok(items)
    }

    async fn list_by_account(&self, account_id: Uuid) -> GmResult<Vec<Order>> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM customer_order \
                 WHERE account_id = $account_id \
                 ORDER BY created_at DESC",
            )
            .bind(("account_id", account_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<OrderRowWithId> = result.take(0).map_err(DbError::from)?;
        let items = rows
            .into_iter()
            .map(|row| row.try_into_order())
            .collect::<Result<Vec<_>, DbError>>()?;
        Ok(items)
    }

    async fn update_status_if(
        &self,
        id: Uuid,
        from: OrderStatus,
        to: OrderStatus,
    ) -> GmResult<Order> {
        let mut result = self
            .db
            .query(
                "UPDATE type::record('customer_order', $id) SET \
                 status = $to WHERE status = $from",
            )
            .bind(("id", id.to_string()))
            .bind(("from", from.as_str().to_string()))
            .bind(("to", to.as_str().to_string()))
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(|e| DbError::from_statement("order", e.to_string()))?;

        let rows: Vec<OrderRow> = result.take(0).map_err(DbError::from)?;
        if let Some(row) = rows.into_iter().next() {
            return Ok(row.into_order(id)?);
        }

        let current = self.get_by_id(id).await?;
        Err(GmError::conflict(format!(
            "order is {}, expected {}",
            current.status.as_str(),
            from.as_str()
        )))
    }
}
