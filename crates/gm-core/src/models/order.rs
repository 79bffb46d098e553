//! Order domain model and its fulfilment lifecycle.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::MAX_AMOUNT;

/// Persisted order status.
///
/// `En attente → Validée → Livrée`, with `Annulée` reachable from any
/// non-terminal state. `Livrée` and `Annulée` are terminal.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum OrderStatus {
    Pending,
    Confirmed,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "En attente",
            OrderStatus::Confirmed => "Validée",
            OrderStatus::Delivered => "Livrée",
            OrderStatus::Cancelled => "Annulée",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "En attente" => Some(OrderStatus::Pending),
            "Validée" => Some(OrderStatus::Confirmed),
            "Livrée" => Some(OrderStatus::Delivered),
            "Annulée" => Some(OrderStatus::Cancelled),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Delivered | OrderStatus::Cancelled)
    }

    /// `{Pending, Confirmed} → {Confirmed, Delivered, Cancelled}`.
    pub fn can_transition_to(&self, next: OrderStatus) -> bool {
        !self.is_terminal() && next != OrderStatus::Pending
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum FulfilmentMethod {
    Delivery,
    Pickup,
}

impl FulfilmentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            FulfilmentMethod::Delivery => "Livraison",
            FulfilmentMethod::Pickup => "Retrait",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Livraison" => Some(FulfilmentMethod::Delivery),
            "Retrait" => Some(FulfilmentMethod::Pickup),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum PaymentMethod {
    MobileMoney,
    CashOnDelivery,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::MobileMoney => "Mobile Money",
            PaymentMethod::CashOnDelivery => "Paiement à la livraison",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Mobile Money" => Some(PaymentMethod::MobileMoney),
            "Paiement à la livraison" => Some(PaymentMethod::CashOnDelivery),
            _ => None,
        }
    }
}

/// One frozen line of an order, priced at submission time.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct OrderItem {
    pub product_id: Uuid,
    pub name: String,
    pub unit_price: u64,
    pub quantity: u32,
}

impl OrderItem {
    /// `None` past [`MAX_AMOUNT`].
    pub fn line_total(&self) -> Option<u64> {
        self.unit_price
            .checked_mul(u64::from(self.quantity))
            .filter(|t| *t <= MAX_AMOUNT)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CustomerDetails {
    pub name: String,
    pub phone: String,
    pub city: String,
    pub district: String,
    pub landmark: String,
    pub method: FulfilmentMethod,
    pub pickup_time: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: Uuid,
    pub account_id: Option<Uuid>,
    pub items: Vec<OrderItem>,
    pub subtotal: u64,
    pub delivery_fee: u64,
    pub total: u64,
    pub customer: CustomerDetails,
    pub payment_method: PaymentMethod,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
}

impl Order {
    /// USSD string the customer dials to pay the order by mobile money.
    pub fn payment_ussd(&self, merchant_number: &str) -> String {
        format!("*144*2*1*{merchant_number}*{}#", self.total)
    }
}

/// Everything needed to persist a new order. Items and totals are
/// immutable once written; the repository only lets `status` change.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateOrder {
    pub account_id: Option<Uuid>,
    pub items: Vec<OrderItem>,
    pub delivery_fee: u64,
    pub customer: CustomerDetails,
    pub payment_method: PaymentMethod,
}

impl CreateOrder {
    /// Sum of line totals, or `None` if it would exceed [`MAX_AMOUNT`].
    pub fn subtotal(&self) -> Option<u64> {
        self.items
            .iter()
            .try_fold(0u64, |acc, item| acc.checked_add(item.line_total()?))
            .filter(|t| *t <= MAX_AMOUNT)
    }

    pub fn total(&self) -> Option<u64> {
        self.subtotal()?
            .checked_add(self.delivery_fee)
            .filter(|t| *t <= MAX_AMOUNT)
    }
}
