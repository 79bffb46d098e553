//! Checkout: freezing a cart into an order, and the order lifecycle.

use gm_core::error::{GmError, GmResult};
use gm_core::models::cart::Cart;
use gm_core::models::district::{District, find_district};
use gm_core::models::order::{
    CreateOrder, CustomerDetails, FulfilmentMethod, Order, OrderItem, OrderStatus, PaymentMethod,
};
use gm_core::models::product::ProductStatus;
use gm_core::repository::{AccountRepository, OrderRepository, ProductRepository};
use tracing::{debug, info};
use uuid::Uuid;

use crate::config::MarketConfig;
use crate::error::MarketError;
use crate::guard;

/// Client-side view of the purchase flow. Never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CheckoutPhase {
    #[default]
    Cart,
    Checkout,
    Success,
}

impl CheckoutPhase {
    /// Next phase, if the flow may move on. Leaving the cart needs at
    /// least one line; `Success` is final.
    pub fn advance(self, cart: &Cart) -> Option<CheckoutPhase> {
        match self {
            CheckoutPhase::Cart if !cart.is_empty() => Some(CheckoutPhase::Checkout),
            CheckoutPhase::Cart => None,
            CheckoutPhase::Checkout => Some(CheckoutPhase::Success),
            CheckoutPhase::Success => None,
        }
    }
}

/// Form submitted at checkout.
#[derive(Debug, Clone)]
pub struct CheckoutRequest {
    /// Signed-in customer, if any.
    pub account_id: Option<Uuid>,
    pub name: String,
    pub phone: String,
    pub method: FulfilmentMethod,
    /// Required for delivery; must be in the district table.
    pub district: Option<String>,
    /// Disambiguates district names shared between cities.
    pub city: Option<String>,
    pub landmark: String,
    /// Required for pickup.
    pub pickup_time: Option<String>,
    pub payment_method: PaymentMethod,
}

pub struct CheckoutService<P: ProductRepository, O: OrderRepository, A: AccountRepository> {
    product_repo: P,
    order_repo: O,
    account_repo: A,
    config: MarketConfig,
}

impl<P: ProductRepository, O: OrderRepository, A: AccountRepository> CheckoutService<P, O, A> {
    pub fn new(product_repo: P, order_repo: O, account_repo: A, config: MarketConfig) -> Self {
        Self {
            product_repo,
            order_repo,
            account_repo,
            config,
        }
    }

    /// Validate the form, price the cart from the catalog and persist
    /// the order. The cart is cleared only once the order is written.
    pub async fn submit_order(&self, cart: &mut Cart, request: CheckoutRequest) -> GmResult<Order> {
        // 1. Form checks.
        if cart.is_empty() {
            return Err(MarketError::EmptyCart.into());
        }
        if let Some(line) = cart.lines().iter().find(|l| l.quantity == 0) {
            return Err(MarketError::InvalidQuantity(line.product.name.clone()).into());
        }
        let mut customer = self.customer_details(&request)?;
        let delivery_fee = match customer.method {
            FulfilmentMethod::Pickup => 0,
            FulfilmentMethod::Delivery => {
                let district = self.resolve_district(&customer)?;
                if customer.city.is_empty() {
                    customer.city = district.city.clone();
                }
                district.delivery_fee
            }
        };

        // 2. Freeze lines at current catalog prices.
        let mut items = Vec::with_capacity(cart.lines().len());
        for line in cart.lines() {
            let product = self.product_repo.get_by_id(line.product.id).await?;
            if product.status != ProductStatus::Active {
                return Err(MarketError::ProductUnavailable(product.name).into());
            }
            if product.price != line.product.price {
                debug!(
                    product_id = %product.id,
                    cart_price = line.product.price,
                    price = product.price,
                    "cart price is stale, using catalog price"
                );
            }
            items.push(OrderItem {
                product_id: product.id,
                name: product.name,
                unit_price: product.price,
                quantity: line.quantity,
            });
        }
        let input = CreateOrder {
            account_id: request.account_id,
            items,
            delivery_fee,
            customer,
            payment_method: request.payment_method,
        };
        if input.total().is_none() {
            return Err(MarketError::AmountOutOfRange.into());
        }

        // 3. Persist, then clear.
        let order = self.order_repo.create(input).await?;
        cart.clear();

        info!(
            order_id = %order.id,
            total = order.total,
            method = order.customer.method.as_str(),
            "order submitted"
        );
        Ok(order)
    }

    /// Administrative status change along the order lifecycle.
    /// Setting the current non-terminal status again is a no-op.
    pub async fn set_order_status(
        &self,
        actor: Uuid,
        order_id: Uuid,
        status: OrderStatus,
    ) -> GmResult<Order> {
        guard::require_admin(&self.account_repo, actor, "change order status").await?;
        let order = self.order_repo.get_by_id(order_id).await?;

        if !order.status.can_transition_to(status) {
            return Err(MarketError::InvalidOrderTransition {
                from: order.status.as_str(),
                to: status.as_str(),
            }
            .into());
        }
        if order.status == status {
            return Ok(order);
        }

        let updated = self
            .order_repo
            .update_status_if(order_id, order.status, status)
            .await?;
        info!(
            %order_id,
            from = order.status.as_str(),
            to = status.as_str(),
            "order status changed"
        );
        Ok(updated)
    }

    /// Orders placed by one account, newest first.
    pub async fn order_history(&self, actor: Uuid, account_id: Uuid) -> GmResult<Vec<Order>> {
        guard::require_self_or_admin(&self.account_repo, actor, account_id, "read order history")
            .await?;
        self.order_repo.list_by_account(account_id).await
    }

    pub async fn list_orders(&self, actor: Uuid) -> GmResult<Vec<Order>> {
        guard::require_admin(&self.account_repo, actor, "list orders").await?;
        self.order_repo.list().await
    }

    /// Sum of every non-cancelled order total, saturating.
    pub async fn revenue(&self, actor: Uuid) -> GmResult<u64> {
        let orders = self.list_orders(actor).await?;
        Ok(orders
            .iter()
            .filter(|o| o.status != OrderStatus::Cancelled)
            .map(|o| o.total)
            .fold(0, u64::saturating_add))
    }

    /// USSD string for paying `order` by mobile money.
    pub fn payment_instructions(&self, order: &Order) -> String {
        order.payment_ussd(&self.config.ussd_merchant_number)
    }

    fn customer_details(&self, request: &CheckoutRequest) -> GmResult<CustomerDetails> {
        let name = guard::required(&request.name, "customer name")?;
        let phone = guard::required(&request.phone, "customer phone")?;

        let pickup_time = match request.method {
            FulfilmentMethod::Pickup => Some(guard::required(
                request.pickup_time.as_deref().unwrap_or_default(),
                "pickup time",
            )?),
            FulfilmentMethod::Delivery => None,
        };
        let district = match request.method {
            FulfilmentMethod::Delivery => {
                guard::required(request.district.as_deref().unwrap_or_default(), "district")?
            }
            FulfilmentMethod::Pickup => request
                .district
                .as_deref()
                .map(str::trim)
                .unwrap_or_default()
                .to_string(),
        };

        Ok(CustomerDetails {
            name,
            phone,
            city: request
                .city
                .as_deref()
                .map(str::trim)
                .unwrap_or_default()
                .to_string(),
            district,
            landmark: request.landmark.trim().to_string(),
            method: request.method,
            pickup_time,
        })
    }

    /// The customer's district in the fee table. Without a city the
    /// name alone must identify it.
    fn resolve_district(&self, customer: &CustomerDetails) -> GmResult<&District> {
        let city = Some(customer.city.as_str()).filter(|c| !c.is_empty());
        find_district(&self.config.districts, &customer.district, city)
            .ok_or_else(|| GmError::from(MarketError::UnknownDistrict(customer.district.clone())))
    }
}
