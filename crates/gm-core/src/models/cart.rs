//! Client-owned shopping cart.
//!
//! The cart is never persisted authoritatively; it is frozen into an
//! [`Order`](super::order::Order) at checkout.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::product::Product;

/// The part of a product the cart needs to display and price a line.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProductSnapshot {
    pub id: Uuid,
    pub name: String,
    pub price: u64,
}

impl From<&Product> for ProductSnapshot {
    fn from(p: &Product) -> Self {
        Self {
            id: p.id,
            name: p.name.clone(),
            price: p.price,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CartLine {
    pub product: ProductSnapshot,
    /// At least 1 when built through [`Cart`]; a deserialized cart is
    /// checked again at checkout.
    pub quantity: u32,
}

impl CartLine {
    pub fn line_total(&self) -> u64 {
        self.product.price.saturating_mul(u64::from(self.quantity))
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Cart {
    lines: Vec<CartLine>,
}

impl Cart {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Add one unit; an existing line is incremented instead of duplicated.
    pub fn add(&mut self, product: impl Into<ProductSnapshot>) {
        let product = product.into();
        match self.lines.iter_mut().find(|l| l.product.id == product.id) {
            Some(line) => line.quantity += 1,
            None => self.lines.push(CartLine {
                product,
                quantity: 1,
            }),
        }
    }

    /// Shift a line's quantity by `delta`, never below 1.
    pub fn update_quantity(&mut self, product_id: Uuid, delta: i32) {
        if let Some(line) = self.lines.iter_mut().find(|l| l.product.id == product_id) {
            let next = i64::from(line.quantity) + i64::from(delta);
            line.quantity = next.clamp(1, i64::from(u32::MAX)) as u32;
        }
    }

    /// Set an exact quantity. Zero is refused; use [`Cart::remove`].
    pub fn set_quantity(&mut self, product_id: Uuid, quantity: u32) -> Result<(), String> {
        if quantity == 0 {
            return Err("quantity must be at least 1".into());
        }
        let line = self
            .lines
            .iter_mut()
            .find(|l| l.product.id == product_id)
            .ok_or_else(|| format!("product {product_id} is not in the cart"))?;
        line.quantity = quantity;
        Ok(())
    }

    pub fn remove(&mut self, product_id: Uuid) {
        self.lines.retain(|l| l.product.id != product_id);
    }

    pub fn clear(&mut self) {
        self.lines.clear();
    }

    /// Sum of snapshot prices times quantities, saturating. Display
    /// only; checkout reprices from the catalog.
    pub fn subtotal(&self) -> u64 {
        self.lines
            .iter()
            .map(CartLine::line_total)
            .fold(0, u64::saturating_add)
    }

    /// Number of units, as shown on the cart badge.
    pub fn item_count(&self) -> u64 {
        self.lines
            .iter()
            .map(|l| u64::from(l.quantity))
            .fold(0, u64::saturating_add)
    }
}
