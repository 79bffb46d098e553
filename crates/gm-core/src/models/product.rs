//! Product (plant) domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::MAX_AMOUNT;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Category {
    Interieur,
    Jardin,
    Ombre,
    Soleil,
    Arbre,
    Potager,
    Medicinale,
    Fruitier,
    Cactus,
    Palmier,
    Arbuste,
}

impl Category {
    pub const ALL: [Category; 11] = [
        Category::Interieur,
        Category::Jardin,
        Category::Ombre,
        Category::Soleil,
        Category::Arbre,
        Category::Potager,
        Category::Medicinale,
        Category::Fruitier,
        Category::Cactus,
        Category::Palmier,
        Category::Arbuste,
    ];

    /// Display label, as shown in the storefront.
    pub fn label(&self) -> &'static str {
        match self {
            Category::Interieur => "Intérieur",
            Category::Jardin => "Jardin",
            Category::Ombre => "Ombre",
            Category::Soleil => "Soleil",
            Category::Arbre => "Arbre",
            Category::Potager => "Potager",
            Category::Medicinale => "Médicinale",
            Category::Fruitier => "Fruitier",
            Category::Cactus => "Cactus",
            Category::Palmier => "Palmier",
            Category::Arbuste => "Arbuste",
        }
    }

    pub fn from_label(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.label() == s)
    }
}

/// Moderation status; only `Active` products are publicly visible.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ProductStatus {
    Pending,
    Active,
    Rejected,
}

impl ProductStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProductStatus::Pending => "pending",
            ProductStatus::Active => "active",
            ProductStatus::Rejected => "rejected",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(ProductStatus::Pending),
            "active" => Some(ProductStatus::Active),
            "rejected" => Some(ProductStatus::Rejected),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    pub id: Uuid,
    pub name: String,
    pub local_name: Option<String>,
    pub scientific_name: Option<String>,
    pub description: String,
    /// Minor currency unit (FCFA); always positive.
    pub price: u64,
    pub stock: u32,
    pub category: Category,
    pub status: ProductStatus,
    /// Owning vendor account; `None` for platform products.
    pub vendor_id: Option<Uuid>,
    pub vendor_name: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Vendor-owned products are premium; platform products never are.
    pub fn is_premium(&self) -> bool {
        self.vendor_id.is_some()
    }

    pub fn is_owned_by(&self, account_id: Uuid) -> bool {
        self.vendor_id == Some(account_id)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateProduct {
    pub name: String,
    pub local_name: Option<String>,
    pub scientific_name: Option<String>,
    pub description: String,
    pub price: u64,
    pub stock: u32,
    pub category: Category,
    pub status: ProductStatus,
    pub vendor_id: Option<Uuid>,
    pub vendor_name: Option<String>,
}

impl CreateProduct {
    /// Shared field checks for every creation path.
    pub fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("product name is required".into());
        }
        check_price(self.price)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UpdateProduct {
    pub name: Option<String>,
    pub local_name: Option<Option<String>>,
    pub scientific_name: Option<Option<String>>,
    pub description: Option<String>,
    pub price: Option<u64>,
    pub stock: Option<u32>,
    pub category: Option<Category>,
    pub status: Option<ProductStatus>,
}

impl UpdateProduct {
    pub fn validate(&self) -> Result<(), String> {
        if self.name.as_deref().is_some_and(|n| n.trim().is_empty()) {
            return Err("product name is required".into());
        }
        self.price.map_or(Ok(()), check_price)
    }
}

fn check_price(price: u64) -> Result<(), String> {
    if price == 0 {
        return Err("price must be positive".into());
    }
    if price > MAX_AMOUNT {
        return Err(format!("price must not exceed {MAX_AMOUNT}"));
    }
    Ok(())
}
