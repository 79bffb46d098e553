//! SurrealDB implementation of [`ProductRepository`].

use chrono::{DateTime, Utc};
use gm_core::error::GmResult;
use gm_core::models::product::{Category, CreateProduct, Product, ProductStatus, UpdateProduct};
use gm_core::repository::ProductRepository;
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use crate::error::DbError;

#[derive(Debug, SurrealValue)]
struct ProductRow {
    name: String,
    local_name: Option<String>,
    scientific_name: Option<String>,
    description: String,
    price: u64,
    stock: u32,
    category: String,
    status: String,
    vendor_id: Option<String>,
    vendor_name: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, SurrealValue)]
struct ProductRowWithId {
    record_id: String,
    name: String,
    local_name: Option<String>,
    scientific_name: Option<String>,
    description: String,
    price: u64,
    stock: u32,
    category: String,
    status: String,
    vendor_id: Option<String>,
    vendor_name: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

fn parse_category(s: &str) -> Result<Category, DbError> {
    Category::from_label(s).ok_or_else(|| DbError::Decode(format!("unknown category: {s}")))
}

fn parse_status(s: &str) -> Result<ProductStatus, DbError> {
    ProductStatus::parse(s).ok_or_else(|| DbError::Decode(format!("unknown product status: {s}")))
}

fn parse_vendor_id(s: Option<String>) -> Result<Option<Uuid>, DbError> {
    s.map(|v| {
        Uuid::parse_str(&v).map_err(|e| DbError::Decode(format!("invalid vendor UUID: {e}")))
    })
    .transpose()
}

impl ProductRow {
    fn into_product(self, id: Uuid) -> Result<Product, DbError> {
        Ok(Product {
            id,
            name: self.name,
            local_name: self.local_name,
            scientific_name: self.scientific_name,
            description: self.description,
            price: self.price,
            stock: self.stock,
            category: parse_category(&self.category)?,
            status: parse_status(&self.status)?,
            vendor_id: parse_vendor_id(self.vendor_id)?,
            vendor_name: self.vendor_name,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

impl ProductRowWithId {
    fn try_into_product(self) -> Result<Product, DbError> {
        let id = Uuid::parse_str(&self.record_id)
            .map_err(|e| DbError::Decode(format!("invalid UUID: {e}")))?;
        Ok(Product {
            id,
            name: self.name,
            local_name: self.local_name,
            scientific_name: self.scientific_name,
            description: self.description,
            price: self.price,
            stock: self.stock,
            category: parse_category(&self.category)?,
            status: parse_status(&self.status)?,
            vendor_id: parse_vendor_id(self.vendor_id)?,
            vendor_name: self.vendor_name,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

/// SurrealDB implementation of the Product repository.
#[derive(Clone)]
pub struct SurrealProductRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealProductRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }

    async fn select_many(
        &self,
        filter: &str,
        bind: Option<(&'static str, String)>,
    ) -> GmResult<Vec<Product>> {
        let query = format!(
            "SELECT meta::id(id) AS record_id, * FROM product {filter} \
             ORDER BY created_at ASC"
        );
        let mut builder = self.db.query(&query);
        if let Some(b) = bind {
            builder = builder.bind(b);
        }
        let mut result = builder.await.map_err(DbError::from)?;

        let rows: Vec<ProductRowWithId> = result.take(0).map_err(DbError::from)?;
        let items = rows
            .into_iter()
            .map(|row| row.try_into_product())
            .collect::<Result<Vec<_>, DbError>>()?;
        Ok(items)
    }
}

impl<C: Connection> ProductRepository for SurrealProductRepository<C> {
    async fn create(&self, input: CreateProduct) -> GmResult<Product> {
        let id = Uuid::new_v4();
        let id_str = id.to_string();
        let is_premium = input.vendor_id.is_some();

        let result = self
            .db
            .query(
                "CREATE type::record('product', $id) SET \
                 name = $name, local_name = $local_name, \
                 scientific_name = $scientific_name, \
                 description = $description, \
                 price = $price, stock = $stock, \
                 category = $category, status = $status, \
                 vendor_id = $vendor_id, vendor_name = $vendor_name, \
                 is_premium = $is_premium",
            )
            .bind(("id", id_str.clone()))
            .bind(("name", input.name))
            .bind(("local_name", input.local_name))
            .bind(("scientific_name", input.scientific_name))
            .bind(("description", input.description))
            .bind(("price", input.price))
            .bind(("stock", input.stock))
            .bind(("category", input.category.label().to_string()))
            .bind(("status", input.status.as_str().to_string()))
            .bind(("vendor_id", input.vendor_id.map(|v| v.to_string())))
            .bind(("vendor_name", input.vendor_name))
            .bind(("is_premium", is_premium))
            .await
            .map_err(DbError::from)?;

        let mut result = result
            .check()
            .map_err(|e| DbError::from_statement("product", e.to_string()))?;

        let rows: Vec<ProductRow> = result.take(0).map_err(DbError::from)?;
        let row = rows
            .into_iter()
            .next()
            .ok_or_else(|| DbError::not_found("product", id_str))?;

        Ok(row.into_product(id)?)
    }

    async fn get_by_id(&self, id: Uuid) -> GmResult<Product> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query("SELECT * FROM type::record('product', $id)")
            .bind(("id", id_str.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<ProductRow> = result.take(0).map_err(DbError::from)?;
        let row = rows
            .into_iter()
            .next()
            .ok_or_else(|| DbError::not_found("product", id_str))?;

        Ok(row.into_product(id)?)
    }

    async fn update(&self, id: Uuid, input: UpdateProduct) -> GmResult<Product> {
        let id_str = id.to_string();

        let mut sets = Vec::new();
        if input.name.is_some() {
            sets.push("name = $name");
        }
        if input.local_name.is_some() {
            sets.push("local_name = $local_name");
        }
        if input.scientific_name.is_some() {
            sets.push("scientific_name = $scientific_name");
        }
        if input.description.is_some() {
            sets.push("description = $description");
        }
        if input.price.is_some() {
            sets.push("price = $price");
        }
        if input.stock.is_some() {
            sets.push("stock = $stock");
        }
        if input.category.is_some() {
            sets.push("category = $category");
        }
        if input.status.is_some() {
            sets.push("status = $status");
        }
        sets.push("updated_at = time::now()");

        let query = format!(
            "UPDATE type::record('product', $id) SET {}",
            sets.join(", ")
        );

        let mut builder = self.db.query(&query).bind(("id", id_str.clone()));

        if let Some(name) = input.name {
            builder = builder.bind(("name", name));
        }
        if let Some(local_name) = input.local_name {
            builder = builder.bind(("local_name", local_name));
        }
        if let Some(scientific_name) = input.scientific_name {
            builder = builder.bind(("scientific_name", scientific_name));
        }
        if let Some(description) = input.description {
            builder = builder.bind(("description", description));
        }
        if let Some(price) = input.price {
            builder = builder.bind(("price", price));
        }
        if let Some(stock) = input.stock {
            builder = builder.bind(("stock", stock));
        }
        if let Some(category) = input.category {
            builder = builder.bind(("category", category.label().to_string()));
        }
        if let Some(status) = input.status {
            builder = builder.bind(("status", status.as_str().to_string()));
        }

        let result = builder.await.map_err(DbError::from)?;
        let mut result = result
            .check()
            .map_err(|e| DbError::from_statement("product", e.to_string()))?;

        let rows: Vec<ProductRow> = result.take(0).map_err(DbError::from)?;
        let row = rows
            .into_iter()
            .next()
            .ok_or_else(|| DbError::not_found("product", id_str))?;

        Ok(row.into_product(id)?)
    }

    async fn delete(&self, id: Uuid) -> GmResult<()> {
        // Confirm existence so a stale id reports NotFound.
        self.get_by_id(id).await?;

        self.db
            .query("DELETE type::record('product', $id)")
            .bind(("id", id.to_string()))
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(|e| DbError::Query(e.to_string()))?;

        Ok(())
    }

    async fn list(&self) -> GmResult<Vec<Product>> {
        self.select_many("", None).await
    }

    async fn list_active(&self) -> GmResult<Vec<Product>> {
        self.select_many(
            "WHERE status = $status",
            Some(("status", ProductStatus::Active.as_str().to_string())),
        )
        .await
    }

    async fn list_by_vendor(&self, vendor_id: Uuid) -> GmResult<Vec<Product>> {
        self.select_many(
            "WHERE vendor_id = $vendor_id",
            Some(("vendor_id", vendor_id.to_string())),
        )
        .await
    }
}
