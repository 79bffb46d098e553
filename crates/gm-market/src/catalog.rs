//! Product catalog: platform listings, vendor submissions, moderation.

use gm_core::error::{GmError, GmResult};
use gm_core::models::product::{Category, CreateProduct, Product, ProductStatus, UpdateProduct};
use gm_core::repository::{AccountRepository, ProductRepository};
use tracing::{info, warn};
use uuid::Uuid;

use crate::guard;
use crate::notification;

/// Product fields supplied by whoever lists it.
#[derive(Debug, Clone)]
pub struct ProductDraft {
    pub name: String,
    pub local_name: Option<String>,
    pub scientific_name: Option<String>,
    pub description: String,
    pub price: u64,
    pub stock: u32,
    pub category: Category,
}

impl ProductDraft {
    fn into_create(
        self,
        status: ProductStatus,
        vendor_id: Option<Uuid>,
        vendor_name: Option<String>,
    ) -> GmResult<CreateProduct> {
        let input = CreateProduct {
            name: self.name.trim().to_string(),
            local_name: self.local_name,
            scientific_name: self.scientific_name,
            description: self.description,
            price: self.price,
            stock: self.stock,
            category: self.category,
            status,
            vendor_id,
            vendor_name,
        };
        input.validate().map_err(GmError::validation)?;
        Ok(input)
    }
}

/// Total stock value in minor units, saturating at `u64::MAX`.
pub fn inventory_value(products: &[Product]) -> u64 {
    products
        .iter()
        .map(|p| p.price.saturating_mul(u64::from(p.stock)))
        .fold(0, u64::saturating_add)
}

pub struct CatalogService<P: ProductRepository, A: AccountRepository> {
    product_repo: P,
    account_repo: A,
}

impl<P: ProductRepository, A: AccountRepository> CatalogService<P, A> {
    pub fn new(product_repo: P, account_repo: A) -> Self {
        Self {
            product_repo,
            account_repo,
        }
    }

    /// Platform listing; public and active immediately.
    pub async fn create_platform_product(
        &self,
        actor: Uuid,
        draft: ProductDraft,
    ) -> GmResult<Product> {
        guard::require_admin(&self.account_repo, actor, "list platform products").await?;
        let input = draft.into_create(ProductStatus::Active, None, None)?;
        let product = self.product_repo.create(input).await?;
        info!(product_id = %product.id, "platform product listed");
        Ok(product)
    }

    /// Vendor listing; premium and held for moderation.
    pub async fn submit_vendor_product(
        &self,
        actor: Uuid,
        draft: ProductDraft,
    ) -> GmResult<Product> {
        let vendor = self.account_repo.get_by_id(actor).await?;
        if !vendor.is_active_vendor() {
            return Err(GmError::permission_denied(
                "only active vendors can submit products",
            ));
        }

        let input = draft.into_create(ProductStatus::Pending, Some(vendor.id), Some(vendor.name))?;
        let product = self.product_repo.create(input).await?;
        info!(product_id = %product.id, vendor_id = %actor, "vendor product submitted");
        Ok(product)
    }

    /// Owners may edit their own listings, which sends them back to
    /// moderation; only administrators may set the status.
    pub async fn update_product(
        &self,
        actor: Uuid,
        product_id: Uuid,
        mut input: UpdateProduct,
    ) -> GmResult<Product> {
        let product = self.product_repo.get_by_id(product_id).await?;

        if !product.is_owned_by(actor) {
            guard::require_admin(&self.account_repo, actor, "edit other listings").await?;
        } else if input.status.is_some() {
            return Err(GmError::permission_denied(
                "vendors cannot moderate their own products",
            ));
        } else {
            input.status = Some(ProductStatus::Pending);
        }

        input.validate().map_err(GmError::validation)?;
        self.product_repo.update(product_id, input).await
    }

    pub async fn delete_product(&self, actor: Uuid, product_id: Uuid) -> GmResult<()> {
        let product = self.product_repo.get_by_id(product_id).await?;
        if !product.is_owned_by(actor) {
            guard::require_admin(&self.account_repo, actor, "delete other listings").await?;
        }
        self.product_repo.delete(product_id).await?;
        info!(%product_id, deleted_by = %actor, "product deleted");
        Ok(())
    }

    /// Approve or reject a listing and tell its vendor.
    pub async fn moderate_product(
        &self,
        actor: Uuid,
        product_id: Uuid,
        approve: bool,
    ) -> GmResult<Product> {
        guard::require_admin(&self.account_repo, actor, "moderate products").await?;

        let status = if approve {
            ProductStatus::Active
        } else {
            ProductStatus::Rejected
        };
        let product = self
            .product_repo
            .update(
                product_id,
                UpdateProduct {
                    status: Some(status),
                    ..Default::default()
                },
            )
            .await?;

        if let Some(vendor_id) = product.vendor_id {
            let text = if approve {
                format!("Votre produit « {} » a été approuvé et est en ligne.", product.name)
            } else {
                format!("Votre produit « {} » a été refusé par la modération.", product.name)
            };
            match self
                .account_repo
                .update(vendor_id, notification::post(text))
                .await
            {
                Ok(_) => {}
                // The listing outlived its vendor; moderation still stands.
                Err(GmError::NotFound { .. }) => {
                    warn!(%product_id, %vendor_id, "moderated product has no vendor account");
                }
                Err(e) => return Err(e),
            }
        }

        info!(%product_id, status = status.as_str(), "product moderated");
        Ok(product)
    }

    /// What any visitor sees: active, non-premium products.
    pub async fn public_catalog(&self) -> GmResult<Vec<Product>> {
        Ok(self
            .product_repo
            .list_active()
            .await?
            .into_iter()
            .filter(|p| !p.is_premium())
            .collect())
    }

    pub async fn list_all(&self, actor: Uuid) -> GmResult<Vec<Product>> {
        guard::require_admin(&self.account_repo, actor, "list every product").await?;
        self.product_repo.list().await
    }

    /// The caller's own listings, in every status.
    pub async fn vendor_inventory(&self, actor: Uuid) -> GmResult<Vec<Product>> {
        self.product_repo.list_by_vendor(actor).await
    }
}
