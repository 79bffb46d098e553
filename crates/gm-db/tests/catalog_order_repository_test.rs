//! Integration tests for the Product and Order repositories using
//! in-memory SurrealDB.

use gm_core::error::GmError;
use gm_core::models::order::{
    CreateOrder, CustomerDetails, FulfilmentMethod, OrderItem, OrderStatus, PaymentMethod,
};
use gm_core::models::product::{Category, CreateProduct, ProductStatus, UpdateProduct};
use gm_core::repository::{OrderRepository, ProductRepository};
use gm_db::repository::{SurrealOrderRepository, SurrealProductRepository};
use surrealdb::Surreal;
use surrealdb::engine::local::{Db, Mem};
use uuid::Uuid;

async fn setup() -> Surreal<Db> {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    gm_db::run_migrations(&db).await.unwrap();
    db
}

fn plant(name: &str, vendor_id: Option<Uuid>, status: ProductStatus) -> CreateProduct {
    CreateProduct {
        name: name.into(),
        local_name: None,
        scientific_name: Some("Ficus benjamina".into()),
        description: "En pot".into(),
        price: 3500,
        stock: 5,
        category: Category::Interieur,
        status,
        vendor_id,
        vendor_name: vendor_id.map(|_| "Awa".into()),
    }
}

fn order_for(account_id: Option<Uuid>) -> CreateOrder {
    CreateOrder {
        account_id,
        items: vec![
            OrderItem {
                product_id: Uuid::new_v4(),
                name: "Ficus".into(),
                unit_price: 3500,
                quantity: 2,
            },
            OrderItem {
                product_id: Uuid::new_v4(),
                name: "Palmier".into(),
                unit_price: 5000,
                quantity: 1,
            },
        ],
        delivery_fee: 1500,
        customer: CustomerDetails {
            name: "Mariam".into(),
            phone: "76000000".into(),
            city: "Ouagadougou".into(),
            district: "Ouaga 2000".into(),
            landmark: String::new(),
            method: FulfilmentMethod::Delivery,
            pickup_time: None,
        },
        payment_method: PaymentMethod::MobileMoney,
    }
}

// ---------------------------------------------------------------------------
// Products
// ---------------------------------------------------------------------------

#[tokio::test]
async fn create_update_delete_product() {
    let repo = SurrealProductRepository::new(setup().await);

    let product = repo
        .create(plant("Ficus", None, ProductStatus::Active))
        .await
        .unwrap();
    assert_eq!(product.category, Category::Interieur);
    assert!(!product.is_premium());

    let updated = repo
        .update(
            product.id,
            UpdateProduct {
                stock: Some(0),
                scientific_name: Some(None),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.stock, 0);
    assert!(updated.scientific_name.is_none());
    assert_eq!(updated.price, 3500);

    repo.delete(product.id).await.unwrap();
    assert!(matches!(
        repo.get_by_id(product.id).await.unwrap_err(),
        GmError::NotFound { .. }
    ));
    assert!(matches!(
        repo.delete(product.id).await.unwrap_err(),
        GmError::NotFound { .. }
    ));
}

#[tokio::test]
async fn product_listings_filter() {
    let repo = SurrealProductRepository::new(setup().await);
    let vendor = Uuid::new_v4();

    repo.create(plant("Ficus", None, ProductStatus::Active))
        .await
        .unwrap();
    repo.create(plant("Moringa", Some(vendor), ProductStatus::Active))
        .await
        .unwrap();
    repo.create(plant("Neem", Some(vendor), ProductStatus::Pending))
        .await
        .unwrap();

    assert_eq!(repo.list().await.unwrap().len(), 3);
    assert_eq!(repo.list_active().await.unwrap().len(), 2);

    let by_vendor = repo.list_by_vendor(vendor).await.unwrap();
    assert_eq!(by_vendor.len(), 2);
    assert!(by_vendor.iter().all(|p| p.vendor_id == Some(vendor)));
}

// ---------------------------------------------------------------------------
// Orders
// ---------------------------------------------------------------------------

#[tokio::test]
async fn order_totals_are_frozen_on_create() {
    let repo = SurrealOrderRepository::new(setup().await);

    let order = repo.create(order_for(None)).await.unwrap();
    assert_eq!(order.subtotal, 12000);
    assert_eq!(order.total, 13500);
    assert_eq!(order.status, OrderStatus::Pending);
    assert_eq!(order.items.len(), 2);

    let fetched = repo.get_by_id(order.id).await.unwrap();
    assert_eq!(fetched.items, order.items);
    assert_eq!(fetched.customer, order.customer);
}

#[tokio::test]
async fn out_of_range_total_is_not_written() {
    let repo = SurrealOrderRepository::new(setup().await);

    let mut input = order_for(None);
    input.items[0].unit_price = 4_000_000_000_000_000_000;
    input.items[0].quantity = 3;
    let err = repo.create(input).await.unwrap_err();
    assert!(matches!(err, GmError::Validation { .. }));
    assert!(repo.list().await.unwrap().is_empty());
}

#[tokio::test]
async fn history_is_per_account() {
    let repo = SurrealOrderRepository::new(setup().await);
    let mariam = Uuid::new_v4();

    repo.create(order_for(Some(mariam))).await.unwrap();
    repo.create(order_for(Some(mariam))).await.unwrap();
    repo.create(order_for(None)).await.unwrap();

    assert_eq!(repo.list_by_account(mariam).await.unwrap().len(), 2);
    assert_eq!(repo.list().await.unwrap().len(), 3);
}

#[tokio::test]
async fn status_update_is_guarded() {
    let repo = SurrealOrderRepository::new(setup().await);
    let order = repo.create(order_for(None)).await.unwrap();

    let confirmed = repo
        .update_status_if(order.id, OrderStatus::Pending, OrderStatus::Confirmed)
        .await
        .unwrap();
    assert_eq!(confirmed.status, OrderStatus::Confirmed);

    let err = repo
        .update_status_if(order.id, OrderStatus::Pending, OrderStatus::Cancelled)
        .await
        .unwrap_err();
    assert!(matches!(err, GmError::StateConflict { .. }), "got {err:?}");

    let err = repo
        .update_status_if(Uuid::new_v4(), OrderStatus::Pending, OrderStatus::Confirmed)
        .await
        .unwrap_err();
    assert!(matches!(err, GmError::NotFound { .. }), "got {err:?}");
}
