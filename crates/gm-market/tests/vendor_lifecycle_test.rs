//! Integration tests for the vendor lifecycle and access codes.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use gm_core::error::{GmError, GmResult};
use gm_core::models::account::{Account, CreateAccount, Role, UpdateAccount, VendorStatus};
use gm_core::models::product::Category;
use gm_core::repository::AccountRepository;
use gm_db::repository::{SurrealAccountRepository, SurrealProductRepository};
use gm_market::{
    CatalogService, CodeGenerator, MarketConfig, ProductDraft, RandomCodeGenerator, VendorService,
};
use surrealdb::Surreal;
use surrealdb::engine::local::{Db, Mem};
use uuid::Uuid;

type Accounts = SurrealAccountRepository<Db>;

/// Hands out a fixed list of codes, then repeats the last one.
struct ScriptedCodes(Mutex<VecDeque<String>>);

impl ScriptedCodes {
    fn new(codes: &[&str]) -> Self {
        Self(Mutex::new(codes.iter().map(|c| c.to_string()).collect()))
    }
}

impl CodeGenerator for ScriptedCodes {
    fn generate(&self) -> String {
        let mut queue = self.0.lock().unwrap();
        if queue.len() > 1 {
            queue.pop_front().unwrap()
        } else {
            queue.front().cloned().unwrap()
        }
    }
}

/// Gives the first code written by a guarded update to `rival` just
/// before the write lands, as a concurrent approval would.
#[derive(Clone)]
struct RacingAccounts {
    inner: Accounts,
    rival: Uuid,
    raced: Arc<AtomicBool>,
}

impl AccountRepository for RacingAccounts {
    async fn create(&self, input: CreateAccount) -> GmResult<Account> {
        self.inner.create(input).await
    }

    async fn get_by_id(&self, id: Uuid) -> GmResult<Account> {
        self.inner.get_by_id(id).await
    }

    async fn get_by_phone(&self, phone: &str) -> GmResult<Account> {
        self.inner.get_by_phone(phone).await
    }

    async fn get_by_vendor_code(&self, code: &str) -> GmResult<Account> {
        self.inner.get_by_vendor_code(code).await
    }

    async fn get_by_revoked_code(&self, code: &str) -> GmResult<Account> {
        self.inner.get_by_revoked_code(code).await
    }

    async fn update(&self, id: Uuid, input: UpdateAccount) -> GmResult<Account> {
        self.inner.update(id, input).await
    }

    async fn update_if_vendor_status(
        &self,
        id: Uuid,
        expected: &[VendorStatus],
        input: UpdateAccount,
    ) -> GmResult<Account> {
        if let Some(Some(code)) = &input.vendor_code {
            if !self.raced.swap(true, Ordering::SeqCst) {
                self.inner
                    .update(
                        self.rival,
                        UpdateAccount {
                            vendor_status: Some(VendorStatus::Active),
                            vendor_code: Some(Some(code.clone())),
                            ..Default::default()
                        },
                    )
                    .await?;
            }
        }
        self.inner.update_if_vendor_status(id, expected, input).await
    }

    async fn list(&self) -> GmResult<Vec<Account>> {
        self.inner.list().await
    }

    async fn list_by_vendor_status(&self, status: VendorStatus) -> GmResult<Vec<Account>> {
        self.inner.list_by_vendor_status(status).await
    }

    async fn delete_all(&self) -> GmResult<u64> {
        self.inner.delete_all().await
    }
}

async fn setup() -> Surreal<Db> {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    gm_db::run_migrations(&db).await.unwrap();
    db
}

async fn account(repo: &Accounts, name: &str, phone: &str) -> Account {
    repo.create(CreateAccount {
        name: name.into(),
        phone: phone.into(),
        email: None,
    })
    .await
    .unwrap()
}

async fn admin(repo: &Accounts) -> Account {
    let admin = account(repo, "Admin", "70000000").await;
    repo.update(
        admin.id,
        UpdateAccount {
            role: Some(Role::Manager),
            ..Default::default()
        },
    )
    .await
    .unwrap()
}

fn draft(name: &str, price: u64) -> ProductDraft {
    ProductDraft {
        name: name.into(),
        local_name: None,
        scientific_name: None,
        description: "Plante de pépinière".into(),
        price,
        stock: 10,
        category: Category::Medicinale,
    }
}

fn vendors(repo: &Accounts) -> VendorService<Accounts> {
    VendorService::new(repo.clone(), RandomCodeGenerator, MarketConfig::default())
}

#[tokio::test]
async fn approve_code_unlock_then_reject() {
    let db = setup().await;
    let repo = SurrealAccountRepository::new(db.clone());
    let products = SurrealProductRepository::new(db);
    let admin = admin(&repo).await;
    let vendor = account(&repo, "Awa Pépinière", "70000001").await;
    let service = vendors(&repo);
    let catalog = CatalogService::new(products.clone(), repo.clone());

    let pending = service
        .request_vendor_access(vendor.id, vendor.id)
        .await
        .unwrap();
    assert_eq!(pending.vendor_status, VendorStatus::Pending);
    assert!(pending.vendor_code.is_none());

    let active = service
        .approve_vendor(admin.id, vendor.id, "Bienvenue")
        .await
        .unwrap();
    assert_eq!(active.vendor_status, VendorStatus::Active);
    assert_eq!(active.role, Role::Vendor);
    assert_eq!(active.admin_message.as_deref(), Some("Bienvenue"));
    let code = active.vendor_code.clone().unwrap();
    assert_eq!(code.len(), 6);
    assert!(code.chars().all(|c| c.is_ascii_uppercase() || c.is_ascii_digit()));

    // One moderated listing, one still pending.
    let listed = catalog
        .submit_vendor_product(vendor.id, draft("Moringa", 3500))
        .await
        .unwrap();
    catalog
        .moderate_product(admin.id, listed.id, true)
        .await
        .unwrap();
    catalog
        .submit_vendor_product(vendor.id, draft("Neem", 2000))
        .await
        .unwrap();

    let unlocked = service
        .authorizer()
        .unlock_vendor_catalog(&products, &code.to_lowercase())
        .await
        .unwrap();
    assert_eq!(unlocked.vendor.vendor_id, vendor.id);
    assert_eq!(unlocked.vendor.vendor_name, "Awa Pépinière");
    assert_eq!(unlocked.products.len(), 1);
    assert_eq!(unlocked.products[0].id, listed.id);
    assert_eq!(unlocked.products[0].vendor_id, Some(vendor.id));

    let rejected = service
        .reject_vendor(admin.id, vendor.id, "Catalogue non conforme")
        .await
        .unwrap();
    assert_eq!(rejected.vendor_status, VendorStatus::Rejected);
    assert!(rejected.vendor_code.is_none());
    assert_eq!(rejected.role, Role::Client);

    let err = service.authorizer().resolve_code(&code).await.unwrap_err();
    assert!(matches!(err, GmError::VendorInactive), "got {err:?}");
}

#[tokio::test]
async fn request_is_idempotent_while_pending() {
    let db = setup().await;
    let repo = SurrealAccountRepository::new(db);
    let client = account(&repo, "Issa", "70000002").await;
    let service = vendors(&repo);

    let first = service
        .request_vendor_access(client.id, client.id)
        .await
        .unwrap();
    let second = service
        .request_vendor_access(client.id, client.id)
        .await
        .unwrap();

    assert_eq!(second.vendor_status, VendorStatus::Pending);
    assert_eq!(
        first.vendor_application_date,
        second.vendor_application_date
    );
}

#[tokio::test]
async fn rejected_vendor_can_reapply() {
    let db = setup().await;
    let repo = SurrealAccountRepository::new(db);
    let admin = admin(&repo).await;
    let client = account(&repo, "Issa", "70000002").await;
    let service = vendors(&repo);

    service
        .request_vendor_access(client.id, client.id)
        .await
        .unwrap();
    service
        .reject_vendor(admin.id, client.id, "Dossier incomplet")
        .await
        .unwrap();

    let again = service
        .request_vendor_access(client.id, client.id)
        .await
        .unwrap();
    assert_eq!(again.vendor_status, VendorStatus::Pending);
}

#[tokio::test]
async fn active_vendor_cannot_reapply() {
    let db = setup().await;
    let repo = SurrealAccountRepository::new(db);
    let admin = admin(&repo).await;
    let client = account(&repo, "Issa", "70000002").await;
    let service = vendors(&repo);

    service.direct_activate(admin.id, client.id).await.unwrap();
    let err = service
        .request_vendor_access(client.id, client.id)
        .await
        .unwrap_err();
    assert!(matches!(err, GmError::StateConflict { .. }));
}

#[tokio::test]
async fn request_for_missing_account_is_not_found() {
    let db = setup().await;
    let repo = SurrealAccountRepository::new(db);
    let service = vendors(&repo);
    let ghost = Uuid::new_v4();

    let err = service
        .request_vendor_access(ghost, ghost)
        .await
        .unwrap_err();
    assert!(matches!(err, GmError::NotFound { .. }));
}

#[tokio::test]
async fn approve_requires_pending_and_leaves_state_alone() {
    let db = setup().await;
    let repo = SurrealAccountRepository::new(db);
    let admin = admin(&repo).await;
    let client = account(&repo, "Issa", "70000002").await;
    let service = vendors(&repo);

    let err = service
        .approve_vendor(admin.id, client.id, "Bienvenue")
        .await
        .unwrap_err();
    assert!(matches!(err, GmError::StateConflict { .. }));

    let unchanged = repo.get_by_id(client.id).await.unwrap();
    assert_eq!(unchanged.vendor_status, VendorStatus::None);
    assert!(unchanged.vendor_code.is_none());
    assert!(unchanged.admin_message.is_none());
}

#[tokio::test]
async fn approve_needs_admin_and_message() {
    let db = setup().await;
    let repo = SurrealAccountRepository::new(db);
    let admin = admin(&repo).await;
    let client = account(&repo, "Issa", "70000002").await;
    let other = account(&repo, "Fati", "70000003").await;
    let service = vendors(&repo);
    service
        .request_vendor_access(client.id, client.id)
        .await
        .unwrap();

    let err = service
        .approve_vendor(other.id, client.id, "Bienvenue")
        .await
        .unwrap_err();
    assert!(matches!(err, GmError::PermissionDenied { .. }));

    let err = service
        .approve_vendor(admin.id, client.id, "   ")
        .await
        .unwrap_err();
    assert!(matches!(err, GmError::Validation { .. }));

    let still = repo.get_by_id(client.id).await.unwrap();
    assert_eq!(still.vendor_status, VendorStatus::Pending);
}

#[tokio::test]
async fn approval_message_can_embed_the_code() {
    let db = setup().await;
    let repo = SurrealAccountRepository::new(db);
    let admin = admin(&repo).await;
    let client = account(&repo, "Issa", "70000002").await;
    let service = VendorService::new(
        repo.clone(),
        ScriptedCodes::new(&["K7P2QX"]),
        MarketConfig::default(),
    );
    service
        .request_vendor_access(client.id, client.id)
        .await
        .unwrap();

    let active = service
        .approve_vendor(admin.id, client.id, "Votre code : {code}")
        .await
        .unwrap();
    assert_eq!(active.admin_message.as_deref(), Some("Votre code : K7P2QX"));
}

#[tokio::test]
async fn minting_retries_past_taken_codes() {
    let db = setup().await;
    let repo = SurrealAccountRepository::new(db);
    let admin = admin(&repo).await;
    let first = account(&repo, "Awa", "70000001").await;
    let second = account(&repo, "Issa", "70000002").await;
    let service = VendorService::new(
        repo.clone(),
        ScriptedCodes::new(&["AAAAAA", "AAAAAA", "BBBBBB"]),
        MarketConfig::default(),
    );

    let a = service.direct_activate(admin.id, first.id).await.unwrap();
    let b = service.direct_activate(admin.id, second.id).await.unwrap();

    assert_eq!(a.vendor_code.as_deref(), Some("AAAAAA"));
    assert_eq!(b.vendor_code.as_deref(), Some("BBBBBB"));
}

#[tokio::test]
async fn code_claimed_between_mint_and_write_is_reminted() {
    let db = setup().await;
    let repo = SurrealAccountRepository::new(db);
    let admin = admin(&repo).await;
    let rival = account(&repo, "Awa", "70000001").await;
    let target = account(&repo, "Issa", "70000002").await;
    let racing = RacingAccounts {
        inner: repo.clone(),
        rival: rival.id,
        raced: Arc::new(AtomicBool::new(false)),
    };
    let service = VendorService::new(
        racing.clone(),
        ScriptedCodes::new(&["RACE11", "SAFE22"]),
        MarketConfig::default(),
    );

    let activated = service.direct_activate(admin.id, target.id).await.unwrap();

    assert!(racing.raced.load(Ordering::SeqCst));
    assert_eq!(activated.vendor_code.as_deref(), Some("SAFE22"));
    assert!(activated.admin_message.unwrap().contains("SAFE22"));
    let rival = repo.get_by_id(rival.id).await.unwrap();
    assert_eq!(rival.vendor_code.as_deref(), Some("RACE11"));
}

#[tokio::test]
async fn minting_gives_up_when_every_draw_collides() {
    let db = setup().await;
    let repo = SurrealAccountRepository::new(db);
    let admin = admin(&repo).await;
    let first = account(&repo, "Awa", "70000001").await;
    let second = account(&repo, "Issa", "70000002").await;
    let config = MarketConfig {
        max_code_attempts: 3,
        ..MarketConfig::default()
    };
    let service = VendorService::new(repo.clone(), ScriptedCodes::new(&["AAAAAA"]), config);

    service.direct_activate(admin.id, first.id).await.unwrap();
    let err = service
        .direct_activate(admin.id, second.id)
        .await
        .unwrap_err();
    assert!(matches!(err, GmError::StateConflict { .. }));

    let untouched = repo.get_by_id(second.id).await.unwrap();
    assert_eq!(untouched.vendor_status, VendorStatus::None);
}

#[tokio::test]
async fn direct_activation_posts_default_message() {
    let db = setup().await;
    let repo = SurrealAccountRepository::new(db);
    let admin = admin(&repo).await;
    let client = account(&repo, "Issa", "70000002").await;
    let service = vendors(&repo);

    let active = service.direct_activate(admin.id, client.id).await.unwrap();
    let code = active.vendor_code.clone().unwrap();
    assert!(active.is_vendor);
    assert_eq!(active.vendor_status, VendorStatus::Active);
    assert!(active.admin_message.unwrap().contains(&code));
    assert!(active.vendor_application_date.is_some());
    assert!(active.vendor_approval_date.is_some());

    let err = service
        .direct_activate(admin.id, client.id)
        .await
        .unwrap_err();
    assert!(matches!(err, GmError::StateConflict { .. }));
}

#[tokio::test]
async fn admin_keeps_role_when_activated() {
    let db = setup().await;
    let repo = SurrealAccountRepository::new(db);
    let admin = admin(&repo).await;
    let service = vendors(&repo);

    let active = service.direct_activate(admin.id, admin.id).await.unwrap();
    assert_eq!(active.role, Role::Manager);
    assert!(active.is_admin);

    let flipped = service
        .toggle_vendor_flag(admin.id, admin.id)
        .await
        .unwrap();
    assert!(!flipped.is_vendor);
    assert_eq!(flipped.role, Role::Manager);
}

#[tokio::test]
async fn toggle_flips_flag_and_role_only() {
    let db = setup().await;
    let repo = SurrealAccountRepository::new(db);
    let admin = admin(&repo).await;
    let client = account(&repo, "Issa", "70000002").await;
    let service = vendors(&repo);

    let on = service
        .toggle_vendor_flag(admin.id, client.id)
        .await
        .unwrap();
    assert!(on.is_vendor);
    assert_eq!(on.role, Role::Vendor);
    assert_eq!(on.vendor_status, VendorStatus::None);
    assert!(on.vendor_code.is_none());

    let off = service
        .toggle_vendor_flag(admin.id, client.id)
        .await
        .unwrap();
    assert!(!off.is_vendor);
    assert_eq!(off.role, Role::Client);
}

#[tokio::test]
async fn reject_from_none_is_a_conflict() {
    let db = setup().await;
    let repo = SurrealAccountRepository::new(db);
    let admin = admin(&repo).await;
    let client = account(&repo, "Issa", "70000002").await;
    let service = vendors(&repo);

    let err = service
        .reject_vendor(admin.id, client.id, "Non")
        .await
        .unwrap_err();
    assert!(matches!(err, GmError::StateConflict { .. }));
}

#[tokio::test]
async fn rotated_code_replaces_the_old_one() {
    let db = setup().await;
    let repo = SurrealAccountRepository::new(db);
    let admin = admin(&repo).await;
    let client = account(&repo, "Issa", "70000002").await;
    let service = VendorService::new(
        repo.clone(),
        ScriptedCodes::new(&["OLD111", "NEW222"]),
        MarketConfig::default(),
    );
    service.direct_activate(admin.id, client.id).await.unwrap();

    let rotated = service.rotate_code(client.id, client.id).await.unwrap();
    assert_eq!(rotated.vendor_code.as_deref(), Some("NEW222"));

    let codes = service.authorizer();
    assert_eq!(
        codes.resolve_code("NEW222").await.unwrap().vendor_id,
        client.id
    );
    assert!(matches!(
        codes.resolve_code("OLD111").await.unwrap_err(),
        GmError::VendorInactive
    ));
}

#[tokio::test]
async fn every_retired_code_stays_out_of_circulation() {
    let db = setup().await;
    let repo = SurrealAccountRepository::new(db);
    let admin = admin(&repo).await;
    let first = account(&repo, "Awa", "70000001").await;
    let second = account(&repo, "Issa", "70000002").await;
    let service = VendorService::new(
        repo.clone(),
        ScriptedCodes::new(&["OLD111", "NEW222", "THR333", "OLD111", "NEW222", "FRESH4"]),
        MarketConfig::default(),
    );

    service.direct_activate(admin.id, first.id).await.unwrap();
    service.rotate_code(admin.id, first.id).await.unwrap();
    let rotated = service.rotate_code(admin.id, first.id).await.unwrap();
    assert_eq!(rotated.vendor_code.as_deref(), Some("THR333"));
    assert_eq!(rotated.revoked_vendor_codes, vec!["OLD111", "NEW222"]);

    let other = service.direct_activate(admin.id, second.id).await.unwrap();
    assert_eq!(other.vendor_code.as_deref(), Some("FRESH4"));

    let codes = service.authorizer();
    for old in ["OLD111", "NEW222"] {
        assert!(matches!(
            codes.resolve_code(old).await.unwrap_err(),
            GmError::VendorInactive
        ));
    }
}

#[tokio::test]
async fn resolve_rejects_unknown_and_malformed_codes() {
    let db = setup().await;
    let repo = SurrealAccountRepository::new(db);
    let service = vendors(&repo);
    let codes = service.authorizer();

    assert!(matches!(
        codes.resolve_code("ZZZZZZ").await.unwrap_err(),
        GmError::CodeNotFound
    ));
    assert!(matches!(
        codes.resolve_code("ABC").await.unwrap_err(),
        GmError::Validation { .. }
    ));
}

#[tokio::test]
async fn code_present_iff_active() {
    let db = setup().await;
    let repo = SurrealAccountRepository::new(db);
    let admin = admin(&repo).await;
    let service = vendors(&repo);

    let a = account(&repo, "A", "71000001").await;
    let b = account(&repo, "B", "71000002").await;
    let c = account(&repo, "C", "71000003").await;
    let d = account(&repo, "D", "71000004").await;

    service.request_vendor_access(a.id, a.id).await.unwrap();
    service.request_vendor_access(b.id, b.id).await.unwrap();
    service.approve_vendor(admin.id, b.id, "Ok").await.unwrap();
    service.direct_activate(admin.id, c.id).await.unwrap();
    service.reject_vendor(admin.id, c.id, "Fin").await.unwrap();
    service.toggle_vendor_flag(admin.id, d.id).await.unwrap();

    let all = repo.list().await.unwrap();
    for account in &all {
        assert_eq!(
            account.vendor_code.is_some(),
            account.vendor_status == VendorStatus::Active,
            "{} breaks the code invariant",
            account.name
        );
    }

    let mut codes: Vec<_> = all.iter().filter_map(|a| a.vendor_code.clone()).collect();
    let held = codes.len();
    codes.sort();
    codes.dedup();
    assert_eq!(codes.len(), held);
}

#[tokio::test]
async fn queue_listings_are_admin_only() {
    let db = setup().await;
    let repo = SurrealAccountRepository::new(db);
    let admin = admin(&repo).await;
    let client = account(&repo, "Issa", "70000002").await;
    let service = vendors(&repo);
    service
        .request_vendor_access(client.id, client.id)
        .await
        .unwrap();

    let queue = service.list_vendor_applications(admin.id).await.unwrap();
    assert_eq!(queue.len(), 1);
    assert_eq!(queue[0].id, client.id);
    assert!(service.list_active_vendors(admin.id).await.unwrap().is_empty());

    let err = service
        .list_vendor_applications(client.id)
        .await
        .unwrap_err();
    assert!(matches!(err, GmError::PermissionDenied { .. }));
}
