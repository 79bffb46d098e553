//! Schema definitions and migration runner for SurrealDB.
//!
//! All table definitions use SCHEMAFULL mode for data integrity.
//! UUIDs are stored as strings. Enums are stored as strings with
//! ASSERT constraints for validation.

use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use tracing::info;

use crate::error::DbError;

// -----------------------------------------------------------------------
// Migration tracking
// -----------------------------------------------------------------------

const MIGRATION_TABLE_DDL: &str = "\
DEFINE TABLE IF NOT EXISTS _migration SCHEMAFULL;
DEFINE FIELD IF NOT EXISTS version ON TABLE _migration TYPE int;
DEFINE FIELD IF NOT EXISTS name ON TABLE _migration TYPE string;
DEFINE FIELD IF NOT EXISTS applied_at ON TABLE _migration TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX IF NOT EXISTS idx_migration_version ON TABLE _migration \
    COLUMNS version UNIQUE;
";

#[derive(Debug, SurrealValue)]
struct MigrationRecord {
    version: u32,
    #[allow(dead_code)]
    name: String,
}

struct Migration {
    version: u32,
    name: &'static str,
    sql: &'static str,
}

static MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        name: "initial_schema",
        sql: SCHEMA_V1,
    },
];

// -----------------------------------------------------------------------
// Schema v1: accounts, catalog, orders
// -----------------------------------------------------------------------

const SCHEMA_V1: &str = "\
-- =======================================================================
-- Accounts
-- =======================================================================
DEFINE TABLE account SCHEMAFULL;
DEFINE FIELD name ON TABLE account TYPE string;
DEFINE FIELD phone ON TABLE account TYPE string;
DEFINE FIELD email ON TABLE account TYPE option<string>;
DEFINE FIELD role ON TABLE account TYPE string \
    ASSERT $value IN ['client', 'vendeur', 'manager', 'super-admin'];
DEFINE FIELD is_admin ON TABLE account TYPE bool DEFAULT false;
DEFINE FIELD is_vendor ON TABLE account TYPE bool DEFAULT false;
DEFINE FIELD vendor_status ON TABLE account TYPE string \
    ASSERT $value IN ['none', 'pending', 'active', 'rejected'];
DEFINE FIELD vendor_code ON TABLE account TYPE option<string> \
    ASSERT $value = NONE OR string::len($value) = 6;
DEFINE FIELD revoked_vendor_codes ON TABLE account TYPE array<string> \
    DEFAULT [];
DEFINE FIELD vendor_application_date ON TABLE account \
    TYPE option<datetime>;
DEFINE FIELD vendor_approval_date ON TABLE account TYPE option<datetime>;
DEFINE FIELD admin_message ON TABLE account TYPE option<string>;
DEFINE FIELD created_at ON TABLE account TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE account TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_account_phone ON TABLE account COLUMNS phone UNIQUE;
DEFINE INDEX idx_account_vendor_code ON TABLE account \
    COLUMNS vendor_code UNIQUE;
DEFINE INDEX idx_account_revoked_codes ON TABLE account \
    COLUMNS revoked_vendor_codes;
DEFINE INDEX idx_account_vendor_status ON TABLE account \
    COLUMNS vendor_status;

-- =======================================================================
-- Products
-- =======================================================================
DEFINE TABLE product SCHEMAFULL;
DEFINE FIELD name ON TABLE product TYPE string;
DEFINE FIELD local_name ON TABLE product TYPE option<string>;
DEFINE FIELD scientific_name ON TABLE product TYPE option<string>;
DEFINE FIELD description ON TABLE product TYPE string DEFAULT '';
DEFINE FIELD price ON TABLE product TYPE int ASSERT $value > 0;
DEFINE FIELD stock ON TABLE product TYPE int ASSERT $value >= 0;
DEFINE FIELD category ON TABLE product TYPE string \
    ASSERT $value IN ['Intérieur', 'Jardin', 'Ombre', 'Soleil', 'Arbre', \
    'Potager', 'Médicinale', 'Fruitier', 'Cactus', 'Palmier', 'Arbuste'];
DEFINE FIELD status ON TABLE product TYPE string \
    ASSERT $value IN ['pending', 'active', 'rejected'];
DEFINE FIELD vendor_id ON TABLE product TYPE option<string>;
DEFINE FIELD vendor_name ON TABLE product TYPE option<string>;
DEFINE FIELD is_premium ON TABLE product TYPE bool DEFAULT false;
DEFINE FIELD created_at ON TABLE product TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE product TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_product_status ON TABLE product COLUMNS status;
DEFINE INDEX idx_product_vendor ON TABLE product COLUMNS vendor_id;

-- =======================================================================
-- Orders (items and totals are written once; only status changes)
-- =======================================================================
DEFINE TABLE customer_order SCHEMAFULL;
DEFINE FIELD account_id ON TABLE customer_order TYPE option<string>;
DEFINE FIELD items ON TABLE customer_order TYPE array<object>;
DEFINE FIELD items[*].product_id ON TABLE customer_order TYPE string;
DEFINE FIELD items[*].name ON TABLE customer_order TYPE string;
DEFINE FIELD items[*].unit_price ON TABLE customer_order TYPE int;
DEFINE FIELD items[*].quantity ON TABLE customer_order TYPE int \
    ASSERT $value >= 1;
DEFINE FIELD subtotal ON TABLE customer_order TYPE int;
DEFINE FIELD delivery_fee ON TABLE customer_order TYPE int;
DEFINE FIELD total ON TABLE customer_order TYPE int;
DEFINE FIELD customer_name ON TABLE customer_order TYPE string;
DEFINE FIELD customer_phone ON TABLE customer_order TYPE string;
DEFINE FIELD city ON TABLE customer_order TYPE string;
DEFINE FIELD district ON TABLE customer_order TYPE string;
DEFINE FIELD landmark ON TABLE customer_order TYPE string DEFAULT '';
DEFINE FIELD method ON TABLE customer_order TYPE string \
    ASSERT $value IN ['Livraison', 'Retrait'];
DEFINE FIELD pickup_time ON TABLE customer_order TYPE option<string>;
DEFINE FIELD payment_method ON TABLE customer_order TYPE string \
    ASSERT $value IN ['Mobile Money', 'Paiement à la livraison'];
DEFINE FIELD status ON TABLE customer_order TYPE string \
    ASSERT $value IN ['En attente', 'Validée', 'Livrée', 'Annulée'];
DEFINE FIELD created_at ON TABLE customer_order TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_order_account ON TABLE customer_order \
    COLUMNS account_id, created_at;
DEFINE INDEX idx_order_status ON TABLE customer_order COLUMNS status;
";

// -----------------------------------------------------------------------
// Public API
// -----------------------------------------------------------------------

/// Run all pending migrations against the given SurrealDB client.
///
/// Creates a `_migration` tracking table on first run, then applies
/// each migration whose version exceeds the current maximum.
pub async fn run_migrations<C: Connection>(db: &Surreal<C>) -> Result<(), DbError> {
    db.query(MIGRATION_TABLE_DDL)
        .await?
        .check()
        .map_err(|e| DbError::Migration(e.to_string()))?;

    let mut result = db
        .query("SELECT * FROM _migration ORDER BY version DESC LIMIT 1")
        .await?;
    let records: Vec<MigrationRecord> = result.take(0)?;
    let current_version = records.first().map(|m| m.version).unwrap_or(0);

    for migration in MIGRATIONS {
        if migration.version <= current_version {
            continue;
        }
        info!(
            version = migration.version,
            name = migration.name,
            "Applying migration"
        );
        db.query(migration.sql).await?.check().map_err(|e| {
            DbError::Migration(format!(
                "Migration v{} '{}' failed: {}",
                migration.version, migration.name, e,
            ))
        })?;

        db.query(
            "CREATE _migration SET version = $version, \
             name = $name",
        )
        .bind(("version", migration.version))
        .bind(("name", migration.name))
        .await?
        .check()
        .map_err(|e| {
            DbError::Migration(format!(
                "Failed to record migration v{}: {}",
                migration.version, e,
            ))
        })?;

        info!(
            version = migration.version,
            "Migration applied successfully"
        );
    }

    Ok(())
}

/// Latest schema version known to this build.
pub fn latest_version() -> u32 {
    MIGRATIONS.last().map(|m| m.version).unwrap_or(0)
}
