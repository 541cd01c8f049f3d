//! Shared helpers for repository tests: an isolated in-memory database
//! plus seed data in the shapes most tests need.

use chrono::Utc;
use uuid::Uuid;

use crate::{Database, DbConfig};
use fieldstock_core::{Item, NewGrn, QuantityLine, Store, StoreType};

/// Creates a migrated, isolated in-memory database.
pub(crate) async fn test_db() -> Database {
    Database::new(DbConfig::in_memory())
        .await
        .expect("in-memory database")
}

/// Inserts a store and returns its id. `store_type` is "main" or "sub".
pub(crate) async fn seed_store(db: &Database, name: &str, store_type: &str) -> String {
    let now = Utc::now();
    let store = Store {
        id: Uuid::new_v4().to_string(),
        name: name.to_string(),
        store_type: if store_type == "main" {
            StoreType::Main
        } else {
            StoreType::Sub
        },
        manager: None,
        areas: vec!["AREA-NORTH".to_string()],
        created_at: now,
        updated_at: now,
    };
    db.stores().insert(&store).await.expect("seed store").id
}

/// Inserts an item and returns its id.
pub(crate) async fn seed_item(db: &Database, code: &str, min_level: i64) -> String {
    let now = Utc::now();
    let item = Item {
        id: Uuid::new_v4().to_string(),
        code: code.to_string(),
        name: format!("{code} material"),
        unit: "pcs".to_string(),
        category: None,
        min_level,
        is_active: true,
        created_at: now,
        updated_at: now,
    };
    db.items().insert(&item).await.expect("seed item").id
}

/// Books opening stock into a store through a GRN.
pub(crate) async fn grn_intake(db: &Database, store_id: &str, item_id: &str, quantity: i64) {
    db.grns()
        .create(NewGrn {
            store_id: store_id.to_string(),
            source_type: "supplier".to_string(),
            supplier: Some("Seed Supplier".to_string()),
            received_by: "seeder".to_string(),
            lines: vec![QuantityLine {
                item_id: item_id.to_string(),
                quantity,
            }],
        })
        .await
        .expect("grn intake");
}
