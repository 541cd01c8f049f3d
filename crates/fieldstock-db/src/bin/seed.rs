//! # Seed Data Generator
//!
//! Populates a development database with stores, catalog items, and
//! opening stock.
//!
//! ## Usage
//! ```bash
//! # Default database path
//! cargo run -p fieldstock-db --bin seed
//!
//! # Specify database path
//! cargo run -p fieldstock-db --bin seed -- --db ./data/fieldstock.db
//! ```
//!
//! ## Generated Data
//! - One MAIN store per region plus SUB stores
//! - Telecom field materials across categories (cable, CPE, fittings)
//! - An opening GRN per store so stock levels are non-trivial

use std::env;

use chrono::Utc;
use uuid::Uuid;

use fieldstock_core::{Item, NewGrn, QuantityLine, Store, StoreType};
use fieldstock_db::{Database, DbConfig};

/// (code, name, unit, category, min_level)
const ITEMS: &[(&str, &str, &str, &str, i64)] = &[
    ("DROP-24F", "Drop Wire 24F", "m", "cable", 500),
    ("DROP-48F", "Drop Wire 48F", "m", "cable", 300),
    ("FIG8-1KM", "Figure-8 Cable Drum 1km", "roll", "cable", 5),
    ("ONT-G240", "GPON ONT G-240", "pcs", "cpe", 25),
    ("STB-4K", "IPTV Set-Top Box 4K", "pcs", "cpe", 25),
    ("SPL-1X8", "Splitter 1x8", "pcs", "passive", 20),
    ("SPL-1X16", "Splitter 1x16", "pcs", "passive", 10),
    ("CLAMP-S", "Suspension Clamp", "pcs", "fitting", 200),
    ("PATCH-SC", "SC/APC Patch Cord", "pcs", "fitting", 100),
    ("CONN-FAST", "Fast Connector", "pcs", "fitting", 300),
];

/// (name, type, areas)
const STORES: &[(&str, StoreType, &[&str])] = &[
    ("Regional Main Store", StoreType::Main, &["OPMC-NORTH", "OPMC-EAST"]),
    ("North Sub Store", StoreType::Sub, &["OPMC-NORTH"]),
    ("East Sub Store", StoreType::Sub, &["OPMC-EAST"]),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let args: Vec<String> = env::args().collect();
    let mut db_path = String::from("./fieldstock_dev.db");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Fieldstock Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>    Database file path (default: ./fieldstock_dev.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("Fieldstock Seed Data Generator");
    println!("==============================");
    println!("Database: {}", db_path);
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?;

    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    let existing = db.items().count().await?;
    if existing > 0 {
        println!("⚠ Database already has {} items", existing);
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    println!();
    println!("Seeding catalog...");

    let now = Utc::now();
    let mut item_ids = Vec::with_capacity(ITEMS.len());
    for (code, name, unit, category, min_level) in ITEMS {
        let item = Item {
            id: Uuid::new_v4().to_string(),
            code: (*code).to_string(),
            name: (*name).to_string(),
            unit: (*unit).to_string(),
            category: Some((*category).to_string()),
            min_level: *min_level,
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        let inserted = db.items().insert(&item).await?;
        item_ids.push(inserted.id);
    }
    println!("  {} items", item_ids.len());

    let mut store_ids = Vec::with_capacity(STORES.len());
    for (name, store_type, areas) in STORES {
        let store = Store {
            id: Uuid::new_v4().to_string(),
            name: (*name).to_string(),
            store_type: *store_type,
            manager: None,
            areas: areas.iter().map(|a| (*a).to_string()).collect(),
            created_at: now,
            updated_at: now,
        };
        let inserted = db.stores().insert(&store).await?;
        store_ids.push(inserted.id);
    }
    println!("  {} stores", store_ids.len());

    println!();
    println!("Booking opening stock...");

    for (store_idx, store_id) in store_ids.iter().enumerate() {
        let lines: Vec<QuantityLine> = item_ids
            .iter()
            .enumerate()
            .map(|(item_idx, item_id)| QuantityLine {
                item_id: item_id.clone(),
                // Deterministic but varied quantities per store/item.
                quantity: 50 + ((store_idx * 37 + item_idx * 13) % 200) as i64,
            })
            .collect();

        let grn = db
            .grns()
            .create(NewGrn {
                store_id: store_id.clone(),
                source_type: "supplier".to_string(),
                supplier: Some("Opening Stock".to_string()),
                received_by: "seeder".to_string(),
                lines,
            })
            .await?;
        println!("  {} ({} lines)", grn.grn_number, item_ids.len());
    }

    let low = db.stock().list_low_stock().await?;
    println!();
    println!("✓ Seed complete! {} rows at or below reorder level", low.len());

    Ok(())
}
