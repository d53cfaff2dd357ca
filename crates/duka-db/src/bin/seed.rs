//! # Seed Data Generator
//!
//! Populates a fresh database with a small Kenyan shop catalogue.
//!
//! ## Usage
//! ```bash
//! # Default catalogue
//! cargo run -p duka-db --bin seed
//!
//! # Specify database path
//! cargo run -p duka-db --bin seed -- --db ./data/duka.db
//!
//! # Repeat each product in N pack sizes
//! cargo run -p duka-db --bin seed -- --variants 3
//! ```
//!
//! ## Generated Data
//! - The walk-in customer (always)
//! - Products across groceries, beverages, household goods and services
//! - Two suppliers with "Net N" credit terms
//! - One registered customer with loyalty points

use chrono::Utc;
use std::env;
use uuid::Uuid;

use duka_core::{Customer, PricingType, Product, ProductType, Supplier};
use duka_db::{Database, DbConfig, Store, StoreExt, WriteBatch};

/// (sku prefix, category, name, price in KSh, unit, product type)
const CATALOGUE: &[(&str, &str, &str, i64, &str, ProductType)] = &[
    ("GRO", "Groceries", "Unga Jogoo 2kg", 230, "pcs", ProductType::Inventory),
    ("GRO", "Groceries", "Sugar Kabras 1kg", 185, "pcs", ProductType::Inventory),
    ("GRO", "Groceries", "Rice Pishori 1kg", 220, "pcs", ProductType::Inventory),
    ("GRO", "Groceries", "Kimbo 1kg", 420, "pcs", ProductType::Inventory),
    ("GRO", "Groceries", "Royco Mchuzi Mix", 45, "pcs", ProductType::Inventory),
    ("BEV", "Beverages", "Ketepa Tea 100g", 120, "pcs", ProductType::Inventory),
    ("BEV", "Beverages", "Brookside Milk 500ml", 65, "pcs", ProductType::Inventory),
    ("BEV", "Beverages", "Coca-Cola 500ml", 80, "pcs", ProductType::Inventory),
    ("BEV", "Beverages", "Dasani 1L", 70, "pcs", ProductType::Inventory),
    ("HSE", "Household", "Menengai Bar Soap", 150, "pcs", ProductType::Inventory),
    ("HSE", "Household", "Omo 1kg", 350, "pcs", ProductType::Inventory),
    ("HSE", "Household", "Jik 750ml", 210, "pcs", ProductType::Inventory),
    ("SRV", "Services", "Delivery within town", 200, "job", ProductType::Service),
    ("SRV", "Services", "Gas refill 6kg", 1200, "job", ProductType::Service),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    let mut db_path = String::from("./duka_dev.db");
    let mut variants: usize = 1;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--variants" | "-v" => {
                if i + 1 < args.len() {
                    variants = args[i + 1].parse::<usize>().unwrap_or(1).clamp(1, 5);
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Duka POS Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>        Database file path (default: ./duka_dev.db)");
                println!("  -v, --variants <N>     Pack sizes per product, 1-5 (default: 1)");
                println!("  -h, --help             Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("🌱 Duka POS Seed Data Generator");
    println!("===============================");
    println!("Database: {}", db_path);
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?;
    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    let existing: Vec<Product> = db.get_all().await?;
    if !existing.is_empty() {
        println!("⚠ Database already has {} products", existing.len());
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    let now = Utc::now();
    let mut batch = WriteBatch::new();

    batch.put(&Customer::walk_in(now))?;
    batch.put(&Customer {
        id: Uuid::new_v4().to_string(),
        name: "Wanjiku Kamau".to_string(),
        phone: "0712345678".to_string(),
        email: Some("wanjiku@example.co.ke".to_string()),
        date_added: now,
        loyalty_points: 450,
    })?;

    for (name, contact, terms) in [
        ("Bidco Africa", "0722100200", "Net 30"),
        ("Kapa Oil Refineries", "0733300400", "Net 14"),
    ] {
        batch.put(&Supplier {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            contact: contact.to_string(),
            email: None,
            credit_terms: terms.to_string(),
        })?;
    }

    let mut generated = 0;
    for (index, entry) in CATALOGUE.iter().enumerate() {
        for variant in 0..variants {
            batch.put(&generate_product(entry, index, variant))?;
            generated += 1;
        }
    }

    db.commit(batch).await?;

    println!();
    println!("✓ Walk-in customer + 1 registered customer");
    println!("✓ 2 suppliers");
    println!("✓ {} products", generated);
    println!();
    println!("✓ Seed complete!");

    Ok(())
}

/// Builds one product. Variant 0 is the base pack; later variants are
/// larger packs priced proportionally.
fn generate_product(
    entry: &(&str, &str, &str, i64, &str, ProductType),
    index: usize,
    variant: usize,
) -> Product {
    let (prefix, category, name, price_ksh, unit, product_type) = *entry;
    let now = Utc::now();
    let pack = variant as i64 + 1;

    let price_cents = price_ksh * 100 * pack;
    let (name, sku) = if variant == 0 {
        (name.to_string(), format!("{}-{:03}", prefix, index + 1))
    } else {
        (
            format!("{} x{}", name, pack),
            format!("{}-{:03}-{}", prefix, index + 1, pack),
        )
    };

    let tracks = product_type == ProductType::Inventory;

    Product {
        id: Uuid::new_v4().to_string(),
        sku,
        // 13-digit code in the Kenyan 616 prefix range, checksum not computed.
        ean: tracks.then(|| format!("616{:06}{:04}", index, variant)),
        name,
        category: category.to_string(),
        price_cents,
        pricing_type: PricingType::Inclusive,
        product_type,
        stock: if tracks { 20 + ((index * 7) % 60) as i64 } else { 0 },
        cost_price_cents: tracks.then(|| price_cents * 75 / 100),
        unit_of_measure: unit.to_string(),
        is_active: true,
        created_at: now,
        updated_at: now,
    }
}
