//! # Seed Data Generator
//!
//! Populates a development database with a product catalog and one customer.
//!
//! ## Usage
//! ```bash
//! # Generate 60 products (default)
//! cargo run -p storefront-db --bin seed
//!
//! # Generate custom amount
//! cargo run -p storefront-db --bin seed -- --count 200
//!
//! # Specify database path
//! cargo run -p storefront-db --bin seed -- --db ./data/storefront.db
//! ```
//!
//! Products cycle through the categories below with a size suffix. Prices
//! land between 5.00 and 129.99, ratings between 2.5 and 5.0. Every product
//! is created available.

use std::env;
use storefront_core::{Customer, Product, ProductInput, Rating};
use storefront_db::{Database, DbConfig};

const CATEGORIES: &[(&str, &[&str])] = &[
    (
        "men's clothing",
        &["Slim Fit Shirt", "Cotton Jacket", "Casual T-Shirt", "Rain Coat"],
    ),
    (
        "women's clothing",
        &["Snowboard Jacket", "Short Sleeve Top", "Moisture Wick Tee", "Biker Jacket"],
    ),
    (
        "jewelery",
        &["Silver Ring", "Gold Bracelet", "Pearl Earrings", "Chain Necklace"],
    ),
    (
        "electronics",
        &["Portable Drive", "SSD 1TB", "Gaming Monitor", "USB Hub", "Wireless Mouse"],
    ),
];

const SIZES: &[(&str, i64)] = &[("S", 0), ("M", 250), ("L", 500)];

const SEED_CUSTOMER: (&str, &str) = ("Demo Customer", "demo@storefront.local");

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    let mut count: usize = 60;
    let mut db_path = String::from("./storefront_dev.db");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--count" | "-c" => {
                if i + 1 < args.len() {
                    count = args[i + 1].parse().unwrap_or(60);
                    i += 1;
                }
            }
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Storefront Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -c, --count <N>    Number of products to generate (default: 60)");
                println!("  -d, --db <PATH>    Database file path (default: ./storefront_dev.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("Storefront Seed Data Generator");
    println!("==============================");
    println!("Database: {}", db_path);
    println!("Products: {}", count);
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?;
    println!("✓ Connected to database, migrations applied");

    // Customer first: sales need one to reference
    let (name, email) = SEED_CUSTOMER;
    let customer = match db.customers().get_by_email(email).await? {
        Some(existing) => existing,
        None => {
            let customer = Customer::new(name, email);
            db.customers().insert(&customer).await?;
            customer
        }
    };
    println!("✓ Customer {} <{}> id={}", customer.name, customer.email, customer.id);

    let existing = db.products().count().await?;
    if existing > 0 {
        println!("⚠ Database already has {} products", existing);
        println!("  Skipping product seed to avoid duplicates.");
        return Ok(());
    }

    println!();
    println!("Generating products...");

    let start = std::time::Instant::now();
    let mut generated = 0;
    let mut seed = 0usize;

    'outer: loop {
        for (category, titles) in CATEGORIES {
            for title in titles.iter() {
                for (size, price_addon) in SIZES {
                    if generated >= count {
                        break 'outer;
                    }

                    let product = generate_product(category, title, size, *price_addon, seed);
                    seed += 1;

                    if let Err(e) = db.products().insert(&product).await {
                        eprintln!("Failed to insert {}: {}", product.title, e);
                        continue;
                    }
                    generated += 1;

                    if generated % 20 == 0 {
                        println!("  Generated {} products...", generated);
                    }
                }
            }
        }
    }

    println!();
    println!("✓ Generated {} products in {:?}", generated, start.elapsed());
    println!("✓ Seed complete!");

    Ok(())
}

/// Builds one available product from the catalog tables.
fn generate_product(category: &str, title: &str, size: &str, price_addon: i64, seed: usize) -> Product {
    let base_price = 500 + ((seed * 997) % 12_000) as i64;
    let rate = 2.5 + (seed % 26) as f64 / 10.0;

    let mut product = Product::new(ProductInput {
        title: format!("{} {}", title, size),
        description: format!("{} in size {}, from the {} range", title, size, category),
        price_cents: base_price + price_addon,
        category: category.to_string(),
        image: format!("https://img.storefront.local/{}.png", seed),
        rating: Rating {
            rate,
            count: ((seed * 31) % 500) as i64,
        },
    });
    product.activate();
    product
}
