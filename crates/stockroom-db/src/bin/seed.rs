//! # Seed Data Generator
//!
//! Populates a database with a small shop and a day of trading, then
//! prints the resulting stock metrics and recommendations.
//!
//! ## Usage
//! ```bash
//! # Seed the configured database (stockroom.toml / STOCKROOM_DB_PATH)
//! cargo run -p stockroom-db --bin seed
//!
//! # Specify database path
//! cargo run -p stockroom-db --bin seed -- --db ./data/stockroom.db
//!
//! # Use a specific config file
//! cargo run -p stockroom-db --bin seed -- --config ./stockroom.toml
//! ```
//!
//! ## Generated Data
//! - 2 suppliers, 3 categories, 8 products with decimal shelf prices
//! - One received purchase, one pending purchase (then received)
//! - A handful of sales across payment methods
//! - A damage write-off and a recount

use rust_decimal::Decimal;
use std::env;
use std::path::PathBuf;
use stockroom_core::{
    NewCategory, NewProduct, NewPurchase, NewPurchaseItem, NewSale, NewSaleItem, NewSupplier,
    PaymentMethod, Product, PurchaseStatus,
};
use stockroom_db::{Database, DbConfig, StockroomConfig};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// (category, name, sku, buying, selling, opening stock, minimum)
const PRODUCTS: &[(&str, &str, &str, i64, i64, i64, i64)] = &[
    ("Beverages", "Cola 330ml", "BEV-001", 45, 99, 48, 12),
    ("Beverages", "Still Water 500ml", "BEV-002", 20, 60, 60, 24),
    ("Beverages", "Orange Juice 1L", "BEV-003", 150, 299, 6, 6),
    ("Snacks", "Salted Crisps", "SNK-001", 60, 125, 30, 10),
    ("Snacks", "Chocolate Bar", "SNK-002", 55, 110, 9, 8),
    ("Snacks", "Trail Mix", "SNK-003", 210, 399, 40, 5),
    ("Household", "Dish Soap", "HSE-001", 130, 249, 12, 4),
    ("Household", "Paper Towels", "HSE-002", 180, 349, 0, 6),
];

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,stockroom=debug,sqlx=warn"));

    tracing_subscriber::fmt().with_env_filter(filter).init();
}

/// Cents to a two-place decimal, the way prices arrive from a form.
fn price(cents: i64) -> Decimal {
    Decimal::new(cents, 2)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    // Parse command line arguments
    let args: Vec<String> = env::args().collect();

    let mut db_path: Option<PathBuf> = None;
    let mut config_path: Option<PathBuf> = None;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = Some(PathBuf::from(&args[i + 1]));
                    i += 1;
                }
            }
            "--config" | "-c" => {
                if i + 1 < args.len() {
                    config_path = Some(PathBuf::from(&args[i + 1]));
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Stockroom Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>        Database file path (overrides config)");
                println!("  -c, --config <PATH>    Config file (default: platform config dir)");
                println!("  -h, --help             Show this help message");
                return Ok(());
            }
            other => warn!(argument = %other, "Ignoring unknown argument"),
        }
        i += 1;
    }

    let config = StockroomConfig::load(config_path)?;
    let db_config = match db_path {
        Some(path) => DbConfig::new(path).history_limit(config.ledger.history_limit),
        None => config.db_config(),
    };

    let db = Database::new(db_config).await?;
    info!("Connected to database, migrations applied");

    let existing = db.products().count().await?;
    if existing > 0 {
        warn!(existing, "Database already has products; skipping seed");
        return Ok(());
    }

    // -------------------------------------------------------------------------
    // Catalogue
    // -------------------------------------------------------------------------
    let wholesale = db
        .suppliers()
        .create(&NewSupplier {
            name: "Harbour Wholesale".to_string(),
            contact_person: Some("Kofi Mensah".to_string()),
            phone: Some("555-0142".to_string()),
            email: Some("orders@harbour.test".to_string()),
            address: Some("12 Dock Road".to_string()),
        })
        .await?;
    let farm = db
        .suppliers()
        .create(&NewSupplier {
            name: "Green Valley Farm".to_string(),
            email: Some("hello@greenvalley.test".to_string()),
            ..Default::default()
        })
        .await?;

    let mut categories = Vec::new();
    for name in ["Beverages", "Snacks", "Household"] {
        let category = db
            .categories()
            .create(&NewCategory {
                name: name.to_string(),
                description: None,
            })
            .await?;
        categories.push(category);
    }

    let mut products: Vec<Product> = Vec::with_capacity(PRODUCTS.len());
    for &(category, name, sku, buying, selling, stock, min) in PRODUCTS {
        let mut new = NewProduct::new(name)
            .sku(sku)
            .supplier(wholesale.id)
            .decimal_prices(price(buying), price(selling))?
            .stock(stock, min);
        if let Some(c) = categories.iter().find(|c| c.name == category) {
            new = new.category(c.id);
        }
        products.push(db.products().create(&new).await?);
    }
    info!(products = products.len(), "Catalogue created");

    let id_of = |sku: &str| {
        products
            .iter()
            .find(|p| p.sku.as_deref() == Some(sku))
            .map(|p| p.id)
            .ok_or_else(|| format!("seed product {sku} missing"))
    };

    // -------------------------------------------------------------------------
    // Trading day
    // -------------------------------------------------------------------------
    let ledger = db.ledger();

    ledger
        .record_purchase(
            &NewPurchase {
                supplier_id: Some(wholesale.id),
                status: PurchaseStatus::Received,
            },
            &[
                NewPurchaseItem {
                    product_id: id_of("BEV-003")?,
                    quantity: 12,
                    unit_price: 160,
                },
                NewPurchaseItem {
                    product_id: id_of("HSE-002")?,
                    quantity: 6,
                    unit_price: 175,
                },
            ],
        )
        .await?;

    let pending = ledger
        .record_purchase(
            &NewPurchase {
                supplier_id: Some(farm.id),
                status: PurchaseStatus::Pending,
            },
            &[NewPurchaseItem {
                product_id: id_of("SNK-003")?,
                quantity: 10,
                unit_price: 200,
            }],
        )
        .await?;

    let baskets: &[(PaymentMethod, Option<&str>, &[(&str, i64)])] = &[
        (PaymentMethod::Cash, None, &[("BEV-001", 6), ("SNK-001", 2)]),
        (PaymentMethod::Card, Some("A. Owusu"), &[("BEV-003", 14), ("SNK-002", 3)]),
        (PaymentMethod::MobileMoney, None, &[("BEV-002", 12), ("HSE-001", 1)]),
        (PaymentMethod::Cash, None, &[("BEV-001", 30), ("SNK-002", 2)]),
    ];

    for (payment_method, customer, lines) in baskets {
        let mut items = Vec::with_capacity(lines.len());
        for &(sku, quantity) in lines.iter() {
            let product_id = id_of(sku)?;
            let unit_price = products
                .iter()
                .find(|p| p.id == product_id)
                .map(|p| p.selling_price)
                .unwrap_or_default();
            items.push(NewSaleItem {
                product_id,
                quantity,
                unit_price,
            });
        }

        let sale = NewSale {
            payment_method: *payment_method,
            customer_name: customer.map(str::to_string),
        };
        match ledger.record_sale(&sale, &items).await {
            Ok(recorded) => info!(sale_id = recorded.sale.id, total = %recorded.sale.total(), "Sale rung up"),
            Err(e) => warn!(error = %e, "Sale refused"),
        }
    }

    ledger.adjust_stock(id_of("SNK-001")?, -3, "crushed in delivery").await?;
    ledger.adjust_stock(id_of("HSE-001")?, 2, "recount").await?;
    ledger.receive_purchase(pending.purchase.id).await?;

    let discrepancies = ledger.audit().await?;
    if !discrepancies.is_empty() {
        warn!(count = discrepancies.len(), "Ledger does not balance");
    }

    // -------------------------------------------------------------------------
    // Reports
    // -------------------------------------------------------------------------
    let alerts = db.products().stock_alert_summary().await?;
    let metrics = db.metrics().all_metrics().await?;
    let recommendations = db.recommendations().generate().await?;

    println!("Low stock alerts:");
    println!("{}", serde_json::to_string_pretty(&alerts)?);
    println!();
    println!("Stock metrics:");
    println!("{}", serde_json::to_string_pretty(&metrics)?);
    println!();
    println!("Recommendations:");
    println!("{}", serde_json::to_string_pretty(&recommendations)?);

    db.close().await;
    Ok(())
}
