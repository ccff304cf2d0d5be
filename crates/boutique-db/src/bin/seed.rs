//! # Seed Data Generator
//!
//! Populates the database with sales and orders for development.
//!
//! ## Usage
//! ```bash
//! # Seed 10 sales and 50 orders (default)
//! cargo run -p boutique-db --bin seed
//!
//! # Custom amounts
//! cargo run -p boutique-db --bin seed -- --sales 20 --orders 200
//!
//! # Specify database path (otherwise boutique.toml / BOUTIQUE_DB_PATH)
//! cargo run -p boutique-db --bin seed -- --db ./data/boutique.db
//! ```
//!
//! ## Generated Data
//! - Sales named after fabric collections, each with a few colour/size SKUs
//! - Orders placed through the real save-order workflow, so order numbers,
//!   line totals, and stock deductions match what the app would write

use chrono::Duration;
use std::env;
use tracing::{info, warn};

use boutique_core::{
    Clock, ManualClock, Money, NewOrderItem, OrderDraft, OrderType, PaymentStatus, SaleDraft,
    SkuRecord, SystemClock,
};
use boutique_db::logging::init_tracing;
use boutique_db::{BoutiqueConfig, Database};

/// Collections for sale names.
const COLLECTIONS: &[&str] = &[
    "Eid Lawn",
    "Winter Khaddar",
    "Chiffon Formals",
    "Summer Cotton",
    "Bridal Edit",
    "Linen Basics",
];

const COLOURS: &[&str] = &["RED", "BLUE", "GREEN", "BLACK", "IVORY"];
const SIZES: &[&str] = &["S", "M", "L", "XL"];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    let args: Vec<String> = env::args().collect();

    let mut sales: usize = 10;
    let mut orders: usize = 50;
    let mut db_path: Option<String> = None;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--sales" | "-s" => {
                if i + 1 < args.len() {
                    sales = args[i + 1].parse().unwrap_or(sales);
                    i += 1;
                }
            }
            "--orders" | "-o" => {
                if i + 1 < args.len() {
                    orders = args[i + 1].parse().unwrap_or(orders);
                    i += 1;
                }
            }
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = Some(args[i + 1].clone());
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Boutique Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -s, --sales <N>    Number of sales to create (default: 10)");
                println!("  -o, --orders <N>   Number of orders to place (default: 50)");
                println!("  -d, --db <PATH>    Database file path (default: from boutique.toml)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            other => warn!(arg = other, "Ignoring unknown argument"),
        }
        i += 1;
    }

    let mut config = BoutiqueConfig::load(None)?;
    if let Some(path) = db_path {
        config.database.path = path.into();
    }

    info!(path = %config.database.path.display(), sales, orders, "Seeding database");

    let db = Database::new(config.db_config()).await?;

    let existing = db.sales().count().await?;
    if existing > 0 {
        warn!(existing, "Database already has sales; skipping seed. Delete the file to regenerate.");
        return Ok(());
    }

    // Orders are spread over the past week so several daily sequences exist.
    let start_day = SystemClock.today() - Duration::days(6);
    let clock = std::sync::Arc::new(ManualClock::on(start_day));
    let placement = db.order_placement(std::sync::Arc::clone(&clock), &config);

    let started = std::time::Instant::now();

    let mut created = Vec::with_capacity(sales);
    for n in 0..sales {
        let draft = generate_sale(n, start_day);
        match placement.create_sale(draft).await {
            Ok(sale) => created.push(sale),
            Err(e) => warn!(index = n, error = %e, "Failed to create sale"),
        }
    }
    info!(count = created.len(), "Sales created");

    let per_day = orders.div_ceil(7).max(1);
    let mut placed = 0;
    for n in 0..orders {
        if n > 0 && n % per_day == 0 {
            clock.advance_days(1);
        }

        let Some(sale) = created.get(n % created.len().max(1)) else {
            break;
        };

        let sku = &sale.sku_items[n % sale.sku_items.len()];
        let order_type = if n % 3 == 0 {
            OrderType::CustomerOrder
        } else {
            OrderType::Sale
        };

        let payment_status = match n % 4 {
            0 => PaymentStatus::Remaining,
            1 => PaymentStatus::HalfPayment,
            _ => PaymentStatus::FullPayment,
        };

        let draft = OrderDraft {
            customer_id: Some(format!("customer-{:03}", n % 25)),
            order_date: clock.today(),
            order_type,
            order_status: "Pending".to_string(),
            total_amount: Money::zero(),
            payment_status,
            amount_paid: Money::zero(),
            notes: None,
        };
        let line = NewOrderItem {
            product_type: sku.sku_code.clone(),
            quantity: 1 + (n % 2) as i64,
            price: Money::from_major(1800 + 150 * (n % 6) as i64),
            sale_id: Some(sale.id.clone()),
            sku_code: Some(sku.sku_code.clone()),
        };

        match placement.place_order(draft, vec![line]).await {
            Ok(_) => placed += 1,
            Err(e) => warn!(index = n, error = %e, "Order skipped"),
        }
    }

    let elapsed = started.elapsed();
    info!(
        sales = created.len(),
        orders = placed,
        elapsed_ms = elapsed.as_millis() as u64,
        "Seed complete"
    );

    let recent = db.orders().list_recent(3).await?;
    for order in recent {
        info!(
            order_number = %order.order_number,
            total = %order.total_amount,
            payment = %order.payment_status,
            remaining = %order.amount_remaining,
            "Latest order"
        );
    }

    db.close().await;
    Ok(())
}

/// Builds one sale with a handful of colour/size SKUs.
fn generate_sale(seed: usize, date: chrono::NaiveDate) -> SaleDraft {
    let collection = COLLECTIONS[seed % COLLECTIONS.len()];
    let colour_count = 1 + seed % 3;

    let sku_items = COLOURS
        .iter()
        .cycle()
        .skip(seed)
        .take(colour_count)
        .flat_map(|colour| {
            SIZES.iter().enumerate().map(move |(i, size)| {
                SkuRecord::new(format!("{}-{}", colour, size), 5 + ((seed + i) * 7 % 20) as i64)
            })
        })
        .collect();

    SaleDraft {
        sales_name: Some(format!("{} {}", collection, seed + 1)),
        sale_date: date,
        customer_id: None,
        sku_items,
        purchase_price_per_item: Some(Money::from_major(600 + 50 * (seed % 8) as i64)),
        notes: None,
    }
}
