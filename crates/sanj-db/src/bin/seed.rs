//! # Catalog Seeder
//!
//! Loads the starting product catalog and the doctor registry into an empty
//! database.
//!
//! ## Usage
//! ```bash
//! # Seed ./sanj.db (default)
//! cargo run -p sanj-db --bin seed
//!
//! # Specify database path
//! cargo run -p sanj-db --bin seed -- --db ./data/sanj.db
//! ```
//!
//! Each product's stock is booked as an opening adjustment on its batch, so
//! the stock ledger and the product counters agree from the first run.

use chrono::NaiveDate;
use sanj_core::inputs::ProductInput;
use sanj_core::{Money, Rate};
use sanj_db::{Database, DbConfig};
use std::env;

/// One catalog line.
struct CatalogItem {
    name: &'static str,
    batch: &'static str,
    expiry: (i32, u32, u32),
    mrp: i64,
    gst_percent: u32,
    retailer: i64,
    stockist: i64,
    supplier: i64,
    scheme: &'static str,
    stock: i64,
    category: &'static str,
    description: &'static str,
    composition: &'static str,
    packing: &'static str,
}

const CATALOG: &[CatalogItem] = &[
    CatalogItem {
        name: "CALSANZ FEM CAP",
        batch: "CSF2301",
        expiry: (2025, 8, 31),
        mrp: 350,
        gst_percent: 12,
        retailer: 280,
        stockist: 240,
        supplier: 190,
        scheme: "10+2",
        stock: 120,
        category: "Women's Health",
        description: "Calcium supplement for women with Vitamin D3",
        composition: "Calcium Carbonate + Vitamin D3 + Magnesium + Zinc",
        packing: "10x10 Strips",
    },
    CatalogItem {
        name: "CALSANZ STRONG CAPSULE",
        batch: "CSS2302",
        expiry: (2025, 9, 30),
        mrp: 320,
        gst_percent: 12,
        retailer: 260,
        stockist: 220,
        supplier: 175,
        scheme: "5+1",
        stock: 85,
        category: "Bone Health",
        description: "High potency calcium with essential minerals",
        composition: "Calcium Citrate + Vitamin D3 + Vitamin K2 + Magnesium",
        packing: "15 Capsules Strip",
    },
    CatalogItem {
        name: "FOL D3 TAB",
        batch: "FLD2303",
        expiry: (2025, 6, 30),
        mrp: 180,
        gst_percent: 12,
        retailer: 150,
        stockist: 130,
        supplier: 105,
        scheme: "10+1",
        stock: 200,
        category: "Pregnancy Care",
        description: "Folic acid with Vitamin D3 for prenatal care",
        composition: "Folic Acid 5mg + Vitamin D3 1000 IU",
        packing: "10x10 Tablets",
    },
    CatalogItem {
        name: "NEURON PLUS CAP",
        batch: "NPL2304",
        expiry: (2025, 7, 31),
        mrp: 280,
        gst_percent: 12,
        retailer: 230,
        stockist: 200,
        supplier: 160,
        scheme: "15+3",
        stock: 150,
        category: "Neuro Health",
        description: "Advanced neuro-nutritional supplement",
        composition: "Methylcobalamin + Alpha Lipoic Acid + Folic Acid + Pyridoxine",
        packing: "10 Capsules Strip",
    },
    CatalogItem {
        name: "NEURON PLUS INJ",
        batch: "NPI2305",
        expiry: (2024, 12, 31),
        mrp: 85,
        gst_percent: 12,
        retailer: 70,
        stockist: 60,
        supplier: 45,
        scheme: "25+5",
        stock: 300,
        category: "Injectables",
        description: "Neurobion injection for vitamin B12 deficiency",
        composition: "Methylcobalamin 1500mcg",
        packing: "1ml x 10 Vials",
    },
    CatalogItem {
        name: "RABSANZ DSR CAP",
        batch: "RDS2306",
        expiry: (2025, 10, 31),
        mrp: 220,
        gst_percent: 12,
        retailer: 185,
        stockist: 160,
        supplier: 125,
        scheme: "10+2",
        stock: 95,
        category: "Gastrointestinal",
        description: "Rabeprazole delayed release capsules for acidity",
        composition: "Rabeprazole 20mg",
        packing: "10 Capsules Strip",
    },
    CatalogItem {
        name: "SAZ LQ 10 CAP",
        batch: "SLQ2307",
        expiry: (2025, 5, 31),
        mrp: 190,
        gst_percent: 12,
        retailer: 160,
        stockist: 140,
        supplier: 110,
        scheme: "8+1",
        stock: 110,
        category: "Gastrointestinal",
        description: "Levosulpiride and Rabeprazole combination",
        composition: "Levosulpiride 75mg + Rabeprazole 20mg",
        packing: "10 Capsules Strip",
    },
    CatalogItem {
        name: "TENDOLIV OA TAB",
        batch: "TDO2308",
        expiry: (2025, 8, 31),
        mrp: 260,
        gst_percent: 12,
        retailer: 220,
        stockist: 190,
        supplier: 150,
        scheme: "12+2",
        stock: 75,
        category: "Pain Management",
        description: "Glucosamine with Osteoarthritis management",
        composition: "Glucosamine 750mg + Diacerein 50mg",
        packing: "10 Tablets Strip",
    },
    CatalogItem {
        name: "SINOPLEX L SYP",
        batch: "SPL2309",
        expiry: (2024, 11, 30),
        mrp: 145,
        gst_percent: 12,
        retailer: 120,
        stockist: 105,
        supplier: 85,
        scheme: "6+1",
        stock: 180,
        category: "Cough & Cold",
        description: "Antitussive and expectorant syrup",
        composition: "Chlorpheniramine Maleate + Dextromethorphan + Guaiphenesin",
        packing: "100ml Bottle",
    },
    CatalogItem {
        name: "NEURON FORTE CAP",
        batch: "NFT2310",
        expiry: (2025, 9, 30),
        mrp: 320,
        gst_percent: 12,
        retailer: 270,
        stockist: 235,
        supplier: 190,
        scheme: "10+1",
        stock: 60,
        category: "Neuro Health",
        description: "Advanced neuroprotection formula",
        composition: "Methylcobalamin + Pregabalin + Alpha Lipoic Acid",
        packing: "10 Capsules Strip",
    },
];

/// Doctors offered on the marketing agreement form.
const DOCTORS: &[&str] = &["Dr. Sharma", "Dr. Mehta"];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Parse command line arguments
    let args: Vec<String> = env::args().collect();

    let mut db_path = String::from("./sanj.db");

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
                println!("Sanj Catalog Seeder");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>    Database file path (default: ./sanj.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("🌱 Sanj Catalog Seeder");
    println!("======================");
    println!("Database: {}", db_path);
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?;

    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    let existing = db.products().count().await?;
    if existing > 0 {
        println!("⚠ Database already has {} products", existing);
        println!("  Skipping seed to avoid duplicates.");
        return Ok(());
    }

    println!();
    println!("Loading catalog...");

    let mut loaded = 0;
    for item in CATALOG {
        let input = catalog_input(item)?;
        match db.products().create(&input).await {
            Ok(product) => {
                println!("  {:<24} {:<8} stock {:>4}", product.name, product.batch, product.current_stock);
                loaded += 1;
            }
            Err(e) => eprintln!("Failed to insert {}: {}", item.name, e),
        }
    }

    println!();
    println!("✓ Loaded {} of {} products", loaded, CATALOG.len());

    let mut registered = 0;
    for name in DOCTORS {
        match db.marketing().add_doctor(name).await {
            Ok(_) => registered += 1,
            Err(e) => eprintln!("Failed to register {}: {}", name, e),
        }
    }
    println!("✓ Registered {} doctors", registered);

    Ok(())
}

fn catalog_input(item: &CatalogItem) -> Result<ProductInput, Box<dyn std::error::Error>> {
    let (y, m, d) = item.expiry;
    let expiry = NaiveDate::from_ymd_opt(y, m, d).ok_or_else(|| format!("bad expiry for {}", item.name))?;

    Ok(ProductInput {
        name: item.name.to_string(),
        batch: item.batch.to_string(),
        expiry: Some(expiry),
        mrp: Money::from_rupees(item.mrp),
        gst: Rate::from_bps(item.gst_percent * 100),
        retailer_price: Some(Money::from_rupees(item.retailer)),
        stockist_price: Some(Money::from_rupees(item.stockist)),
        supplier_price: Money::from_rupees(item.supplier),
        bonus_scheme: Some(item.scheme.to_string()),
        opening_stock: item.stock,
        category: Some(item.category.to_string()),
        description: Some(item.description.to_string()),
        composition: Some(item.composition.to_string()),
        packing: Some(item.packing.to_string()),
    })
}
