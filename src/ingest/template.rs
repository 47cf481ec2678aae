//! Canonical multi-sheet sample workbook, used for onboarding. The sheet
//! and column layout exercises every classification path: quantity×price
//! holdings, income rows with direct amounts, yield fields, liabilities and
//! a plan sheet.

use anyhow::Result;
use rust_xlsxwriter::Workbook;
use std::path::Path;
use tracing::info;

enum Cell {
    S(&'static str),
    N(f64),
    Blank,
}

use Cell::{Blank, N, S};

fn write_sheet(
    workbook: &mut Workbook,
    name: &str,
    headers: &[&str],
    rows: &[&[Cell]],
) -> Result<()> {
    let sheet = workbook.add_worksheet().set_name(name)?;

    for (col, header) in headers.iter().enumerate() {
        sheet.write_string(0, col as u16, *header)?;
    }
    for (r, row) in rows.iter().enumerate() {
        for (c, cell) in row.iter().enumerate() {
            match cell {
                S(s) => {
                    sheet.write_string((r + 1) as u32, c as u16, *s)?;
                }
                N(n) => {
                    sheet.write_number((r + 1) as u32, c as u16, *n)?;
                }
                Blank => {}
            }
        }
    }
    Ok(())
}

/// Write the fixed sample template to `path`.
pub fn write_sample_template(path: &Path) -> Result<()> {
    let mut workbook = Workbook::new();

    write_sheet(
        &mut workbook,
        "Crypto Assets",
        &["Symbol", "Name", "Quantity", "PurchasePrice", "CurrentPrice"],
        &[
            &[S("BTC"), S("Bitcoin"), N(0.5), N(45000.0), N(65000.0)],
            &[S("ETH"), S("Ethereum"), N(5.0), N(2500.0), N(3500.0)],
            &[S("SOL"), S("Solana"), N(100.0), N(80.0), N(140.0)],
        ],
    )?;

    write_sheet(
        &mut workbook,
        "Stocks",
        &[
            "Symbol",
            "Name",
            "Type",
            "Quantity",
            "PurchasePrice",
            "CurrentPrice",
            "Dividend Yield",
        ],
        &[
            &[S("AAPL"), S("Apple Inc."), S("Stock"), N(50.0), N(150.0), N(180.0), Blank],
            &[S("VOO"), S("Vanguard S&P 500"), S("ETF"), N(20.0), N(380.0), N(450.0), Blank],
            &[S("KO"), S("Coca-Cola"), S("Stock"), N(100.0), N(55.0), N(60.0), N(3.1)],
        ],
    )?;

    write_sheet(
        &mut workbook,
        "Real Estate",
        &[
            "Symbol",
            "Name",
            "Type",
            "Quantity",
            "PurchasePrice",
            "CurrentPrice",
            "Monthly Income",
        ],
        &[
            &[
                S("HOME"),
                S("Primary Residence"),
                S("Real Estate"),
                N(1.0),
                N(400000.0),
                N(550000.0),
                Blank,
            ],
            &[
                S("APT-1"),
                S("Rental Apartment"),
                S("Real Estate"),
                N(1.0),
                N(200000.0),
                N(250000.0),
                N(1500.0),
            ],
        ],
    )?;

    write_sheet(
        &mut workbook,
        "Bonds and Deposits",
        &[
            "Symbol",
            "Name",
            "Type",
            "Quantity",
            "PurchasePrice",
            "CurrentPrice",
            "Coupon",
            "APY",
        ],
        &[
            &[
                S("US-10Y"),
                S("US Treasury Bond"),
                S("Bond"),
                N(100.0),
                N(95.0),
                N(98.0),
                N(4.5),
                Blank,
            ],
            &[
                S("HYSA"),
                S("High Yield Savings"),
                S("Deposit"),
                N(1.0),
                N(20000.0),
                N(20000.0),
                Blank,
                N(5.0),
            ],
        ],
    )?;

    write_sheet(
        &mut workbook,
        "Metals",
        &["Symbol", "Name", "Quantity", "PurchasePrice", "CurrentPrice"],
        &[
            &[S("GOLD"), S("Gold Bar 1oz"), N(5.0), N(1800.0), N(2100.0)],
            &[S("SILVER"), S("Silver Coin"), N(50.0), N(22.0), N(26.0)],
        ],
    )?;

    write_sheet(
        &mut workbook,
        "Income Sources",
        &["Symbol", "Name", "Type", "Amount", "Monthly Income"],
        &[
            &[S("JOB"), S("Tech Salary"), S("Salary"), N(5000.0), N(5000.0)],
            &[S("BOOK"), S("Kindle Book Royalties"), S("Royalty"), N(300.0), N(300.0)],
            &[S("CONSULT"), S("Consulting Business"), S("Business"), N(2000.0), N(2000.0)],
        ],
    )?;

    write_sheet(
        &mut workbook,
        "Investment profit loss",
        &["Symbol", "Name", "Amount"],
        &[
            &[S("SPY-SWING"), S("S&P Swing Profit Sep"), N(1200.0)],
            &[S("CRYPTO-DAY"), S("Crypto Day Trading"), N(-400.0)],
        ],
    )?;

    write_sheet(
        &mut workbook,
        "Liabilities",
        &["Symbol", "Name", "Quantity", "PurchasePrice", "CurrentPrice"],
        &[
            &[S("MORTGAGE"), S("Home Loan"), N(1.0), N(350000.0), N(320000.0)],
            &[S("VISA"), S("Credit Card Debt"), N(1.0), N(2500.0), N(2500.0)],
        ],
    )?;

    write_sheet(
        &mut workbook,
        "Future Plans",
        &["Quarter", "Goal", "Status"],
        &[
            &[S("Q4 2024"), S("Reach $10k monthly passive income"), S("In Progress")],
            &[S("Q1 2025"), S("Buy 5 more oz of Gold"), S("Pending")],
        ],
    )?;

    workbook.save(path)?;
    info!("Sample template written to {:?}", path);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::ingest_file;
    use crate::models::AssetCategory;

    #[test]
    fn test_template_round_trips_through_ingestion() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("template.xlsx");
        write_sample_template(&path).unwrap();

        let batch = ingest_file(&path).unwrap();

        // 21 data rows total, 2 of them plans; every asset row carries value
        assert_eq!(batch.plans.len(), 2);
        assert_eq!(batch.assets.len(), 19);
        assert!(batch.assets.iter().all(|a| a.total_value != 0.0));

        let btc = batch.assets.iter().find(|a| a.symbol == "BTC").unwrap();
        assert_eq!(btc.category, AssetCategory::Crypto);
        assert_eq!(btc.total_value, 32500.0);

        let mortgage = batch.assets.iter().find(|a| a.symbol == "MORTGAGE").unwrap();
        assert_eq!(mortgage.category, AssetCategory::Liability);

        let royalty = batch.assets.iter().find(|a| a.symbol == "BOOK").unwrap();
        assert_eq!(royalty.projected_monthly_income, 300.0);
        assert_eq!(royalty.income_yield, 1200.0);
    }
}
