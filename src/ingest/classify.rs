//! Row classification: one loosely-typed spreadsheet row → one typed asset.
//!
//! Column names are not fixed; every logical field resolves through an
//! ordered alias list, first present alias wins. Malformed or missing
//! numeric fields read as 0; a row never fails to classify.

use crate::models::{Asset, AssetCategory, CellValue, RawRow};

// ── Field aliases ─────────────────────────────────────────────────────────────

const QUANTITY: &[&str] = &["Quantity", "qty"];
const PURCHASE_PRICE: &[&str] = &["PurchasePrice", "Purchase Price", "cost"];
const CURRENT_PRICE: &[&str] = &["CurrentPrice", "Current Price", "price"];
const DIRECT_AMOUNT: &[&str] = &["Amount", "Profit", "Income", "Value", "Revenue"];
const MONTHLY_INCOME: &[&str] = &["Monthly Income", "Monthly Cashflow"];
const MONTHLY_PCT: &[&str] = &["Monthly %", "Monthly Percentage"];
const ANNUAL_PCT: &[&str] = &["APY", "Yield", "Coupon", "Annual %", "Dividend Yield"];
const SYMBOL: &[&str] = &["Symbol", "Ticker"];
const NAME: &[&str] = &["Name", "Asset"];

// ── Category keyword groups, tested in order, first match wins ────────────────

const CATEGORY_KEYWORDS: &[(AssetCategory, &[&str])] = &[
    (AssetCategory::Equity, &["stock", "equity", "share", "portfolio"]),
    (AssetCategory::Crypto, &["crypto", "bitcoin", "btc", "eth", "coin", "token"]),
    (AssetCategory::Fund, &["etf", "fund"]),
    (AssetCategory::Bond, &["bond", "debt", "treasury"]),
    (AssetCategory::Metal, &["metal", "gold", "silver", "platinum", "bullion"]),
    (
        AssetCategory::Royalty,
        &["royalty", "royalties", "book", "publish", "author", "copyright", "course"],
    ),
    (AssetCategory::Salary, &["salary", "wage", "paycheck", "employment", "job"]),
    (
        AssetCategory::Business,
        &["business", "startup", "company", "venture", "llc", "inc"],
    ),
    (AssetCategory::Rental, &["rent", "lease", "airbnb", "tenant"]),
    (
        AssetCategory::Trading,
        &["trading", "derivative", "option", "future", "day trade", "swing", "profit", "loss", "pnl"],
    ),
    (AssetCategory::Dividend, &["dividend", "coupon", "yield"]),
    (AssetCategory::Deposit, &["deposit", "bank", "cd", "certificate", "saving"]),
    (
        AssetCategory::Cash,
        &["cash", "fiat", "usd", "eur", "gbp", "currency", "money", "wallet"],
    ),
    (
        AssetCategory::Liability,
        &["liability", "loan", "mortgage", "debt", "credit", "borrow"],
    ),
    (AssetCategory::RealEstate, &["real estate", "property", "house", "land"]),
];

/// Name/symbol content that forces Liability when the row gave no explicit type.
const LIABILITY_HINTS: &[&str] = &["mortgage", "loan", "debt", "credit card", "creditcard", "liability"];

// ── Cell parsing ──────────────────────────────────────────────────────────────

/// Parse a monetary/numeric cell: strip everything except digits, dot, minus.
/// "$1,234.56" → 1234.56 | "610.00" → 610.0
pub fn parse_amount(s: &str) -> Option<f64> {
    let s = s.trim();
    if s.is_empty() || s == "N/A" || s == "-" || s == "—" {
        return None;
    }
    let cleaned: String = s
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.' || *c == '-')
        .collect();
    cleaned.parse().ok()
}

/// Parse a percent cell: "5%" → 5.0, "0.05" → 0.05.
pub fn parse_pct(s: &str) -> Option<f64> {
    let s = s.trim().replace('%', "").replace(',', "");
    if s.is_empty() || s == "N/A" || s == "-" {
        return None;
    }
    s.parse().ok()
}

fn cell_number(cell: &CellValue) -> Option<f64> {
    match cell {
        CellValue::Number(n) => Some(*n),
        CellValue::Text(s) => parse_amount(s),
        CellValue::Bool(_) => None,
    }
}

fn cell_pct(cell: &CellValue) -> Option<f64> {
    match cell {
        CellValue::Number(n) => Some(*n),
        CellValue::Text(s) => parse_pct(s),
        CellValue::Bool(_) => None,
    }
}

// ── Alias resolution ──────────────────────────────────────────────────────────

/// First present alias wins; an unparsable cell reads as 0.
fn resolve_number(row: &RawRow, aliases: &[&str]) -> f64 {
    aliases
        .iter()
        .find_map(|a| row.get(a))
        .and_then(cell_number)
        .unwrap_or(0.0)
}

/// First alias carrying a non-zero value. Zero-valued fields do not trigger
/// the income rules, matching the source data's conventions.
fn resolve_nonzero(row: &RawRow, aliases: &[&str]) -> Option<f64> {
    aliases
        .iter()
        .filter_map(|a| row.get(a))
        .filter_map(cell_number)
        .find(|v| *v != 0.0)
}

fn resolve_nonzero_pct(row: &RawRow, aliases: &[&str]) -> Option<f64> {
    aliases
        .iter()
        .filter_map(|a| row.get(a))
        .filter_map(cell_pct)
        .find(|v| *v != 0.0)
}

/// Fractional percent cells come pre-normalized by the spreadsheet (5% is
/// stored as 0.05); hand-typed ones arrive as 5. Magnitudes below 1 are
/// scaled up. A true sub-1% rate is indistinguishable from a pre-normalized
/// one here.
fn normalize_pct(pct: f64) -> f64 {
    if pct.abs() < 1.0 { pct * 100.0 } else { pct }
}

// ── Category ──────────────────────────────────────────────────────────────────

/// Keyword groups are tested in declaration order against the lowercased
/// source string; no match falls through to Other.
pub fn classify_category(source: &str) -> AssetCategory {
    let s = source.trim().to_lowercase();
    for (category, keywords) in CATEGORY_KEYWORDS {
        if keywords.iter().any(|k| s.contains(k)) {
            return *category;
        }
    }
    AssetCategory::Other
}

fn sanitize_sheet_name(sheet: &str) -> String {
    sheet.chars().filter(|c| c.is_ascii_alphanumeric()).collect()
}

// ── Row → Asset ───────────────────────────────────────────────────────────────

/// Classify one row of a non-plan sheet. Never fails: absent fields default,
/// and the resulting asset may carry total_value 0 (the ingestor drops those
/// after all sheets are read).
pub fn classify_row(row: &RawRow, sheet_name: &str, index: usize, batch_token: i64) -> Asset {
    let mut quantity = resolve_number(row, QUANTITY);
    let purchase_price = resolve_number(row, PURCHASE_PRICE);
    let mut current_price = resolve_number(row, CURRENT_PRICE);

    let mut total_value = quantity * current_price;
    let mut total_cost = quantity * purchase_price;

    // Income-style rows (royalties, trading P/L) have no quantity×price;
    // fall back to a direct monetary amount.
    if total_value == 0.0 {
        if let Some(amount) = resolve_nonzero(row, DIRECT_AMOUNT) {
            total_value = amount;
            total_cost = purchase_price;
            if quantity == 0.0 {
                quantity = 1.0;
            }
            if current_price == 0.0 {
                current_price = total_value;
            }
        }
    }

    // Income-rate rules in strict priority order; the first matching rule
    // wins and later ones are never evaluated.
    let mut projected_monthly_income = 0.0;
    let mut income_yield = 0.0;

    if let Some(monthly) = resolve_nonzero(row, MONTHLY_INCOME) {
        projected_monthly_income = monthly;
        if total_value > 0.0 {
            income_yield = monthly * 12.0 / total_value * 100.0;
        }
    } else if let Some(raw) = resolve_nonzero_pct(row, MONTHLY_PCT) {
        let pct = normalize_pct(raw);
        projected_monthly_income = total_value * pct / 100.0;
        income_yield = pct * 12.0;
    } else if let Some(raw) = resolve_nonzero_pct(row, ANNUAL_PCT) {
        let pct = normalize_pct(raw);
        income_yield = pct;
        projected_monthly_income = total_value * pct / 100.0 / 12.0;
    }

    let profit = total_value - total_cost;
    let profit_percentage = if total_cost == 0.0 {
        0.0
    } else {
        profit / total_cost * 100.0
    };

    let raw_symbol = row.first_text(SYMBOL);
    let raw_name = row.first_text(NAME);

    let explicit_type = row.get("Type").map(CellValue::as_text);
    let mut category = match &explicit_type {
        Some(t) => classify_category(t),
        None => classify_category(sheet_name),
    };

    // Loan-ish names override keyword classification, but only when the row
    // gave no explicit type.
    if explicit_type.is_none() {
        let content = format!(
            "{} {}",
            raw_name.as_deref().unwrap_or(""),
            raw_symbol.as_deref().unwrap_or("")
        )
        .to_lowercase();
        if LIABILITY_HINTS.iter().any(|h| content.contains(h)) {
            category = AssetCategory::Liability;
        }
    }

    Asset {
        id: format!(
            "asset-{}-{}-{}",
            sanitize_sheet_name(sheet_name),
            index,
            batch_token
        ),
        symbol: raw_symbol.unwrap_or_else(|| "INC".into()).to_uppercase(),
        name: raw_name.unwrap_or_else(|| "Unknown Asset".into()),
        category,
        quantity,
        purchase_price,
        current_price,
        total_value,
        total_cost,
        profit,
        profit_percentage,
        income_yield,
        projected_monthly_income,
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn row(cells: &[(&str, CellValue)]) -> RawRow {
        let mut r = RawRow::new();
        for (k, v) in cells {
            r.insert(*k, v.clone());
        }
        r
    }

    fn num(n: f64) -> CellValue {
        CellValue::Number(n)
    }

    fn text(s: &str) -> CellValue {
        CellValue::Text(s.into())
    }

    #[test]
    fn test_parse_amount() {
        assert_eq!(parse_amount("$1,234.56"), Some(1234.56));
        assert_eq!(parse_amount("610.00"), Some(610.0));
        assert_eq!(parse_amount("-400"), Some(-400.0));
        assert_eq!(parse_amount("N/A"), None);
        assert_eq!(parse_amount(""), None);
    }

    #[test]
    fn test_btc_row_from_sheet_name() {
        let r = row(&[
            ("Symbol", text("BTC")),
            ("Quantity", num(0.5)),
            ("PurchasePrice", num(45000.0)),
            ("CurrentPrice", num(65000.0)),
        ]);
        let asset = classify_row(&r, "Crypto Assets", 0, 1);

        assert_eq!(asset.category, AssetCategory::Crypto);
        assert_eq!(asset.total_value, 32500.0);
        assert_eq!(asset.total_cost, 22500.0);
        assert_eq!(asset.profit, 10000.0);
        assert!((asset.profit_percentage - 44.4444).abs() < 0.01);
    }

    #[test]
    fn test_royalty_income_row() {
        let r = row(&[
            ("Name", text("Kindle Book Royalties")),
            ("Type", text("Royalty")),
            ("Amount", num(300.0)),
            ("Monthly Income", num(300.0)),
        ]);
        let asset = classify_row(&r, "Income Sources", 1, 1);

        assert_eq!(asset.category, AssetCategory::Royalty);
        assert_eq!(asset.total_value, 300.0);
        assert_eq!(asset.quantity, 1.0);
        assert_eq!(asset.current_price, 300.0);
        assert_eq!(asset.projected_monthly_income, 300.0);
        assert_eq!(asset.income_yield, 1200.0);
        assert_eq!(asset.symbol, "INC");
    }

    #[test]
    fn test_liability_override_without_type() {
        let r = row(&[
            ("Symbol", text("MORTGAGE")),
            ("Name", text("Home Loan")),
            ("Quantity", num(1.0)),
            ("PurchasePrice", num(350000.0)),
            ("CurrentPrice", num(320000.0)),
        ]);
        // sheet name would classify as equity ("portfolio")
        let asset = classify_row(&r, "Portfolio", 0, 1);
        assert_eq!(asset.category, AssetCategory::Liability);
    }

    #[test]
    fn test_explicit_type_beats_liability_hint() {
        let r = row(&[
            ("Symbol", text("MORTGAGE")),
            ("Name", text("Home Loan Fund")),
            ("Type", text("Fund")),
            ("Quantity", num(1.0)),
            ("CurrentPrice", num(100.0)),
        ]);
        let asset = classify_row(&r, "Misc", 0, 1);
        assert_eq!(asset.category, AssetCategory::Fund);
    }

    #[test]
    fn test_income_rule_priority_is_strict() {
        // Both a monthly-income and an annual-yield field: only rule 1 runs.
        let r = row(&[
            ("Name", text("Rental Apartment")),
            ("Type", text("Real Estate")),
            ("Quantity", num(1.0)),
            ("CurrentPrice", num(240000.0)),
            ("Monthly Income", num(1000.0)),
            ("Yield", num(99.0)),
        ]);
        let asset = classify_row(&r, "Real Estate", 0, 1);

        assert_eq!(asset.projected_monthly_income, 1000.0);
        // 1000 × 12 / 240000 × 100 = 5, not the bogus 99 from rule 3
        assert_eq!(asset.income_yield, 5.0);
    }

    #[test]
    fn test_percent_heuristic_normalizes_fractions() {
        let make = |apy: f64| {
            let r = row(&[
                ("Name", text("High Yield Savings")),
                ("Type", text("Deposit")),
                ("Quantity", num(1.0)),
                ("CurrentPrice", num(20000.0)),
                ("APY", num(apy)),
            ]);
            classify_row(&r, "Bonds and Deposits", 0, 1)
        };

        let fractional = make(0.05);
        let plain = make(5.0);
        assert_eq!(fractional.income_yield, 5.0);
        assert_eq!(plain.income_yield, 5.0);
        assert_eq!(
            fractional.projected_monthly_income,
            plain.projected_monthly_income
        );
    }

    #[test]
    fn test_direct_amount_keeps_negative_values() {
        let r = row(&[
            ("Symbol", text("CRYPTO-DAY")),
            ("Name", text("Crypto Day Trading")),
            ("Amount", num(-400.0)),
        ]);
        let asset = classify_row(&r, "Investment profit loss", 1, 1);

        assert_eq!(asset.total_value, -400.0);
        assert_eq!(asset.quantity, 1.0);
        assert_eq!(asset.current_price, -400.0);
        assert_eq!(asset.category, AssetCategory::Trading);
    }

    #[test]
    fn test_malformed_row_defaults_to_zero() {
        let r = row(&[
            ("Quantity", text("not a number")),
            ("CurrentPrice", text("N/A")),
        ]);
        let asset = classify_row(&r, "Mystery", 3, 1);

        assert_eq!(asset.total_value, 0.0);
        assert_eq!(asset.category, AssetCategory::Other);
        assert_eq!(asset.name, "Unknown Asset");
        assert_eq!(asset.profit_percentage, 0.0);
    }

    #[test]
    fn test_pct_cell_as_text() {
        let r = row(&[
            ("Name", text("T-Bill")),
            ("Type", text("Bond")),
            ("Quantity", num(100.0)),
            ("CurrentPrice", num(98.0)),
            ("Coupon", text("4.5%")),
        ]);
        let asset = classify_row(&r, "Bonds", 0, 1);
        assert_eq!(asset.income_yield, 4.5);
    }

    #[test]
    fn test_ids_unique_within_batch() {
        let r = row(&[("Symbol", text("A")), ("Quantity", num(1.0)), ("price", num(2.0))]);
        let a = classify_row(&r, "Sheet One", 0, 7);
        let b = classify_row(&r, "Sheet One", 1, 7);
        let c = classify_row(&r, "Sheet Two!", 0, 7);
        assert_ne!(a.id, b.id);
        assert_ne!(a.id, c.id);
        assert_eq!(a.id, "asset-SheetOne-0-7");
    }
}
