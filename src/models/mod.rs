use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// ── Asset categories ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AssetCategory {
    Equity,
    Crypto,
    #[serde(rename = "Real Estate")]
    RealEstate,
    Cash,
    Bond,
    Fund,
    Metal,
    Business,
    Rental,
    Trading,
    Royalty,
    Salary,
    Deposit,
    Dividend,
    Liability,
    Other,
}

/// Coarse grouping used for partitioning and presentation. Every category
/// maps to exactly one group; summary math derives its income/liability
/// splits from this table rather than matching categories ad hoc.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CategoryGroup {
    Foundation,
    Investment,
    Speculative,
    Income,
    Liability,
}

impl AssetCategory {
    pub fn group(&self) -> CategoryGroup {
        use AssetCategory::*;
        match self {
            Cash | Deposit | Bond | RealEstate => CategoryGroup::Foundation,
            Equity | Fund | Metal => CategoryGroup::Investment,
            Crypto | Other => CategoryGroup::Speculative,
            Business | Rental | Trading | Royalty | Salary | Dividend => CategoryGroup::Income,
            Liability => CategoryGroup::Liability,
        }
    }

    /// Income streams (salary, royalties, trading P/L, …) are counted as
    /// period income, never as portfolio holdings.
    pub fn is_income(&self) -> bool {
        self.group() == CategoryGroup::Income
    }

    pub fn is_liability(&self) -> bool {
        self.group() == CategoryGroup::Liability
    }

    pub fn label(&self) -> &'static str {
        use AssetCategory::*;
        match self {
            Equity => "Equity",
            Crypto => "Crypto",
            RealEstate => "Real Estate",
            Cash => "Cash",
            Bond => "Bond",
            Fund => "Fund",
            Metal => "Metal",
            Business => "Business",
            Rental => "Rental",
            Trading => "Trading",
            Royalty => "Royalty",
            Salary => "Salary",
            Deposit => "Deposit",
            Dividend => "Dividend",
            Liability => "Liability",
            Other => "Other",
        }
    }
}

// ── Asset ────────────────────────────────────────────────────────────────────

/// One ledger line produced by ingestion. Immutable after the batch is
/// built; a re-ingestion replaces the whole batch.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Asset {
    pub id: String,
    pub symbol: String,
    pub name: String,
    pub category: AssetCategory,
    pub quantity: f64,
    pub purchase_price: f64,
    pub current_price: f64,
    pub total_value: f64,
    pub total_cost: f64,
    pub profit: f64,
    pub profit_percentage: f64,
    /// Annualized percent, 0 when not derivable.
    pub income_yield: f64,
    /// Currency per month, 0 default.
    pub projected_monthly_income: f64,
}

// ── Financial plans ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlanStatus {
    Pending,
    #[serde(rename = "In Progress")]
    InProgress,
    Completed,
    Rejected,
}

impl PlanStatus {
    /// Unknown strings fall back to Pending.
    pub fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "in progress" | "in-progress" | "inprogress" => PlanStatus::InProgress,
            "completed" | "done" => PlanStatus::Completed,
            "rejected" => PlanStatus::Rejected,
            _ => PlanStatus::Pending,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            PlanStatus::Pending => "Pending",
            PlanStatus::InProgress => "In Progress",
            PlanStatus::Completed => "Completed",
            PlanStatus::Rejected => "Rejected",
        }
    }
}

/// Goal entry from a plan/goal/future/target sheet.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FinancialPlan {
    pub id: String,
    pub quarter: String,
    pub goal: String,
    pub status: PlanStatus,
    pub notes: Option<String>,
}

// ── Ingested batch ───────────────────────────────────────────────────────────

/// Everything one ingestion produced. Persisted wholesale under a single
/// key; a new ingestion overwrites it.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PortfolioBatch {
    pub assets: Vec<Asset>,
    pub plans: Vec<FinancialPlan>,
}

impl PortfolioBatch {
    pub fn is_empty(&self) -> bool {
        self.assets.is_empty() && self.plans.is_empty()
    }
}

// ── Portfolio summary ────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AllocationSlice {
    pub category: AssetCategory,
    pub value: f64,
}

/// Derived view over the current asset list. Recomputed on demand, never
/// persisted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PortfolioSummary {
    pub net_worth: f64,
    pub total_assets_value: f64,
    pub total_liabilities_value: f64,
    pub total_profit: f64,
    pub profit_percentage: f64,
    /// Income realized this period (sum of income-category values), not a rate.
    pub total_income: f64,
    pub projected_monthly_passive_income: f64,
    /// Portfolio categories only, sorted descending by value.
    pub asset_allocation: Vec<AllocationSlice>,
    pub top_performer: Option<Asset>,
    pub worst_performer: Option<Asset>,
}

// ── Net-worth history ────────────────────────────────────────────────────────

/// One persisted time-series point. The history list holds at most one
/// item per UTC calendar day, ascending by date.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PortfolioHistoryItem {
    pub id: String,
    pub date: DateTime<Utc>,
    pub net_worth: f64,
    pub total_assets: f64,
    pub total_liabilities: f64,
    pub total_income: f64,
}

// ── Raw spreadsheet rows ─────────────────────────────────────────────────────

/// A single cell as read from a workbook, before any interpretation.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Number(f64),
    Text(String),
    Bool(bool),
}

impl CellValue {
    /// Cell content as displayed text (whole numbers rendered without ".0").
    pub fn as_text(&self) -> String {
        match self {
            CellValue::Number(n) => {
                if n.fract() == 0.0 && n.abs() < 1e15 {
                    format!("{}", *n as i64)
                } else {
                    format!("{}", n)
                }
            }
            CellValue::Text(s) => s.clone(),
            CellValue::Bool(b) => b.to_string(),
        }
    }
}

/// One row keyed by its sheet's header names. Column names are not fixed;
/// logical fields are resolved through ordered alias lists.
#[derive(Debug, Clone, Default)]
pub struct RawRow {
    cells: HashMap<String, CellValue>,
}

impl RawRow {
    pub fn new() -> Self {
        Self::default()
    }

    /// Empty text cells are not recorded; an absent key means an absent field.
    pub fn insert(&mut self, header: impl Into<String>, value: CellValue) {
        if let CellValue::Text(s) = &value {
            if s.trim().is_empty() {
                return;
            }
        }
        self.cells.insert(header.into(), value);
    }

    /// Case-sensitive header lookup.
    pub fn get(&self, header: &str) -> Option<&CellValue> {
        self.cells.get(header)
    }

    /// First present alias, rendered as text.
    pub fn first_text(&self, aliases: &[&str]) -> Option<String> {
        aliases.iter().find_map(|a| self.get(a)).map(CellValue::as_text)
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_groups_partition() {
        use AssetCategory::*;
        let all = [
            Equity, Crypto, RealEstate, Cash, Bond, Fund, Metal, Business, Rental, Trading,
            Royalty, Salary, Deposit, Dividend, Liability, Other,
        ];
        for cat in all {
            assert!(!(cat.is_income() && cat.is_liability()));
        }
        assert!(Royalty.is_income());
        assert!(Trading.is_income());
        assert!(Liability.is_liability());
        assert!(!Deposit.is_income());
        assert_eq!(Deposit.group(), CategoryGroup::Foundation);
    }

    #[test]
    fn test_plan_status_parse() {
        assert_eq!(PlanStatus::parse("In Progress"), PlanStatus::InProgress);
        assert_eq!(PlanStatus::parse("completed"), PlanStatus::Completed);
        assert_eq!(PlanStatus::parse("whatever"), PlanStatus::Pending);
        assert_eq!(PlanStatus::parse(""), PlanStatus::Pending);
    }

    #[test]
    fn test_raw_row_skips_blank_text() {
        let mut row = RawRow::new();
        row.insert("Name", CellValue::Text("  ".into()));
        row.insert("Quantity", CellValue::Number(2.0));
        assert!(row.get("Name").is_none());
        assert!(row.get("Quantity").is_some());
    }
}
