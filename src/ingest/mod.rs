//! Workbook ingestion: spreadsheet file → (assets, plans).
//!
//! Sheets whose name matches a plan pattern become financial plans; every
//! other sheet runs through the row classifier. Ingestion is all-or-nothing:
//! an unreadable workbook aborts with no partial result, while individual
//! malformed rows are skipped with a warning.

pub mod classify;
pub mod template;

use crate::error::IngestError;
use crate::models::{CellValue, FinancialPlan, PlanStatus, PortfolioBatch, RawRow};
use calamine::{open_workbook_auto, open_workbook_auto_from_rs, Data, Reader};
use chrono::Utc;
use std::io::Cursor;
use std::path::Path;
use tracing::{debug, info, warn};

use self::classify::classify_row;

// ── Plan sheets ───────────────────────────────────────────────────────────────

const PLAN_SHEET_HINTS: &[&str] = &["plan", "future", "goal", "target"];

const PLAN_QUARTER: &[&str] = &["Quarter", "Period"];
const PLAN_GOAL: &[&str] = &["Goal", "Target", "Plan"];
const PLAN_STATUS: &[&str] = &["Status"];
const PLAN_NOTES: &[&str] = &["Notes"];

pub fn is_plan_sheet(name: &str) -> bool {
    let name = name.to_lowercase();
    PLAN_SHEET_HINTS.iter().any(|h| name.contains(h))
}

fn plan_from_row(row: &RawRow, index: usize) -> FinancialPlan {
    FinancialPlan {
        id: format!("plan-{}", index),
        quarter: row.first_text(PLAN_QUARTER).unwrap_or_else(|| "Q1".into()),
        goal: row.first_text(PLAN_GOAL).unwrap_or_default(),
        status: row
            .first_text(PLAN_STATUS)
            .map(|s| PlanStatus::parse(&s))
            .unwrap_or(PlanStatus::Pending),
        notes: row.first_text(PLAN_NOTES),
    }
}

// ── Entry points ──────────────────────────────────────────────────────────────

/// Ingest a workbook from disk. The extension picks the reader: .xlsx/.xls
/// via calamine, .csv as a single-sheet workbook named after the file stem.
pub fn ingest_file(path: &Path) -> Result<PortfolioBatch, IngestError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase();

    let sheets = match ext.as_str() {
        "xlsx" | "xls" => {
            let workbook = open_workbook_auto(path)?;
            read_sheets(workbook)?
        }
        "csv" => vec![read_csv(path)?],
        other => return Err(IngestError::UnsupportedExtension(other.to_string())),
    };

    Ok(assemble(sheets))
}

/// Ingest a workbook already held in memory (the remote-fetch path).
pub fn ingest_bytes(bytes: Vec<u8>) -> Result<PortfolioBatch, IngestError> {
    let workbook = open_workbook_auto_from_rs(Cursor::new(bytes))?;
    Ok(assemble(read_sheets(workbook)?))
}

// ── Workbook reading ──────────────────────────────────────────────────────────

fn cell_from_data(data: &Data) -> Option<CellValue> {
    match data {
        Data::Empty | Data::Error(_) => None,
        Data::String(s) => Some(CellValue::Text(s.clone())),
        Data::Float(f) => Some(CellValue::Number(*f)),
        Data::Int(i) => Some(CellValue::Number(*i as f64)),
        Data::Bool(b) => Some(CellValue::Bool(*b)),
        Data::DateTime(dt) => Some(CellValue::Number(dt.as_f64())),
        Data::DateTimeIso(s) | Data::DurationIso(s) => Some(CellValue::Text(s.clone())),
    }
}

fn read_sheets<RS>(
    mut workbook: calamine::Sheets<RS>,
) -> Result<Vec<(String, Vec<RawRow>)>, IngestError>
where
    RS: std::io::Read + std::io::Seek,
{
    let mut sheets = Vec::new();

    for sheet_name in workbook.sheet_names().to_owned() {
        let range = workbook.worksheet_range(&sheet_name)?;
        let mut rows_iter = range.rows();

        let Some(header_row) = rows_iter.next() else {
            debug!("{}: empty sheet, skipping", sheet_name);
            continue;
        };
        let headers: Vec<String> = header_row
            .iter()
            .map(|c| c.to_string().trim().to_string())
            .collect();

        let mut rows = Vec::new();
        for cells in rows_iter {
            let mut row = RawRow::new();
            for (header, cell) in headers.iter().zip(cells.iter()) {
                if header.is_empty() {
                    continue;
                }
                if let Some(value) = cell_from_data(cell) {
                    row.insert(header.clone(), value);
                }
            }
            if !row.is_empty() {
                rows.push(row);
            }
        }

        info!("{}: {} rows", sheet_name, rows.len());
        sheets.push((sheet_name, rows));
    }

    Ok(sheets)
}

fn read_csv(path: &Path) -> Result<(String, Vec<RawRow>), IngestError> {
    let sheet_name = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("Sheet1")
        .to_string();

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(path)?;

    let headers: Vec<String> = reader
        .headers()?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    let mut rows = Vec::new();
    for (i, result) in reader.records().enumerate() {
        let record = match result {
            Ok(r) => r,
            Err(e) => {
                warn!("Row {} in {:?}: {}", i + 1, path, e);
                continue;
            }
        };

        let mut row = RawRow::new();
        for (header, field) in headers.iter().zip(record.iter()) {
            if header.is_empty() {
                continue;
            }
            row.insert(header.clone(), CellValue::Text(field.to_string()));
        }
        if !row.is_empty() {
            rows.push(row);
        }
    }

    info!("{}: {} rows", sheet_name, rows.len());
    Ok((sheet_name, rows))
}

// ── Assembly ──────────────────────────────────────────────────────────────────

/// Route sheets, classify rows, then drop every asset whose value came out
/// as exactly 0 (placeholder and fully-blank rows).
fn assemble(sheets: Vec<(String, Vec<RawRow>)>) -> PortfolioBatch {
    let batch_token = Utc::now().timestamp_millis();
    let mut assets = Vec::new();
    let mut plans = Vec::new();

    for (sheet_name, rows) in sheets {
        if is_plan_sheet(&sheet_name) {
            for row in &rows {
                plans.push(plan_from_row(row, plans.len()));
            }
            continue;
        }

        for (index, row) in rows.iter().enumerate() {
            assets.push(classify_row(row, &sheet_name, index, batch_token));
        }
    }

    assets.retain(|a| a.total_value != 0.0);
    PortfolioBatch { assets, plans }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AssetCategory;
    use std::io::Write;

    fn text_cell(s: &str) -> CellValue {
        CellValue::Text(s.into())
    }

    fn row(cells: &[(&str, CellValue)]) -> RawRow {
        let mut r = RawRow::new();
        for (k, v) in cells {
            r.insert(*k, v.clone());
        }
        r
    }

    #[test]
    fn test_is_plan_sheet() {
        assert!(is_plan_sheet("Future Plans"));
        assert!(is_plan_sheet("2025 goals"));
        assert!(is_plan_sheet("Targets"));
        assert!(!is_plan_sheet("Crypto Assets"));
    }

    #[test]
    fn test_plan_sheets_never_produce_assets() {
        let sheets = vec![(
            "Future Plans".to_string(),
            vec![
                row(&[
                    ("Quarter", text_cell("Q4 2024")),
                    ("Goal", text_cell("Reach $10k monthly passive income")),
                    ("Status", text_cell("In Progress")),
                ]),
                row(&[("Period", text_cell("Q1 2025")), ("Target", text_cell("Buy gold"))]),
            ],
        )];

        let batch = assemble(sheets);
        assert!(batch.assets.is_empty());
        assert_eq!(batch.plans.len(), 2);
        assert_eq!(batch.plans[0].status, PlanStatus::InProgress);
        assert_eq!(batch.plans[0].quarter, "Q4 2024");
        assert_eq!(batch.plans[1].goal, "Buy gold");
        assert_eq!(batch.plans[1].status, PlanStatus::Pending);
        assert_eq!(batch.plans[1].id, "plan-1");
    }

    #[test]
    fn test_zero_value_assets_are_dropped() {
        let sheets = vec![(
            "Stocks".to_string(),
            vec![
                row(&[
                    ("Symbol", text_cell("AAPL")),
                    ("Quantity", CellValue::Number(50.0)),
                    ("CurrentPrice", CellValue::Number(180.0)),
                ]),
                // a notes-only row classifies to value 0 and must vanish
                row(&[("Name", text_cell("remember to rebalance"))]),
            ],
        )];

        let batch = assemble(sheets);
        assert_eq!(batch.assets.len(), 1);
        assert_eq!(batch.assets[0].symbol, "AAPL");
    }

    #[test]
    fn test_assemble_is_idempotent_modulo_ids() {
        let sheets = || {
            vec![(
                "Crypto".to_string(),
                vec![row(&[
                    ("Symbol", text_cell("BTC")),
                    ("Quantity", CellValue::Number(0.5)),
                    ("PurchasePrice", CellValue::Number(45000.0)),
                    ("CurrentPrice", CellValue::Number(65000.0)),
                ])],
            )]
        };

        let a = assemble(sheets());
        let b = assemble(sheets());
        assert_eq!(a.assets.len(), b.assets.len());
        let (x, y) = (&a.assets[0], &b.assets[0]);
        assert_eq!(x.symbol, y.symbol);
        assert_eq!(x.total_value, y.total_value);
        assert_eq!(x.total_cost, y.total_cost);
        assert_eq!(x.category, y.category);
    }

    #[test]
    fn test_ingest_csv_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Crypto Holdings.csv");
        let mut f = std::fs::File::create(&path).unwrap();
        writeln!(f, "Symbol,Name,Quantity,PurchasePrice,CurrentPrice").unwrap();
        writeln!(f, "BTC,Bitcoin,0.5,45000,65000").unwrap();
        writeln!(f, "ETH,Ethereum,5,2500,3500").unwrap();

        let batch = ingest_file(&path).unwrap();
        assert_eq!(batch.assets.len(), 2);
        // sheet name comes from the file stem, so the filename classifies
        assert_eq!(batch.assets[0].category, AssetCategory::Crypto);
        assert_eq!(batch.assets[0].total_value, 32500.0);
    }

    #[test]
    fn test_unsupported_extension() {
        let err = ingest_file(Path::new("portfolio.pdf")).unwrap_err();
        assert!(matches!(err, IngestError::UnsupportedExtension(e) if e == "pdf"));
    }
}
