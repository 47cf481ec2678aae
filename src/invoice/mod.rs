//! Invoice intake: document payloads, the concurrent extraction batch and
//! the CSV export. Each file's round trip is independent; a failed file
//! occupies its slot in the outcome list instead of blocking the batch.

use crate::ai::extract::{DocumentPayload, InvoiceExtractor};
use crate::error::ExtractError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::{error, warn};

// ── Domain model ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InvoiceStatus {
    Draft,
    Reviewed,
    Approved,
    Paid,
}

impl InvoiceStatus {
    pub fn label(&self) -> &'static str {
        match self {
            InvoiceStatus::Draft => "Draft",
            InvoiceStatus::Reviewed => "Reviewed",
            InvoiceStatus::Approved => "Approved",
            InvoiceStatus::Paid => "Paid",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LineItem {
    pub description: String,
    pub quantity: f64,
    pub unit_price: f64,
    pub total: f64,
    /// Set when the description prefix-matches one of the configured
    /// keywords (case insensitive).
    pub selected: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InvoiceRecord {
    pub id: String,
    pub vendor_name: String,
    pub invoice_number: String,
    pub account_number: Option<String>,
    pub city: Option<String>,
    pub date: String,
    pub due_date: String,
    pub subtotal: f64,
    pub tax: f64,
    pub total: f64,
    pub currency: String,
    pub category: Option<String>,
    pub line_items: Vec<LineItem>,
    pub status: InvoiceStatus,
}

// ── Document loading ──────────────────────────────────────────────────────────

pub fn mime_for(path: &Path) -> Result<&'static str, ExtractError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase();
    match ext.as_str() {
        "pdf" => Ok("application/pdf"),
        "png" => Ok("image/png"),
        "jpg" | "jpeg" => Ok("image/jpeg"),
        "webp" => Ok("image/webp"),
        other => Err(ExtractError::UnsupportedDocument(other.to_string())),
    }
}

pub fn load_document(path: &Path) -> Result<DocumentPayload, ExtractError> {
    let mime_type = mime_for(path)?;
    let bytes = std::fs::read(path)?;
    let source_name = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("document")
        .to_string();
    Ok(DocumentPayload {
        mime_type: mime_type.to_string(),
        bytes,
        source_name,
    })
}

// ── Concurrent batch ──────────────────────────────────────────────────────────

/// One slot per submitted file, success or failure. Failures are surfaced,
/// never silently dropped.
#[derive(Debug)]
pub struct BatchItemOutcome {
    pub source: PathBuf,
    pub result: Result<InvoiceRecord, ExtractError>,
}

/// Process every file concurrently (bounded by `concurrency`) and collect
/// outcomes only after all round trips have settled. No ordering guarantee
/// across the in-flight calls; the outcome list follows the input order.
pub async fn process_batch(
    extractor: Arc<dyn InvoiceExtractor>,
    files: Vec<PathBuf>,
    keywords: Vec<String>,
    concurrency: usize,
) -> Vec<BatchItemOutcome> {
    let sem = Arc::new(Semaphore::new(concurrency.max(1)));
    let keywords = Arc::new(keywords);
    let mut handles = Vec::new();

    for path in files {
        let extractor = Arc::clone(&extractor);
        let sem = Arc::clone(&sem);
        let keywords = Arc::clone(&keywords);
        let task_path = path.clone();

        let handle = tokio::spawn(async move {
            let _permit = sem.acquire().await.ok();
            let document = load_document(&task_path)?;
            extractor
                .extract(&document, &keywords)
                .await
                .map_err(ExtractError::from)
        });

        handles.push((path, handle));
    }

    let mut outcomes = Vec::new();
    for (path, handle) in handles {
        let result = match handle.await {
            Ok(result) => result,
            Err(e) => {
                error!("Task panic for {:?}: {}", path, e);
                Err(ExtractError::Task(e.to_string()))
            }
        };
        if let Err(e) = &result {
            warn!("{:?}: {:#}", path, e);
        }
        outcomes.push(BatchItemOutcome {
            source: path,
            result,
        });
    }
    outcomes
}

// ── CSV export ────────────────────────────────────────────────────────────────

/// Write the invoice list as CSV, one row per invoice.
pub fn export_csv<W: std::io::Write>(
    records: &[InvoiceRecord],
    writer: W,
) -> Result<(), csv::Error> {
    let mut w = csv::Writer::from_writer(writer);
    w.write_record([
        "ID",
        "Vendor",
        "Account Number",
        "City",
        "Invoice Number",
        "Date",
        "Due Date",
        "Total",
        "Currency",
        "Category",
        "Status",
    ])?;

    for record in records {
        let total = record.total.to_string();
        w.write_record([
            record.id.as_str(),
            record.vendor_name.as_str(),
            record.account_number.as_deref().unwrap_or(""),
            record.city.as_deref().unwrap_or(""),
            record.invoice_number.as_str(),
            record.date.as_str(),
            record.due_date.as_str(),
            total.as_str(),
            record.currency.as_str(),
            record.category.as_deref().unwrap_or(""),
            record.status.label(),
        ])?;
    }

    w.flush()?;
    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AiError;
    use async_trait::async_trait;
    use std::io::Write;

    fn record(id: &str, vendor: &str) -> InvoiceRecord {
        InvoiceRecord {
            id: id.into(),
            vendor_name: vendor.into(),
            invoice_number: "42".into(),
            account_number: Some("001".into()),
            city: None,
            date: "2024-06-01".into(),
            due_date: "2024-06-15".into(),
            subtotal: 100.0,
            tax: 0.0,
            total: 100.0,
            currency: "RUB".into(),
            category: Some("Utilities".into()),
            line_items: vec![],
            status: InvoiceStatus::Draft,
        }
    }

    struct StubExtractor;

    #[async_trait]
    impl InvoiceExtractor for StubExtractor {
        async fn extract(
            &self,
            document: &DocumentPayload,
            _keywords: &[String],
        ) -> Result<InvoiceRecord, AiError> {
            if document.source_name.contains("broken") {
                return Err(AiError::EmptyResponse);
            }
            Ok(record("inv-1", &document.source_name))
        }
    }

    #[test]
    fn test_mime_for() {
        assert_eq!(mime_for(Path::new("scan.pdf")).unwrap(), "application/pdf");
        assert_eq!(mime_for(Path::new("scan.JPG")).unwrap(), "image/jpeg");
        assert!(matches!(
            mime_for(Path::new("scan.docx")),
            Err(ExtractError::UnsupportedDocument(e)) if e == "docx"
        ));
    }

    #[tokio::test]
    async fn test_batch_surfaces_partial_failures() {
        let dir = tempfile::tempdir().unwrap();
        let ok_path = dir.path().join("utility.pdf");
        let broken_path = dir.path().join("broken.pdf");
        let unsupported_path = dir.path().join("notes.txt");
        for p in [&ok_path, &broken_path, &unsupported_path] {
            std::fs::File::create(p).unwrap().write_all(b"%PDF-").unwrap();
        }

        let outcomes = process_batch(
            Arc::new(StubExtractor),
            vec![ok_path.clone(), broken_path, unsupported_path],
            vec![],
            2,
        )
        .await;

        assert_eq!(outcomes.len(), 3);
        assert_eq!(outcomes[0].source, ok_path);
        assert!(outcomes[0].result.is_ok());
        assert!(matches!(
            outcomes[1].result,
            Err(ExtractError::Ai(AiError::EmptyResponse))
        ));
        assert!(matches!(
            outcomes[2].result,
            Err(ExtractError::UnsupportedDocument(_))
        ));
    }

    #[test]
    fn test_export_csv() {
        let records = vec![record("inv-1", "ООО \"МосОблЕИРЦ\""), record("inv-2", "Acme, Inc")];
        let mut out = Vec::new();
        export_csv(&records, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();

        let mut lines = text.lines();
        assert_eq!(
            lines.next().unwrap(),
            "ID,Vendor,Account Number,City,Invoice Number,Date,Due Date,Total,Currency,Category,Status"
        );
        // embedded quotes and commas survive the round trip
        assert!(text.contains("\"ООО \"\"МосОблЕИРЦ\"\"\""));
        assert!(text.contains("\"Acme, Inc\""));
        assert_eq!(text.lines().count(), 3);
    }
}
