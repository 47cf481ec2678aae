//! Structured invoice extraction: one document in, one schema-constrained
//! JSON record out, then a local keyword-selection pass over the line items.
//! The extraction prompt targets utility invoices, which are frequently in
//! Russian (ЕПД payment documents).

use super::GeminiClient;
use crate::error::AiError;
use crate::invoice::{InvoiceRecord, InvoiceStatus, LineItem};
use async_trait::async_trait;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use chrono::Utc;
use serde::Deserialize;
use serde_json::{Value, json};

/// A document ready to send: raw bytes plus the MIME type the caller sniffed.
#[derive(Debug, Clone)]
pub struct DocumentPayload {
    pub mime_type: String,
    pub bytes: Vec<u8>,
    pub source_name: String,
}

#[async_trait]
pub trait InvoiceExtractor: Send + Sync {
    async fn extract(
        &self,
        document: &DocumentPayload,
        keywords: &[String],
    ) -> Result<InvoiceRecord, AiError>;
}

// ── Wire shapes ───────────────────────────────────────────────────────────────

/// What the model returns before local post-processing. Every numeric field
/// is optional; the model is told to leave unknowns null.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ExtractedInvoice {
    pub vendor_name: String,
    pub invoice_number: String,
    pub account_number: Option<String>,
    pub city: Option<String>,
    pub date: String,
    pub due_date: String,
    pub subtotal: Option<f64>,
    pub tax: Option<f64>,
    pub total: Option<f64>,
    pub currency: String,
    pub category: Option<String>,
    pub line_items: Vec<ExtractedLineItem>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ExtractedLineItem {
    pub description: String,
    pub quantity: Option<f64>,
    pub unit_price: Option<f64>,
    pub total: Option<f64>,
}

fn response_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "vendorName": { "type": "STRING", "description": "Name of the vendor, payee, or management organization" },
            "invoiceNumber": { "type": "STRING", "description": "Invoice identifier number" },
            "accountNumber": { "type": "STRING", "description": "Customer account number ('Лицевой счет' on Russian invoices)" },
            "city": { "type": "STRING", "description": "City name extracted from the address line, just the city name" },
            "date": { "type": "STRING", "description": "Invoice date in YYYY-MM-DD format" },
            "dueDate": { "type": "STRING", "description": "Payment due date in YYYY-MM-DD format" },
            "subtotal": { "type": "NUMBER", "description": "Sum of line items before tax or additional charges" },
            "tax": { "type": "NUMBER", "description": "Total tax amount if applicable" },
            "total": { "type": "NUMBER", "description": "Final total amount due ('ИТОГО К ОПЛАТЕ')" },
            "currency": { "type": "STRING", "description": "Currency code (e.g., RUB, USD, EUR)" },
            "category": { "type": "STRING", "description": "Category of expense (e.g., Utilities, Housing, Software)" },
            "lineItems": {
                "type": "ARRAY",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "description": { "type": "STRING", "description": "Name of service or product" },
                        "quantity": { "type": "NUMBER", "description": "Volume or quantity ('Объем')" },
                        "unitPrice": { "type": "NUMBER", "description": "Tariff or price per unit ('Тариф')" },
                        "total": { "type": "NUMBER", "description": "Total cost for this item ('Начислено' or 'ИТОГО')" }
                    },
                    "required": ["description", "total"]
                }
            }
        },
        "required": ["vendorName", "total", "lineItems"]
    })
}

const EXTRACTION_PROMPT: &str = r#"Analyze this document and extract the structured invoice data.

The document might be in Russian (e.g., "ЕДИНЫЙ ПЛАТЕЖНЫЙ ДОКУМЕНТ").
- Map 'Лицевой счет' to 'accountNumber'.
- Look for the address line starting with 'Адрес:'. Extract the city name into the 'city' field.
- Map 'ИТОГО К ОПЛАТЕ' or the final payable amount to 'total'.
- Map 'Период' or the document date to 'date'.

EXTRACTING LINE ITEMS:
- Look for the table section often titled "РАСЧЕТ РАЗМЕРА ПЛАТЫ" or "Виды услуг".
- Extract each row representing a service.
- 'description': Name of the service.
- 'quantity': The volume/consumption amount (Объем).
- 'unitPrice': The tariff rate (Тариф).
- 'total': The charged amount (Начислено or Итого).

- Map 'Получатель платежа' or 'Управляющая организация' to 'vendorName'.
- If currency is 'руб.', use 'RUB'.

If a field is missing, make a reasonable estimate or leave it as null/0."#;

// ── Post-processing ───────────────────────────────────────────────────────────

fn round_cents(n: f64) -> f64 {
    (n * 100.0).round() / 100.0
}

fn sanitize_source(source: &str) -> String {
    source.chars().filter(|c| c.is_ascii_alphanumeric()).collect()
}

/// Apply keyword selection and assemble the final record. When at least one
/// line item is selected, the sum of the selected items replaces both
/// subtotal and total (these invoices are paid per selected service) and
/// the extracted tax is discarded.
pub fn finalize_record(
    extracted: ExtractedInvoice,
    keywords: &[String],
    source_name: &str,
) -> InvoiceRecord {
    let upper_keywords: Vec<String> = keywords.iter().map(|k| k.to_uppercase()).collect();

    let line_items: Vec<LineItem> = extracted
        .line_items
        .into_iter()
        .map(|item| {
            let desc = item.description.to_uppercase();
            let desc = desc.trim();
            let selected = upper_keywords.iter().any(|k| desc.starts_with(k.as_str()));
            LineItem {
                description: item.description,
                quantity: item.quantity.unwrap_or(0.0),
                unit_price: item.unit_price.unwrap_or(0.0),
                total: item.total.unwrap_or(0.0),
                selected,
            }
        })
        .collect();

    let selected_subtotal: f64 = line_items
        .iter()
        .filter(|i| i.selected)
        .map(|i| i.total)
        .sum();

    let (subtotal, total) = if selected_subtotal > 0.0 {
        (selected_subtotal, selected_subtotal)
    } else {
        (
            extracted.subtotal.unwrap_or(0.0),
            extracted.total.unwrap_or(0.0),
        )
    };

    InvoiceRecord {
        id: format!(
            "inv-{}-{}",
            sanitize_source(source_name),
            Utc::now().timestamp_millis()
        ),
        vendor_name: extracted.vendor_name,
        invoice_number: extracted.invoice_number,
        account_number: extracted.account_number,
        city: extracted.city,
        date: extracted.date,
        due_date: extracted.due_date,
        subtotal: round_cents(subtotal),
        tax: 0.0,
        total: round_cents(total),
        currency: extracted.currency,
        category: extracted.category,
        line_items,
        status: InvoiceStatus::Draft,
    }
}

// ── Gemini implementation ─────────────────────────────────────────────────────

#[async_trait]
impl InvoiceExtractor for GeminiClient {
    async fn extract(
        &self,
        document: &DocumentPayload,
        keywords: &[String],
    ) -> Result<InvoiceRecord, AiError> {
        let parts = vec![
            json!({
                "inlineData": {
                    "mimeType": document.mime_type,
                    "data": BASE64.encode(&document.bytes),
                }
            }),
            json!({ "text": EXTRACTION_PROMPT }),
        ];
        let generation_config = json!({
            "responseMimeType": "application/json",
            "responseSchema": response_schema(),
            "temperature": 0.1,
        });

        let text = self.generate(parts, None, Some(generation_config)).await?;
        let extracted: ExtractedInvoice = serde_json::from_str(&text)?;
        Ok(finalize_record(extracted, keywords, &document.source_name))
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
