use thiserror::Error;

// ── Ingestion ────────────────────────────────────────────────────────────────

/// Failures while turning a workbook into an asset/plan batch. Ingestion is
/// all-or-nothing: any of these aborts with no partial result retained.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("unsupported file extension {0:?} — expected .xlsx, .xls or .csv")]
    UnsupportedExtension(String),

    #[error("could not read workbook: {0}")]
    Workbook(#[from] calamine::Error),

    #[error("could not read CSV: {0}")]
    Csv(#[from] csv::Error),

    /// Structurally valid file, but nothing usable in it. Reported
    /// distinctly so the user knows to check the sheet structure.
    #[error("no assets or plans found in file — check the sheet structure")]
    EmptyWorkbook,
}

// ── Remote sheet fetch ───────────────────────────────────────────────────────

/// Failures while pulling a published spreadsheet. Variants that occur after
/// the export URL was derived carry it, so the caller can offer a manual
/// download fallback.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("could not find a spreadsheet id in {0:?}")]
    InvalidShareUrl(String),

    #[error("fetch failed: {source}")]
    Transport {
        source: reqwest::Error,
        export_url: String,
    },

    #[error("sheet endpoint returned {status}")]
    Status {
        status: reqwest::StatusCode,
        export_url: String,
    },
}

impl FetchError {
    /// Direct-download link to complete the operation manually, when known.
    pub fn export_url(&self) -> Option<&str> {
        match self {
            FetchError::InvalidShareUrl(_) => None,
            FetchError::Transport { export_url, .. } | FetchError::Status { export_url, .. } => {
                Some(export_url)
            }
        }
    }
}

// ── Generative endpoint ──────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum AiError {
    #[error("no API key configured — set GEMINI_API_KEY or [ai].api_key")]
    MissingApiKey,

    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("model endpoint returned {0}")]
    Status(reqwest::StatusCode),

    #[error("model returned no text")]
    EmptyResponse,

    #[error("could not parse model response: {0}")]
    BadPayload(#[from] serde_json::Error),
}

/// Per-document failures in the invoice path; wraps the AI family with the
/// local input problems that can precede the call.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("unsupported document type {0:?} — expected pdf, png, jpg or webp")]
    UnsupportedDocument(String),

    #[error("could not read document: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Ai(#[from] AiError),

    #[error("processing task failed: {0}")]
    Task(String),
}

// ── Persistence ──────────────────────────────────────────────────────────────

/// Write-side storage failures. Read-side corruption never surfaces as an
/// error: a corrupt blob is logged and treated as absent.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("storage io: {0}")]
    Io(#[from] std::io::Error),

    #[error("could not encode value: {0}")]
    Encode(#[from] serde_json::Error),
}
