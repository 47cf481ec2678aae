//! Generative-endpoint integration: a thin JSON client plus the two
//! independent uses of it: portfolio narrative analysis and invoice
//! extraction. Every call is fire-once; failures are terminal for the
//! operation that triggered them.

pub mod advisor;
pub mod client;
pub mod extract;

pub use client::GeminiClient;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Target language for generated narrative text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    En,
    Ru,
}

impl Language {
    pub fn english_name(&self) -> &'static str {
        match self {
            Language::En => "English",
            Language::Ru => "Russian",
        }
    }
}
