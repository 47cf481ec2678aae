//! Portfolio narrative analysis. Builds one prompt from the current summary,
//! plans and holdings, asks the model for a free-form write-up, and collapses
//! any failure into a fixed per-language apology string, so callers never
//! see an error from this path.

use super::{GeminiClient, Language};
use crate::error::AiError;
use crate::models::{Asset, FinancialPlan, PortfolioSummary};
use crate::utils::fmt_money;
use async_trait::async_trait;
use serde_json::json;
use tracing::error;

#[derive(Debug)]
pub struct AnalysisRequest<'a> {
    pub assets: &'a [Asset],
    pub plans: &'a [FinancialPlan],
    pub summary: &'a PortfolioSummary,
    pub language: Language,
}

/// Swappable narrative source, so the CLI path can be exercised without a
/// live endpoint.
#[async_trait]
pub trait NarrativeProvider: Send + Sync {
    async fn analyze(&self, request: &AnalysisRequest<'_>) -> Result<String, AiError>;
}

pub fn apology(language: Language) -> &'static str {
    match language {
        Language::En => "An error occurred while analyzing the portfolio.",
        Language::Ru => "Произошла ошибка при анализе портфеля.",
    }
}

fn system_instruction(language: Language) -> &'static str {
    match language {
        Language::En => "You are a senior portfolio manager assisting a retail investor.",
        Language::Ru => "Вы опытный финансовый консультант. Дайте советы на русском языке.",
    }
}

pub fn build_prompt(request: &AnalysisRequest<'_>) -> String {
    let summary = request.summary;

    let portfolio: Vec<&Asset> = request
        .assets
        .iter()
        .filter(|a| !a.category.is_income() && !a.category.is_liability())
        .collect();
    let liabilities: Vec<&Asset> = request
        .assets
        .iter()
        .filter(|a| a.category.is_liability())
        .collect();

    let asset_data: Vec<serde_json::Value> = portfolio
        .iter()
        .map(|a| {
            let allocation = if summary.total_assets_value > 0.0 {
                a.total_value / summary.total_assets_value * 100.0
            } else {
                0.0
            };
            json!({
                "symbol": a.symbol,
                "type": a.category.label(),
                "allocation": format!("{:.2}%", allocation),
                "profitPercent": format!("{:.2}%", a.profit_percentage),
                "value": a.total_value,
            })
        })
        .collect();

    let liability_data: Vec<serde_json::Value> = liabilities
        .iter()
        .map(|l| json!({ "name": l.name, "value": l.total_value }))
        .collect();

    format!(
        r#"You are an expert financial advisor. Analyze the following financial data.
**IMPORTANT: Respond strictly in {language}.**

**Wealth Summary:**
- Net Worth: ${net_worth}
- Total Assets: ${total_assets}
- Total Liabilities (Debt): ${total_liabilities}
- Total Period Income: ${total_income}

**User's Future Financial Plans:**
{plans}

**Liabilities/Debts:**
{liabilities}

**Investment Assets Breakdown:**
{assets}

Please provide a comprehensive analysis in Markdown format, covering:
1. **Financial Health**: Comment on the Net Worth and Debt-to-Asset ratio.
2. **Plan Alignment**: Specific advice on how to achieve the "User's Future Financial Plans" listed above based on current holdings.
3. **Diversification Analysis**: Are the assets well-distributed?
4. **Risk Assessment**: Identify potential high-risk concentrations.
5. **Actionable Recommendations**: Suggest 3 specific strategies.

Keep the tone professional. Use bullet points."#,
        language = request.language.english_name(),
        net_worth = fmt_money(summary.net_worth),
        total_assets = fmt_money(summary.total_assets_value),
        total_liabilities = fmt_money(summary.total_liabilities_value),
        total_income = fmt_money(summary.total_income),
        plans = serde_json::to_string_pretty(request.plans).unwrap_or_else(|_| "[]".into()),
        liabilities = serde_json::to_string_pretty(&liability_data).unwrap_or_else(|_| "[]".into()),
        assets = serde_json::to_string_pretty(&asset_data).unwrap_or_else(|_| "[]".into()),
    )
}

#[async_trait]
impl NarrativeProvider for GeminiClient {
    async fn analyze(&self, request: &AnalysisRequest<'_>) -> Result<String, AiError> {
        let prompt = build_prompt(request);
        self.generate(
            vec![json!({ "text": prompt })],
            Some(system_instruction(request.language)),
            None,
        )
        .await
    }
}

/// Run the analysis, converting every failure into the apology string.
pub async fn analyze_or_apology(
    provider: &dyn NarrativeProvider,
    request: &AnalysisRequest<'_>,
) -> String {
    match provider.analyze(request).await {
        Ok(text) => text,
        Err(e) => {
            error!("Portfolio analysis failed: {}", e);
            apology(request.language).to_string()
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
