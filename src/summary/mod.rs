//! Portfolio summary derivation. Pure function over the current asset list,
//! recomputed on every call; nothing here is cached or persisted.

use crate::models::{AllocationSlice, Asset, AssetCategory, PortfolioSummary};
use std::cmp::Ordering;
use std::collections::HashMap;

/// Reduce the asset list to portfolio-level metrics.
///
/// Assets partition three ways by category group: income streams, liabilities
/// and everything else ("portfolio" assets). Income rows count toward period
/// income only; liabilities subtract from net worth. Projected monthly income
/// intentionally sums across every asset, liabilities included.
pub fn summarize(assets: &[Asset]) -> PortfolioSummary {
    let portfolio: Vec<&Asset> = assets
        .iter()
        .filter(|a| !a.category.is_income() && !a.category.is_liability())
        .collect();
    let income: Vec<&Asset> = assets.iter().filter(|a| a.category.is_income()).collect();
    let liabilities: Vec<&Asset> = assets.iter().filter(|a| a.category.is_liability()).collect();

    let total_assets_value: f64 = portfolio.iter().map(|a| a.total_value).sum();
    let total_liabilities_value: f64 = liabilities.iter().map(|a| a.total_value).sum();
    let net_worth = total_assets_value - total_liabilities_value;

    let total_cost: f64 = portfolio.iter().map(|a| a.total_cost).sum();
    let total_profit = total_assets_value - total_cost;
    let profit_percentage = if total_cost == 0.0 {
        0.0
    } else {
        total_profit / total_cost * 100.0
    };

    let total_income: f64 = income.iter().map(|a| a.total_value).sum();
    let projected_monthly_passive_income: f64 =
        assets.iter().map(|a| a.projected_monthly_income).sum();

    let mut by_category: HashMap<AssetCategory, f64> = HashMap::new();
    for asset in &portfolio {
        *by_category.entry(asset.category).or_default() += asset.total_value;
    }
    let mut asset_allocation: Vec<AllocationSlice> = by_category
        .into_iter()
        .map(|(category, value)| AllocationSlice { category, value })
        .collect();
    asset_allocation
        .sort_by(|a, b| b.value.partial_cmp(&a.value).unwrap_or(Ordering::Equal));

    let mut by_performance = portfolio.clone();
    by_performance.sort_by(|a, b| {
        b.profit_percentage
            .partial_cmp(&a.profit_percentage)
            .unwrap_or(Ordering::Equal)
    });
    let top_performer = by_performance.first().map(|a| (*a).clone());
    let worst_performer = by_performance.last().map(|a| (*a).clone());

    PortfolioSummary {
        net_worth,
        total_assets_value,
        total_liabilities_value,
        total_profit,
        profit_percentage,
        total_income,
        projected_monthly_passive_income,
        asset_allocation,
        top_performer,
        worst_performer,
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
