mod ai;
mod config;
mod error;
mod ingest;
mod invoice;
mod models;
mod remote;
mod storage;
mod summary;
mod utils;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

use crate::ai::advisor::{self, AnalysisRequest};
use crate::ai::{GeminiClient, Language};
use crate::config::AppConfig;
use crate::error::IngestError;
use crate::models::{PortfolioBatch, PortfolioSummary};
use crate::storage::{FileStore, Repository};
use crate::summary::summarize;
use crate::utils::fmt_money;

#[derive(Parser)]
#[command(name = "finsight", about = "Portfolio intake & invoice extraction toolkit", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Command {
    /// Ingest a spreadsheet workbook (.xlsx/.xls/.csv) and store the batch
    Ingest {
        file: PathBuf,
    },

    /// Fetch a published spreadsheet by share URL and ingest it
    Fetch {
        url: String,
    },

    /// Show the portfolio summary for the stored batch
    Summary,

    /// Save today's net-worth snapshot (replaces an earlier one from today)
    Snapshot,

    /// List the stored net-worth history
    History,

    /// Erase the stored net-worth history
    ClearHistory,

    /// Clear the stored asset/plan batch
    Reset,

    /// Write the sample onboarding workbook
    Template {
        /// Output path for the workbook
        #[arg(short, long, default_value = "finsight_template.xlsx")]
        out: PathBuf,
    },

    /// Ask the model for a narrative portfolio analysis
    Analyze {
        /// Response language (defaults to the configured one)
        #[arg(short, long, value_enum)]
        language: Option<Language>,
    },

    /// Extract structured data from scanned invoices (pdf/png/jpg/webp)
    Invoices {
        /// Documents to process
        files: Vec<PathBuf>,

        /// Write the extracted invoice list as CSV
        #[arg(short, long)]
        export: Option<PathBuf>,

        /// Selection keywords (defaults to the configured list)
        #[arg(short, long)]
        keyword: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => "finsight=info,warn",
        1 => "finsight=debug,info",
        _ => "trace",
    };

    tracing_subscriber::registry()
        .with(fmt::layer().compact().with_target(false))
        .with(EnvFilter::new(filter))
        .init();

    let config = AppConfig::load()?;

    match cli.command {
        Command::Ingest { file } => {
            let _t = utils::Timer::start("Workbook ingestion");
            let batch = ingest::ingest_file(&file)
                .context("Failed to parse file. Ensure it matches the template format")?;
            store_batch(&config, batch)?;
        }

        Command::Fetch { url } => {
            let _t = utils::Timer::start("Remote sheet ingestion");
            let fetcher = remote::SheetFetcher::new(remote::DEFAULT_TIMEOUT_SECS)?;

            match fetcher.fetch_workbook(&url).await {
                Ok(bytes) => {
                    let batch = ingest::ingest_bytes(bytes)
                        .context("Failed to parse fetched sheet. Ensure it matches the template format")?;
                    store_batch(&config, batch)?;
                }
                Err(e) => {
                    if let Some(link) = e.export_url() {
                        eprintln!(
                            "Could not fetch sheet. Ensure it is visible to anyone with the link, or download it manually:"
                        );
                        eprintln!("  {}", link);
                    }
                    return Err(e.into());
                }
            }
        }

        Command::Summary => {
            let repo = open_repo(&config)?;
            let batch = load_batch(&repo)?;
            print_summary(&summarize(&batch.assets));

            if !batch.plans.is_empty() {
                println!("  Plans:");
                for plan in &batch.plans {
                    println!(
                        "    [{}] {} — {}",
                        plan.quarter,
                        plan.goal,
                        plan.status.label()
                    );
                }
                println!("─────────────────────────────────────────");
            }
        }

        Command::Snapshot => {
            let repo = open_repo(&config)?;
            let batch = load_batch(&repo)?;
            let summary = summarize(&batch.assets);
            let history = repo.save_snapshot(&summary)?;
            println!(
                "Snapshot saved: net worth {} ({} entries in history)",
                fmt_money(summary.net_worth),
                history.len()
            );
        }

        Command::History => {
            let repo = open_repo(&config)?;
            let history = repo.history();
            if history.is_empty() {
                println!("No snapshots yet — run `finsight snapshot` first.");
            } else {
                println!("{} snapshots:", history.len());
                for item in &history {
                    println!(
                        "  {}  net {:>16}  assets {:>16}  debt {:>14}  income {:>12}",
                        item.date.format("%Y-%m-%d"),
                        fmt_money(item.net_worth),
                        fmt_money(item.total_assets),
                        fmt_money(item.total_liabilities),
                        fmt_money(item.total_income),
                    );
                }
            }
        }

        Command::ClearHistory => {
            open_repo(&config)?.clear_history()?;
            println!("History cleared.");
        }

        Command::Reset => {
            open_repo(&config)?.clear_batch()?;
            println!("Stored batch cleared.");
        }

        Command::Template { out } => {
            ingest::template::write_sample_template(&out)?;
            println!("Sample template written to {:?}", out);
        }

        Command::Analyze { language } => {
            let repo = open_repo(&config)?;
            let batch = load_batch(&repo)?;
            let summary = summarize(&batch.assets);
            let language = language.unwrap_or(config.ai.language);

            let client = GeminiClient::new(&config.ai)?;
            let request = AnalysisRequest {
                assets: &batch.assets,
                plans: &batch.plans,
                summary: &summary,
                language,
            };

            let text = advisor::analyze_or_apology(&client, &request).await;
            println!("{}", text);
        }

        Command::Invoices {
            files,
            export,
            keyword,
        } => {
            if files.is_empty() {
                bail!("no input documents given");
            }
            let _t = utils::Timer::start("Invoice batch");

            let client = Arc::new(GeminiClient::new(&config.ai)?);
            let keywords = if keyword.is_empty() {
                config.invoice.keywords.clone()
            } else {
                keyword
            };

            let outcomes =
                invoice::process_batch(client, files, keywords, config.invoice.concurrency).await;

            let mut records = Vec::new();
            let mut failed = 0usize;
            for outcome in &outcomes {
                match &outcome.result {
                    Ok(record) => {
                        println!(
                            "  ✔ {:?} — {} {} {}",
                            outcome.source,
                            record.vendor_name,
                            fmt_money(record.total),
                            record.currency
                        );
                        records.push(record.clone());
                    }
                    Err(e) => {
                        failed += 1;
                        println!("  ✘ {:?} — {:#}", outcome.source, e);
                    }
                }
            }
            info!("Done: {} extracted, {} failed", records.len(), failed);

            if let Some(path) = export {
                let file = std::fs::File::create(&path)
                    .with_context(|| format!("Could not create {:?}", path))?;
                invoice::export_csv(&records, file)?;
                println!("Exported {} invoices to {:?}", records.len(), path);
            }
        }
    }

    Ok(())
}

// ── Helpers ──────────────────────────────────────────────────────────────────

fn open_repo(config: &AppConfig) -> Result<Repository<FileStore>> {
    Repository::open(&config.storage.data_dir).context("Failed to open data store")
}

fn store_batch(config: &AppConfig, batch: PortfolioBatch) -> Result<()> {
    if batch.is_empty() {
        return Err(IngestError::EmptyWorkbook.into());
    }

    let repo = open_repo(config)?;
    repo.save_batch(&batch)?;
    info!(
        "Stored batch: {} assets, {} plans",
        batch.assets.len(),
        batch.plans.len()
    );

    print_summary(&summarize(&batch.assets));
    Ok(())
}

fn load_batch(repo: &Repository<FileStore>) -> Result<PortfolioBatch> {
    repo.load_batch()
        .context("No ingested batch found — run `finsight ingest <file>` first")
}

fn print_summary(summary: &PortfolioSummary) {
    println!("─────────────────────────────────────────");
    println!("  finsight — Portfolio Summary");
    println!("─────────────────────────────────────────");
    println!("  Net worth       : {}", fmt_money(summary.net_worth));
    println!("  Assets          : {}", fmt_money(summary.total_assets_value));
    println!(
        "  Liabilities     : {}",
        fmt_money(summary.total_liabilities_value)
    );
    println!(
        "  Profit          : {} ({:+.2}%)",
        fmt_money(summary.total_profit),
        summary.profit_percentage
    );
    println!("  Period income   : {}", fmt_money(summary.total_income));
    println!(
        "  Passive income  : {} / month",
        fmt_money(summary.projected_monthly_passive_income)
    );

    if !summary.asset_allocation.is_empty() {
        println!("─────────────────────────────────────────");
        println!("  Allocation:");
        for slice in &summary.asset_allocation {
            println!("    {:<13} : {}", slice.category.label(), fmt_money(slice.value));
        }
    }

    if let Some(top) = &summary.top_performer {
        println!(
            "  Top performer   : {} ({:+.2}%)",
            top.symbol, top.profit_percentage
        );
    }
    if let Some(worst) = &summary.worst_performer {
        println!(
            "  Worst performer : {} ({:+.2}%)",
            worst.symbol, worst.profit_percentage
        );
    }
    println!("─────────────────────────────────────────");
}
