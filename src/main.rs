//! pulse-rank: command-line entrypoint.
//! Reads a day's pulse JSON, ranks it and emits the top stories.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::{Args, Parser, Subcommand};
use pulse_rank::{io, Ranker, RankingTables, ScoreBreakdown};
use serde::Serialize;
use std::path::PathBuf;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "pulse-rank")]
#[command(about = "Select the three most briefing-worthy stories from a daily news batch")]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Write the top-3 selection as JSON
    Select {
        #[command(flatten)]
        common: CommonArgs,

        /// Output file (written atomically); stdout if omitted
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
    /// Print every item in ranked order with its score breakdown
    Explain {
        #[command(flatten)]
        common: CommonArgs,
    },
}

#[derive(Args)]
struct CommonArgs {
    /// Input pulse JSON ({"items": [...]})
    #[arg(short = 'i', long = "in")]
    input: PathBuf,

    /// Ranking tables (TOML or JSON); overrides $PULSE_RANKING_TABLES
    #[arg(short, long)]
    tables: Option<PathBuf>,

    /// Reference time for recency (RFC 3339); defaults to now
    #[arg(long)]
    now: Option<String>,
}

impl CommonArgs {
    fn tables(&self) -> Result<RankingTables> {
        match &self.tables {
            Some(p) => RankingTables::load_from_file(p),
            None => RankingTables::from_env(),
        }
    }

    fn now(&self) -> Result<DateTime<Utc>> {
        match &self.now {
            Some(s) => Ok(DateTime::parse_from_rfc3339(s)
                .with_context(|| format!("invalid --now timestamp: {s}"))?
                .with_timezone(&Utc)),
            None => Ok(Utc::now()),
        }
    }
}

#[derive(Serialize)]
struct ExplainRow<'a> {
    rank: usize,
    score: f64,
    title: &'a str,
    source: &'a str,
    link: &'a str,
    breakdown: &'a ScoreBreakdown,
}

/// Logs go to stderr so stdout stays clean JSON.
/// Filter from RUST_LOG (default "pulse_rank=info,warn"); PULSE_LOG_FORMAT=json for JSON lines.
fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("pulse_rank=info,warn"));

    let json = std::env::var("PULSE_LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(fmt::layer().compact().with_writer(std::io::stderr))
            .init();
    }
}

fn main() -> Result<()> {
    // Load .env in local/dev so PULSE_RANKING_TABLES / RUST_LOG can live there.
    let _ = dotenvy::dotenv();
    init_tracing();

    let cli = Cli::parse();

    match cli.cmd {
        Command::Select { common, out } => {
            let tables = common.tables()?;
            let batch = io::read_batch(&common.input)?;
            let selection = Ranker::new(&tables).select_top(&batch, common.now()?);

            match out {
                Some(path) => {
                    io::write_json_atomic(&path, &selection)?;
                    tracing::info!(path = %path.display(), "selection written");
                }
                None => {
                    println!("{}", serde_json::to_string_pretty(&selection)?);
                }
            }
        }
        Command::Explain { common } => {
            let tables = common.tables()?;
            let batch = io::read_batch(&common.input)?;
            let ranked = Ranker::new(&tables).rank(&batch.items, common.now()?);

            let rows: Vec<ExplainRow<'_>> = ranked
                .iter()
                .enumerate()
                .map(|(i, s)| ExplainRow {
                    rank: i + 1,
                    score: s.score,
                    title: &s.item.title,
                    source: &s.item.source,
                    link: &s.item.link,
                    breakdown: &s.breakdown,
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&rows)?);
        }
    }

    Ok(())
}
