// src/ranking.rs
//! Batch ranking and top-N selection.
//!
//! - Each title is tokenized once per pass.
//! - Corroboration only compares items that share at least one token, found via an
//!   inverted index. A pair with no shared token has Jaccard 0 and can never clear a
//!   positive threshold, so the result equals the all-pairs comparison. Tables built in
//!   code may carry a threshold of 0 or less; those fall back to comparing all pairs.
//! - Ordering is a stable descending sort on the total; equal scores keep batch order.

use crate::batch::{Batch, NewsItem, StoryRecord};
use crate::scoring::{intrinsic_breakdown, set_corroboration, ScoreBreakdown};
use crate::tables::{RankingTables, DEFAULT_TABLES};
use crate::tokenize::{jaccard, tokenize};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use tracing::{debug, info, warn};

/// Number of stories selected per day; downstream renderers have exactly this many slots.
pub const TOP_N: usize = 3;

/// The daily selection. Always exactly `TOP_N` records.
pub type Selection = [StoryRecord; TOP_N];

/// An item paired with its score, valid for one ranking pass.
#[derive(Debug, Clone, Serialize)]
pub struct ScoredItem<'a> {
    /// Position in the input batch.
    pub index: usize,
    pub item: &'a NewsItem,
    pub score: f64,
    pub breakdown: ScoreBreakdown,
}

/// Stateless ranker over a set of tables.
#[derive(Debug, Clone, Copy)]
pub struct Ranker<'t> {
    tables: &'t RankingTables,
}

impl Default for Ranker<'static> {
    fn default() -> Self {
        Self {
            tables: &DEFAULT_TABLES,
        }
    }
}

impl<'t> Ranker<'t> {
    pub fn new(tables: &'t RankingTables) -> Self {
        Self { tables }
    }

    pub fn tables(&self) -> &'t RankingTables {
        self.tables
    }

    /// Score every item and return them best-first.
    pub fn rank<'a>(&self, items: &'a [NewsItem], now: DateTime<Utc>) -> Vec<ScoredItem<'a>> {
        let tokens: Vec<HashSet<String>> = items.iter().map(|it| tokenize(&it.title)).collect();
        let counts = self.corroboration_counts(items, &tokens);

        let mut scored: Vec<ScoredItem<'a>> = items
            .iter()
            .enumerate()
            .map(|(i, item)| {
                let mut breakdown = intrinsic_breakdown(item, &tokens[i], now, self.tables);
                set_corroboration(&mut breakdown, counts[i], self.tables);
                let score = breakdown.total();
                debug!(
                    target: "ranking",
                    index = i,
                    source = %item.source,
                    score,
                    authority = breakdown.authority,
                    breadth = breakdown.breadth_bonus,
                    niche = breakdown.niche_penalty,
                    corroborations = breakdown.corroborations,
                    recency = breakdown.recency_bonus,
                    "scored item"
                );
                ScoredItem {
                    index: i,
                    item,
                    score,
                    breakdown,
                }
            })
            .collect();

        // `sort_by` is stable: ties stay in batch order.
        scored.sort_by(|a, b| b.score.total_cmp(&a.score));
        scored
    }

    /// Top `TOP_N` stories of the batch, padded with placeholders when it is short.
    pub fn select_top(&self, batch: &Batch, now: DateTime<Utc>) -> Selection {
        let ranked = self.rank(&batch.items, now);
        let picked: Vec<StoryRecord> = ranked
            .iter()
            .take(TOP_N)
            .map(|s| StoryRecord::from(s.item))
            .collect();

        if picked.len() < TOP_N {
            warn!(
                items = batch.items.len(),
                padded = TOP_N - picked.len(),
                "short batch, padding selection with placeholders"
            );
        }
        info!(
            items = batch.items.len(),
            top_score = ?ranked.first().map(|s| s.score),
            "selected top stories"
        );

        std::array::from_fn(|i| picked.get(i).cloned().unwrap_or_else(StoryRecord::placeholder))
    }

    /// For each item, how many items from other sources have similar titles.
    fn corroboration_counts(&self, items: &[NewsItem], tokens: &[HashSet<String>]) -> Vec<usize> {
        let threshold = self.tables.params.corroboration_threshold;
        if threshold <= 0.0 {
            return self.all_pairs_counts(items, tokens);
        }

        let mut postings: HashMap<&str, Vec<usize>> = HashMap::new();
        for (i, toks) in tokens.iter().enumerate() {
            for t in toks {
                postings.entry(t.as_str()).or_default().push(i);
            }
        }

        let mut seen = vec![usize::MAX; items.len()];
        let mut counts = vec![0usize; items.len()];
        for i in 0..items.len() {
            for t in &tokens[i] {
                let Some(list) = postings.get(t.as_str()) else {
                    continue;
                };
                for &j in list {
                    // `seen[j] == i` marks j as already compared against i.
                    if j == i || seen[j] == i {
                        continue;
                    }
                    seen[j] = i;
                    if items[j].source == items[i].source {
                        continue;
                    }
                    if jaccard(&tokens[i], &tokens[j]) >= threshold {
                        counts[i] += 1;
                    }
                }
            }
        }
        counts
    }

    fn all_pairs_counts(&self, items: &[NewsItem], tokens: &[HashSet<String>]) -> Vec<usize> {
        let threshold = self.tables.params.corroboration_threshold;
        (0..items.len())
            .map(|i| {
                (0..items.len())
                    .filter(|&j| j != i && items[j].source != items[i].source)
                    .filter(|&j| jaccard(&tokens[i], &tokens[j]) >= threshold)
                    .count()
            })
            .collect()
    }
}

/// Select today's top stories with the built-in tables and the current time.
pub fn select_top(batch: &Batch) -> Selection {
    Ranker::default().select_top(batch, Utc::now())
}

/// Like [`select_top`], starting from raw JSON. Fails only on an invalid batch structure.
pub fn select_top_json(value: &serde_json::Value) -> anyhow::Result<Selection> {
    let batch = Batch::from_value(value)?;
    Ok(select_top(&batch))
}
