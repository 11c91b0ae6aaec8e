// src/lib.rs
// Story ranking engine: picks the three most briefing-worthy items of a daily feed.

pub mod batch;
pub mod io;
pub mod ranking;
pub mod scoring;
pub mod tables;
pub mod tokenize;

// ---- Re-exports for stable public API ----
pub use crate::batch::{Batch, NewsItem, StoryRecord, PLACEHOLDER_TITLE};
pub use crate::ranking::{select_top, select_top_json, Ranker, ScoredItem, Selection, TOP_N};
pub use crate::scoring::{explain_item, score_item, ScoreBreakdown};
pub use crate::tables::{RankingTables, ScoringParams};
pub use crate::tokenize::{jaccard, tokenize};
