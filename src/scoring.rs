//! Composite relevance score of one item within its batch.
//!
//! score = authority + breadth_bonus + corroboration_bonus + recency_bonus - niche_penalty
//!
//! - `authority`     : source weight from the tables (default for unknown sources)
//! - `breadth_bonus` : broad/macro vocabulary hits, linear and capped
//! - `niche_penalty` : niche/technical vocabulary hits, linear and capped, dampened for major outlets
//! - `corroboration` : other items from *different* sources with similar titles
//! - `recency`       : step bonus by age of `published_utc`
//!
//! No floor or ceiling on the total; a niche story from a minor source can go negative.

use crate::batch::NewsItem;
use crate::tables::RankingTables;
use crate::tokenize::{count_in, jaccard, tokenize};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::Serialize;
use std::collections::HashSet;

/// Per-component view of a score, kept for explanation and logging.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ScoreBreakdown {
    pub authority: f64,
    pub breadth_bonus: f64,
    pub niche_penalty: f64,
    pub corroboration_bonus: f64,
    pub recency_bonus: f64,
    /// Number of other items that cleared the similarity threshold.
    pub corroborations: usize,
    pub broad_terms: Vec<String>,
    pub niche_terms: Vec<String>,
}

impl ScoreBreakdown {
    pub fn total(&self) -> f64 {
        self.authority + self.breadth_bonus + self.corroboration_bonus + self.recency_bonus
            - self.niche_penalty
    }
}

/// Parse a feed timestamp. Accepts RFC 3339 (including a trailing `Z`), basic
/// offsets like `+0000`, naive date-times down to hour precision (read as UTC) and
/// bare dates (midnight UTC).
pub fn parse_published(raw: &str) -> Option<DateTime<Utc>> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f%z") {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(ndt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(ndt.and_utc());
        }
    }
    let (date, hour) = match s.split_once('T') {
        Some((d, h)) if h.len() == 2 && h.bytes().all(|b| b.is_ascii_digit()) => {
            (d, h.parse::<u32>().ok()?)
        }
        Some(_) => return None,
        None => (s, 0),
    };
    NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(hour, 0, 0))
        .map(|ndt| ndt.and_utc())
}

/// Step bonus by age. Missing or unparseable timestamps are neutral (0.0).
pub fn recency_bonus(
    published_utc: Option<&str>,
    now: DateTime<Utc>,
    tables: &RankingTables,
) -> f64 {
    let Some(published) = published_utc.and_then(parse_published) else {
        return 0.0;
    };
    let p = &tables.params;
    let age_h = (now - published).num_milliseconds() as f64 / 3_600_000.0;
    if age_h < p.fresh_hours {
        p.fresh_bonus
    } else if age_h < p.recent_hours {
        p.recent_bonus
    } else {
        0.0
    }
}

/// Everything except corroboration, which needs the rest of the batch.
pub(crate) fn intrinsic_breakdown(
    item: &NewsItem,
    tokens: &HashSet<String>,
    now: DateTime<Utc>,
    tables: &RankingTables,
) -> ScoreBreakdown {
    let p = &tables.params;

    let broad_hits = count_in(tokens, &tables.broad_terms);
    let niche_hits = count_in(tokens, &tables.niche_terms);

    let breadth_bonus = (broad_hits as f64 * p.broad_per_term).min(p.broad_cap);
    let mut niche_penalty = (niche_hits as f64 * p.niche_per_term).min(p.niche_cap);
    if tables.is_major_outlet(&item.source) {
        niche_penalty *= p.major_niche_dampening;
    }

    ScoreBreakdown {
        authority: tables.weight_for(&item.source),
        breadth_bonus,
        niche_penalty,
        corroboration_bonus: 0.0,
        recency_bonus: recency_bonus(item.published_utc.as_deref(), now, tables),
        corroborations: 0,
        broad_terms: matched_terms(tokens, &tables.broad_terms),
        niche_terms: matched_terms(tokens, &tables.niche_terms),
    }
}

pub(crate) fn set_corroboration(b: &mut ScoreBreakdown, count: usize, tables: &RankingTables) {
    let p = &tables.params;
    b.corroborations = count;
    b.corroboration_bonus = (count as f64 * p.corroboration_per_match).min(p.corroboration_cap);
}

/// Score `item` against the full `batch`, which may contain `item` itself.
///
/// Self-comparison is skipped by identity: a distinct entry with an identical
/// title still counts (if its source differs).
pub fn explain_item(
    item: &NewsItem,
    batch: &[NewsItem],
    now: DateTime<Utc>,
    tables: &RankingTables,
) -> ScoreBreakdown {
    let tokens = tokenize(&item.title);
    let mut b = intrinsic_breakdown(item, &tokens, now, tables);

    let count = batch
        .iter()
        .filter(|other| !std::ptr::eq(*other, item))
        .filter(|other| other.source != item.source)
        .filter(|other| {
            jaccard(&tokens, &tokenize(&other.title)) >= tables.params.corroboration_threshold
        })
        .count();
    set_corroboration(&mut b, count, tables);
    b
}

/// Total score of `item` within `batch`. See [`explain_item`].
pub fn score_item(
    item: &NewsItem,
    batch: &[NewsItem],
    now: DateTime<Utc>,
    tables: &RankingTables,
) -> f64 {
    explain_item(item, batch, now, tables).total()
}

fn matched_terms(tokens: &HashSet<String>, vocab: &HashSet<String>) -> Vec<String> {
    let mut v: Vec<String> = tokens.iter().filter(|t| vocab.contains(*t)).cloned().collect();
    v.sort();
    v
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, 28, 12, 0, 0).unwrap()
    }

    fn tables() -> RankingTables {
        RankingTables::default()
    }

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn parses_common_timestamp_shapes() {
        let want = Utc.with_ymd_and_hms(2026, 1, 28, 10, 0, 0).unwrap();
        assert_eq!(parse_published("2026-01-28T10:00:00Z"), Some(want));
        assert_eq!(parse_published("2026-01-28T11:00:00+01:00"), Some(want));
        assert_eq!(parse_published("2026-01-28T10:00:00"), Some(want));
        assert_eq!(parse_published("2026-01-28 10:00:00.000"), Some(want));
        assert_eq!(
            parse_published("2026-01-28"),
            Some(Utc.with_ymd_and_hms(2026, 1, 28, 0, 0, 0).unwrap())
        );
        assert_eq!(parse_published("not-a-date"), None);
        assert_eq!(parse_published("2026-01-28T25"), None);
        assert_eq!(parse_published("   "), None);
    }

    #[test]
    fn parses_basic_offsets_and_hour_only_times() {
        let want = Utc.with_ymd_and_hms(2026, 1, 28, 10, 0, 0).unwrap();
        assert_eq!(parse_published("2026-01-28T10:00:00+0000"), Some(want));
        assert_eq!(parse_published("2026-01-28T12:00:00+0200"), Some(want));
        assert_eq!(
            parse_published("2026-01-28T10:00:00.250+0000").map(|d| d.timestamp()),
            Some(want.timestamp())
        );
        assert_eq!(parse_published("2026-01-28T10"), Some(want));
        assert!(approx(recency_bonus(Some("2026-01-28T10"), now(), &tables()), 0.6));
    }

    #[test]
    fn recency_steps() {
        let t = tables();
        let at = |h: i64| (now() - Duration::hours(h)).to_rfc3339();
        assert!(approx(recency_bonus(Some(&at(1)), now(), &t), 0.6));
        assert!(approx(recency_bonus(Some(&at(6)), now(), &t), 0.3));
        assert!(approx(recency_bonus(Some(&at(23)), now(), &t), 0.3));
        assert!(approx(recency_bonus(Some(&at(24)), now(), &t), 0.0));
        assert!(approx(recency_bonus(Some(&at(30)), now(), &t), 0.0));
        assert!(approx(recency_bonus(Some("garbage"), now(), &t), 0.0));
        assert!(approx(recency_bonus(None, now(), &t), 0.0));
    }

    #[test]
    fn future_timestamp_counts_as_fresh() {
        let t = tables();
        let ahead = (now() + Duration::hours(3)).to_rfc3339();
        assert!(approx(recency_bonus(Some(&ahead), now(), &t), 0.6));
    }

    #[test]
    fn breadth_bonus_is_capped() {
        let t = tables();
        let it = NewsItem::new(
            "Trump Biden China Russia Iran Israel election war markets",
            "Blog",
            "",
            None,
        );
        let b = explain_item(&it, std::slice::from_ref(&it), now(), &t);
        assert!(approx(b.breadth_bonus, 2.0));
        assert_eq!(b.broad_terms.len(), 9);
    }

    #[test]
    fn niche_penalty_capped_and_dampened_for_major() {
        let t = tables();
        let title = "Linux kernel rust plugin npm devops";
        let minor = NewsItem::new(title, "HN", "", None);
        let major = NewsItem::new(title, "Reuters", "", None);

        let bm = explain_item(&minor, &[], now(), &t);
        assert!(approx(bm.niche_penalty, 2.2));
        assert!(approx(bm.total(), 1.0 - 2.2));

        let bj = explain_item(&major, &[], now(), &t);
        assert!(approx(bj.niche_penalty, 2.2 * 0.55));
    }

    #[test]
    fn unknown_source_neutral_weight() {
        let t = tables();
        let it = NewsItem::new("", "Nobody Times", "", None);
        assert!(approx(score_item(&it, &[], now(), &t), 1.5));
    }

    #[test]
    fn corroboration_counts_other_sources_only() {
        let t = tables();
        let batch = vec![
            NewsItem::new("Oil prices surge after pipeline attack", "Reuters", "a", None),
            NewsItem::new("Oil prices surge after pipeline attack", "Reuters", "b", None),
            NewsItem::new("Pipeline attack sends oil prices surging", "BBC", "c", None),
            NewsItem::new("Oil prices surge after pipeline attack", "FT", "d", None),
        ];
        let b = explain_item(&batch[0], &batch, now(), &t);
        // [1] same source, skipped; [2] and [3] corroborate.
        assert_eq!(b.corroborations, 2);
        assert!(approx(b.corroboration_bonus, 1.8));
    }

    #[test]
    fn corroboration_bonus_is_capped() {
        let t = tables();
        let batch: Vec<NewsItem> = ["A", "B", "C", "D", "E"]
            .iter()
            .map(|s| NewsItem::new("Ceasefire talks resume in Gaza", *s, "", None))
            .collect();
        let b = explain_item(&batch[0], &batch, now(), &t);
        assert_eq!(b.corroborations, 4);
        assert!(approx(b.corroboration_bonus, 2.5));
    }

    #[test]
    fn empty_titles_never_corroborate() {
        let t = tables();
        let batch = vec![
            NewsItem::new("", "A", "", None),
            NewsItem::new("", "B", "", None),
        ];
        let b = explain_item(&batch[0], &batch, now(), &t);
        assert_eq!(b.corroborations, 0);
    }
}
