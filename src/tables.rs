//! # Ranking Tables
//!
//! Curated lookup data driving the scorer:
//!
//! - source label -> authority weight (exact, case-sensitive label match),
//! - the set of canonical major outlets (niche-penalty dampening),
//! - broad/macro and niche/technical vocabularies,
//! - the numeric scoring parameters.
//!
//! Built-in defaults live in a process-wide [`Lazy`] and are never re-allocated per call.
//! A TOML or JSON file can override any subset of fields; missing fields keep the
//! built-in value.

use anyhow::{anyhow, Context, Result};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

/// Env var naming a tables file to load instead of the built-in defaults.
pub const ENV_TABLES_PATH: &str = "PULSE_RANKING_TABLES";

/// Built-in tables, initialized once.
pub static DEFAULT_TABLES: Lazy<RankingTables> = Lazy::new(RankingTables::builtin);

/// Numeric knobs of the scorer. Defaults are empirically chosen and kept as-is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringParams {
    pub broad_per_term: f64,
    pub broad_cap: f64,
    pub niche_per_term: f64,
    pub niche_cap: f64,
    /// Multiplier applied to the niche penalty of major outlets.
    pub major_niche_dampening: f64,
    /// Minimum Jaccard similarity for another item to count as corroboration.
    pub corroboration_threshold: f64,
    pub corroboration_per_match: f64,
    pub corroboration_cap: f64,
    pub fresh_hours: f64,
    pub fresh_bonus: f64,
    pub recent_hours: f64,
    pub recent_bonus: f64,
}

impl Default for ScoringParams {
    fn default() -> Self {
        Self {
            broad_per_term: 0.45,
            broad_cap: 2.0,
            niche_per_term: 0.55,
            niche_cap: 2.2,
            major_niche_dampening: 0.55,
            corroboration_threshold: 0.28,
            corroboration_per_match: 0.9,
            corroboration_cap: 2.5,
            fresh_hours: 6.0,
            fresh_bonus: 0.6,
            recent_hours: 24.0,
            recent_bonus: 0.3,
        }
    }
}

/// All lookup data the scorer consults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RankingTables {
    /// Weight for sources missing from `source_weights`.
    pub default_weight: f64,
    pub source_weights: HashMap<String, f64>,
    pub major_outlets: HashSet<String>,
    pub broad_terms: HashSet<String>,
    pub niche_terms: HashSet<String>,
    pub params: ScoringParams,
}

impl Default for RankingTables {
    fn default() -> Self {
        DEFAULT_TABLES.clone()
    }
}

impl RankingTables {
    fn builtin() -> Self {
        let source_weights = [
            ("BBC World", 4.5),
            ("BBC", 4.0),
            ("Reuters", 4.2),
            ("AP", 3.8),
            ("Associated Press", 3.8),
            ("Financial Times", 4.2),
            ("FT", 4.2),
            ("The Economist", 4.0),
            ("HN", 1.0),
            ("Hacker News", 1.0),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect();

        let major_outlets = strings(&[
            "BBC World",
            "BBC",
            "Reuters",
            "AP",
            "Associated Press",
            "Financial Times",
            "FT",
            "The Economist",
        ]);

        let broad_terms = strings(&[
            "election", "war", "ukraine", "russia", "china", "iran", "israel", "gaza", "trump",
            "biden", "inflation", "rates", "market", "markets", "oil", "economy", "recession",
            "stocks", "ai", "tesla", "apple", "google", "amazon", "meta", "microsoft", "tiktok",
            "nato", "eu",
        ]);

        let niche_terms = strings(&[
            "linux", "vst", "plugin", "plugins", "rust", "typescript", "npm", "kubernetes",
            "devops", "audio", "synth", "vscode", "kernel", "postgres", "sqlite",
        ]);

        Self {
            default_weight: 1.5,
            source_weights,
            major_outlets,
            broad_terms,
            niche_terms,
            params: ScoringParams::default(),
        }
    }

    /// Authority weight for a source label.
    pub fn weight_for(&self, source: &str) -> f64 {
        self.source_weights
            .get(source)
            .copied()
            .unwrap_or(self.default_weight)
    }

    pub fn is_major_outlet(&self, source: &str) -> bool {
        self.major_outlets.contains(source)
    }

    /// Load tables from a TOML or JSON file (format chosen by extension).
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading ranking tables from {}", path.display()))?;
        let ext = path
            .extension()
            .and_then(|s| s.to_str())
            .unwrap_or_default()
            .to_ascii_lowercase();
        Self::parse(&content, &ext)
            .with_context(|| format!("parsing ranking tables from {}", path.display()))
    }

    /// Resolve tables from `$PULSE_RANKING_TABLES`, falling back to the built-in defaults
    /// when the variable is unset.
    pub fn from_env() -> Result<Self> {
        match std::env::var(ENV_TABLES_PATH) {
            Ok(p) => {
                let pb = PathBuf::from(p);
                if !pb.exists() {
                    return Err(anyhow!(
                        "{} points to non-existent path {}",
                        ENV_TABLES_PATH,
                        pb.display()
                    ));
                }
                let tables = Self::load_from_file(&pb)?;
                tracing::info!(path = %pb.display(), "loaded ranking tables");
                Ok(tables)
            }
            Err(_) => Ok(Self::default()),
        }
    }

    /// Parse from a string, trying the hinted format first and then the other one.
    /// When both fail, the hinted format's error is the one reported.
    pub fn parse(s: &str, hint_ext: &str) -> Result<Self> {
        let (hinted, fallback): (fn(&str) -> Result<Self>, fn(&str) -> Result<Self>) =
            if hint_ext == "json" {
                (Self::from_json, Self::from_toml)
            } else {
                (Self::from_toml, Self::from_json)
            };
        let parsed = match hinted(s) {
            Ok(t) => t,
            Err(hinted_err) => fallback(s)
                .map_err(|_| anyhow!("unsupported ranking tables format: {hinted_err}"))?,
        };
        let tables = parsed.normalized();
        tables.validate()?;
        Ok(tables)
    }

    fn from_toml(s: &str) -> Result<Self> {
        Ok(toml::from_str(s)?)
    }

    fn from_json(s: &str) -> Result<Self> {
        Ok(serde_json::from_str(s)?)
    }

    /// Tokens are lowercase, so vocabulary has to be too.
    fn normalized(mut self) -> Self {
        self.broad_terms = lowercase_set(self.broad_terms);
        self.niche_terms = lowercase_set(self.niche_terms);
        self
    }

    /// Corroboration needs at least one shared token, so the threshold must be positive.
    fn validate(&self) -> Result<()> {
        let threshold = self.params.corroboration_threshold;
        if !(threshold > 0.0 && threshold.is_finite()) {
            return Err(anyhow!(
                "params.corroboration_threshold must be a positive number, got {threshold}"
            ));
        }
        Ok(())
    }
}

fn strings(items: &[&str]) -> HashSet<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn lowercase_set(items: HashSet<String>) -> HashSet<String> {
    items
        .into_iter()
        .map(|t| t.trim().to_ascii_lowercase())
        .filter(|t| !t.is_empty())
        .collect()
}
