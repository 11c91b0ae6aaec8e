// src/batch.rs
//! Input batch and output record types.
//!
//! Item fields are coerced leniently: the daily feed is unattended, so a number
//! where a string was expected, or a `null`, must not abort the whole batch.
//! Only a wrong *shape* (batch not an object, `items` not an array, an item not
//! an object) is rejected as an invalid batch structure.

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Sentinel title of padding records.
pub const PLACEHOLDER_TITLE: &str = "\u{2014}";

/// One feed entry. Immutable during a ranking pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewsItem {
    #[serde(default, deserialize_with = "lenient_string")]
    pub title: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub source: String,
    /// Opaque, carried through unmodified.
    #[serde(default, deserialize_with = "lenient_string")]
    pub link: String,
    #[serde(
        default,
        deserialize_with = "lenient_opt_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub published_utc: Option<String>,
}

impl NewsItem {
    pub fn new(
        title: impl Into<String>,
        source: impl Into<String>,
        link: impl Into<String>,
        published_utc: Option<&str>,
    ) -> Self {
        Self {
            title: title.into(),
            source: source.into(),
            link: link.into(),
            published_utc: published_utc.filter(|s| !s.is_empty()).map(str::to_string),
        }
    }
}

/// One day's feed ("pulse").
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Batch {
    #[serde(
        default,
        deserialize_with = "lenient_opt_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub generated_utc: Option<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub items: Vec<NewsItem>,
}

impl Batch {
    pub fn new(items: Vec<NewsItem>) -> Self {
        Self {
            generated_utc: None,
            items,
        }
    }

    /// Build a batch from arbitrary JSON, rejecting structural contract violations.
    pub fn from_value(value: &Value) -> Result<Self> {
        let obj = value.as_object().ok_or_else(|| {
            anyhow!(
                "invalid batch structure: expected an object with an `items` array, got {}",
                kind_of(value)
            )
        })?;

        match obj.get("items") {
            None | Some(Value::Null) => {}
            Some(Value::Array(items)) => {
                if let Some((idx, bad)) = items.iter().enumerate().find(|(_, v)| !v.is_object())
                {
                    return Err(anyhow!(
                        "invalid batch structure: items[{}] is {}, expected an object",
                        idx,
                        kind_of(bad)
                    ));
                }
            }
            Some(other) => {
                return Err(anyhow!(
                    "invalid batch structure: `items` is {}, expected an array",
                    kind_of(other)
                ));
            }
        }

        Batch::deserialize(value).context("invalid batch structure")
    }

    /// Parse a batch from JSON text.
    pub fn from_json_str(s: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(s).context("batch is not valid JSON")?;
        Self::from_value(&value)
    }
}

/// Output shape handed to downstream renderers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoryRecord {
    pub title: String,
    pub source: String,
    pub link: String,
    pub published_utc: String,
}

impl StoryRecord {
    pub fn placeholder() -> Self {
        Self {
            title: PLACEHOLDER_TITLE.to_string(),
            ..Self::default()
        }
    }

    pub fn is_placeholder(&self) -> bool {
        *self == Self::placeholder()
    }
}

impl From<&NewsItem> for StoryRecord {
    fn from(it: &NewsItem) -> Self {
        Self {
            title: it.title.clone(),
            source: it.source.clone(),
            link: it.link.clone(),
            published_utc: it.published_utc.clone().unwrap_or_default(),
        }
    }
}

fn kind_of(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Falsy values become "", everything else its plain text form.
fn coerce(v: Value) -> String {
    match v {
        Value::Null | Value::Bool(false) => String::new(),
        Value::Bool(true) => "true".to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => s,
        other => other.to_string(),
    }
}

fn lenient_string<'de, D>(de: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(coerce(Value::deserialize(de)?))
}

fn lenient_opt_string<'de, D>(de: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let s = coerce(Value::deserialize(de)?);
    Ok(if s.is_empty() { None } else { Some(s) })
}

fn null_as_empty<'de, D>(de: D) -> Result<Vec<NewsItem>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<NewsItem>>::deserialize(de)?.unwrap_or_default())
}
