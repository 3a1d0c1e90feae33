//! Emoji Dataset
//!
//! emojilib-style JSON: an object of `id -> { "char", "keywords", "name"? }`.
//! Key order is preserved since ranking ties fall back to first-seen order.

use std::fs;
use std::path::Path;

use hashbrown::{HashMap, HashSet};
use serde::Deserialize;
use serde_json::Value;
use tracing::{info, warn};

use crate::error::{Error, Result};

/// How an emoji is shown to clients
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LabelFormat {
    /// The emoji character itself
    Char,
    /// The short name, or the id when the record has none
    #[default]
    Name,
}

/// One emoji and the words that describe it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmojiRecord {
    pub id: String,
    pub display_char: String,
    pub keywords: Vec<String>,
    pub short_name: Option<String>,
}

impl EmojiRecord {
    pub fn new(id: impl Into<String>, display_char: impl Into<String>, keywords: Vec<String>) -> Self {
        Self {
            id: id.into(),
            display_char: display_char.into(),
            keywords,
            short_name: None,
        }
    }

    pub fn with_short_name(mut self, name: impl Into<String>) -> Self {
        self.short_name = Some(name.into());
        self
    }

    pub fn label(&self, format: LabelFormat) -> &str {
        match format {
            LabelFormat::Char => &self.display_char,
            LabelFormat::Name => self.short_name.as_deref().unwrap_or(&self.id),
        }
    }
}

#[derive(Deserialize)]
struct RawRecord {
    #[serde(rename = "char")]
    display_char: Option<String>,
    keywords: Option<Vec<String>>,
    name: Option<String>,
}

/// Ordered, read-only collection of emoji records
#[derive(Debug, Clone, Default)]
pub struct EmojiDataset {
    records: Vec<EmojiRecord>,
    by_id: HashMap<String, usize>,
}

impl EmojiDataset {
    /// Build from records; a repeated id keeps its first record
    pub fn from_records(records: impl IntoIterator<Item = EmojiRecord>) -> Self {
        let mut dataset = Self::default();
        for record in records {
            if dataset.by_id.contains_key(&record.id) {
                warn!("Duplicate emoji id '{}', keeping the first record", record.id);
                continue;
            }
            dataset.by_id.insert(record.id.clone(), dataset.records.len());
            dataset.records.push(record);
        }
        dataset
    }

    /// Load a dataset file
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        let dataset = Self::from_json_str(&text)?;
        info!("Loaded {} emoji from {}", dataset.len(), path.display());
        Ok(dataset)
    }

    /// Parse dataset JSON, skipping records that do not fit the schema
    pub fn from_json_str(text: &str) -> Result<Self> {
        let root: Value = serde_json::from_str(text)?;
        let Value::Object(entries) = root else {
            return Err(Error::Configuration(
                "emoji dataset must be a JSON object keyed by emoji id".to_string(),
            ));
        };

        let mut records = Vec::with_capacity(entries.len());
        let mut skipped = 0usize;
        for (id, value) in entries {
            match parse_record(id, value) {
                Ok(record) => records.push(record),
                Err(e) => {
                    skipped += 1;
                    warn!("{}", e);
                }
            }
        }
        if skipped > 0 {
            warn!("Skipped {} malformed emoji records", skipped);
        }

        Ok(Self::from_records(records))
    }

    pub fn get(&self, id: &str) -> Option<&EmojiRecord> {
        self.by_id.get(id).map(|&i| &self.records[i])
    }

    pub fn iter(&self) -> impl Iterator<Item = &EmojiRecord> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Every id and keyword, de-duplicated, in first-seen order
    pub fn corpus(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        let mut words = Vec::new();
        for record in &self.records {
            for word in std::iter::once(&record.id).chain(record.keywords.iter()) {
                if seen.insert(word.as_str()) {
                    words.push(word.clone());
                }
            }
        }
        words
    }
}

fn parse_record(id: String, value: Value) -> Result<EmojiRecord> {
    let raw: RawRecord = serde_json::from_value(value).map_err(|e| Error::DatasetInconsistency {
        id: id.clone(),
        reason: e.to_string(),
    })?;

    let keywords = raw.keywords.ok_or_else(|| Error::DatasetInconsistency {
        id: id.clone(),
        reason: "missing keyword list".to_string(),
    })?;
    let display_char = raw.display_char.ok_or_else(|| Error::DatasetInconsistency {
        id: id.clone(),
        reason: "missing char".to_string(),
    })?;

    Ok(EmojiRecord {
        id,
        display_char,
        keywords,
        short_name: raw.name,
    })
}
