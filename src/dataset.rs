//! Item dataset loading.
//!
//! Loading is an explicit step that produces a [`Dataset`] value which is then
//! handed to whatever needs it. Two JSON shapes are accepted:
//!
//! ```json
//! [ {"id": "a", "text": "..."}, {"id": "b"} ]
//! ```
//!
//! ```json
//! { "Expressions": { "Evaluate": { "tasks": [ {"id": "Ex-E-01", "text": "..."} ] } } }
//! ```
//!
//! Grouping into domains and categories is flattened; the engine only sees ids.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{DatasetError, DatasetResult};
use crate::item::{ItemId, ItemSet};

/// One item with its optional displayable fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemRecord {
    pub id: ItemId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub solution: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<String>>,
}

impl ItemRecord {
    pub fn new(id: impl Into<ItemId>) -> Self {
        Self {
            id: id.into(),
            text: None,
            code: None,
            solution: None,
            options: None,
        }
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn with_solution(mut self, solution: impl Into<String>) -> Self {
        self.solution = Some(solution.into());
        self
    }
}

#[derive(Deserialize)]
struct Category {
    tasks: Vec<ItemRecord>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawDataset {
    Flat(Vec<ItemRecord>),
    Grouped(BTreeMap<String, BTreeMap<String, Category>>),
}

/// The flat item set plus an id → record lookup.
#[derive(Debug, Clone)]
pub struct Dataset {
    records: Vec<ItemRecord>,
    index: HashMap<ItemId, usize>,
}

impl Dataset {
    /// Load and validate a dataset file.
    pub fn load(path: &Path) -> DatasetResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| DatasetError::Read {
            path: path.display().to_string(),
            source,
        })?;
        let dataset = Self::from_json_str(&content, &path.display().to_string())?;
        tracing::info!(items = dataset.len(), path = %path.display(), "loaded item dataset");
        Ok(dataset)
    }

    /// Parse a dataset from JSON. `origin` names the source in errors.
    pub fn from_json_str(json: &str, origin: &str) -> DatasetResult<Self> {
        let raw: RawDataset = serde_json::from_str(json).map_err(|e| DatasetError::Parse {
            path: origin.to_string(),
            message: e.to_string(),
        })?;
        let records = match raw {
            RawDataset::Flat(records) => records,
            RawDataset::Grouped(domains) => domains
                .into_values()
                .flat_map(BTreeMap::into_values)
                .flat_map(|category| category.tasks)
                .collect(),
        };
        Self::from_records(records)
    }

    /// Build from records, rejecting duplicate ids and empty input.
    pub fn from_records(records: Vec<ItemRecord>) -> DatasetResult<Self> {
        if records.is_empty() {
            return Err(DatasetError::Empty);
        }
        let mut index = HashMap::with_capacity(records.len());
        for (i, record) in records.iter().enumerate() {
            if index.insert(record.id.clone(), i).is_some() {
                return Err(DatasetError::DuplicateItem {
                    id: record.id.to_string(),
                });
            }
        }
        Ok(Self { records, index })
    }

    /// Records carrying nothing but an id.
    pub fn from_ids<I, T>(ids: I) -> DatasetResult<Self>
    where
        I: IntoIterator<Item = T>,
        T: Into<ItemId>,
    {
        Self::from_records(ids.into_iter().map(ItemRecord::new).collect())
    }

    pub fn ids(&self) -> ItemSet {
        self.records.iter().map(|r| r.id.clone()).collect()
    }

    pub fn get(&self, id: &str) -> Option<&ItemRecord> {
        self.index.get(id).map(|&i| &self.records[i])
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    pub fn records(&self) -> &[ItemRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
