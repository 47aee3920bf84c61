//! Persisted answer log.
//!
//! One record per query answered by the oracle, in answer order:
//!
//! ```json
//! {
//!   "answers": [ {"antecedent": ["a", "b"], "question": "q", "answer": 1} ],
//!   "active":  [ {"antecedent": ["a"], "question": "b"} ]
//! }
//! ```
//!
//! `answer` is `1` (yes), `0` (no) or `null` (skipped as uncertain). The
//! optional `active` list holds the remaining candidate pool so a resumed
//! session keeps asking the same candidates; an empty list means the pool is
//! exhausted, while a missing one means no pool was saved. Saves replace the whole file
//! atomically: the new content goes to a sibling temp file which is then
//! renamed over the old one.

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{LogError, LogResult};
use crate::item::ItemId;
use crate::manager::QueryManager;
use crate::query::{Answer, Query, QueryKey};
use crate::space::LearningSpace;

/// One oracle-answered query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerRecord {
    pub antecedent: Vec<ItemId>,
    pub question: ItemId,
    pub answer: Option<u8>,
}

impl AnswerRecord {
    pub fn key(&self) -> QueryKey {
        QueryKey::new(self.antecedent.iter().cloned(), self.question.clone())
    }

    pub fn answer(&self) -> Answer {
        Answer::from_code(self.answer)
    }
}

impl From<&Query> for AnswerRecord {
    fn from(query: &Query) -> Self {
        Self {
            antecedent: query.key.antecedent.iter().cloned().collect(),
            question: query.key.question.clone(),
            answer: query.answer.code(),
        }
    }
}

/// A not-yet-asked candidate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingRecord {
    pub antecedent: Vec<ItemId>,
    pub question: ItemId,
}

impl From<&QueryKey> for PendingRecord {
    fn from(key: &QueryKey) -> Self {
        Self {
            antecedent: key.antecedent.iter().cloned().collect(),
            question: key.question.clone(),
        }
    }
}

/// The whole persisted session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerLog {
    #[serde(default, alias = "answered")]
    pub answers: Vec<AnswerRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active: Option<Vec<PendingRecord>>,
}

impl AnswerLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of a manager's answered queries and remaining pool.
    pub fn from_manager(manager: &QueryManager) -> Self {
        Self {
            answers: manager.answered().iter().map(AnswerRecord::from).collect(),
            active: Some(manager.active().iter().map(PendingRecord::from).collect()),
        }
    }

    /// Keys of the saved active pool, if one was saved.
    pub fn active_keys(&self) -> Option<Vec<QueryKey>> {
        self.active.as_ref().map(|pool| {
            pool.iter()
                .map(|r| QueryKey::new(r.antecedent.iter().cloned(), r.question.clone()))
                .collect()
        })
    }

    /// Feed every record, in order, through `manager.record_answer`.
    ///
    /// Returns the number of records replayed.
    pub fn replay(&self, manager: &mut QueryManager, space: &mut LearningSpace) -> usize {
        for record in &self.answers {
            manager.record_answer(space, record.key(), record.answer());
        }
        tracing::info!(
            replayed = self.answers.len(),
            p_yes = space.p_yes().len(),
            p_no = space.p_no().len(),
            pending = space.pending().len(),
            "replayed answer log"
        );
        self.answers.len()
    }

    /// Read a log, failing on missing or malformed files.
    pub fn load(path: &Path) -> LogResult<Self> {
        let data = fs::read_to_string(path).map_err(|source| LogError::Io {
            path: path.display().to_string(),
            source,
        })?;
        serde_json::from_str(&data).map_err(|e| LogError::Corrupt {
            path: path.display().to_string(),
            message: e.to_string(),
        })
    }

    /// Read a log, treating a missing or corrupt file as "no prior answers".
    pub fn load_or_default(path: &Path) -> Self {
        if !path.exists() {
            tracing::info!(path = %path.display(), "no answer log found, starting fresh");
            return Self::default();
        }
        match Self::load(path) {
            Ok(log) => log,
            Err(e) => {
                tracing::warn!(error = %e, "ignoring unreadable answer log, starting fresh");
                Self::default()
            }
        }
    }

    /// Atomically replace the log at `path`.
    ///
    /// The parent directory is synced after the rename so the replace is
    /// durable.
    pub fn save(&self, path: &Path) -> LogResult<()> {
        let parent = path.parent().filter(|p| !p.as_os_str().is_empty());
        if let Some(parent) = parent {
            fs::create_dir_all(parent).map_err(|source| LogError::Io {
                path: parent.display().to_string(),
                source,
            })?;
        }

        let json = serde_json::to_string_pretty(self).map_err(|e| LogError::Serialize {
            message: e.to_string(),
        })?;

        let temp = temp_path(path);
        let written = File::create(&temp).and_then(|mut file| {
            file.write_all(json.as_bytes())?;
            file.sync_all()
        });
        if let Err(source) = written.and_then(|()| fs::rename(&temp, path)) {
            let _ = fs::remove_file(&temp);
            return Err(LogError::Io {
                path: path.display().to_string(),
                source,
            });
        }

        if let Some(parent) = parent {
            sync_dir(parent).map_err(|source| LogError::Io {
                path: parent.display().to_string(),
                source,
            })?;
        }

        tracing::debug!(path = %path.display(), answers = self.answers.len(), "saved answer log");
        Ok(())
    }
}

fn sync_dir(dir: &Path) -> std::io::Result<()> {
    File::open(dir)?.sync_all()
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}
