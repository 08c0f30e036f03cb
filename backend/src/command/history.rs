//! Modification history: an append-only log of parsed commands.
//!
//! A record is created `pending` when a phrase parses and is settled exactly
//! once, to `applied` or `failed`, when the host applies it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use super::applier::ApplyOutcome;
use super::intent::Intent;

/// Lifecycle of a modification record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModificationStatus {
    Pending,
    Applied,
    Failed,
}

impl fmt::Display for ModificationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ModificationStatus::Pending => "pending",
            ModificationStatus::Applied => "applied",
            ModificationStatus::Failed => "failed",
        })
    }
}

/// Audit entry for one parsed command.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModificationRecord {
    pub id: String,
    /// The phrase as typed
    pub command: String,
    pub intent: Intent,
    /// Preview selection while pending, actual rows once applied
    pub affected_rows: Vec<usize>,
    pub status: ModificationStatus,
    #[serde(default)]
    pub error: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl ModificationRecord {
    /// New pending record.
    pub fn pending(command: impl Into<String>, intent: Intent, preview_rows: Vec<usize>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            command: command.into(),
            intent,
            affected_rows: preview_rows,
            status: ModificationStatus::Pending,
            error: None,
            timestamp: Utc::now(),
        }
    }

    pub fn is_pending(&self) -> bool {
        self.status == ModificationStatus::Pending
    }

    /// Settle a pending record from an apply outcome.
    ///
    /// Returns the current status as the error when the record was already settled.
    pub fn settle(&mut self, outcome: &ApplyOutcome) -> Result<ModificationStatus, ModificationStatus> {
        if !self.is_pending() {
            return Err(self.status);
        }
        match outcome.error {
            Some(ref e) => {
                self.status = ModificationStatus::Failed;
                self.error = Some(e.to_string());
            }
            None => {
                self.status = ModificationStatus::Applied;
                self.affected_rows = outcome.affected_rows.clone();
            }
        }
        Ok(self.status)
    }
}

/// Append-only record log with an optional size cap.
#[derive(Debug, Clone, Default, Serialize)]
pub struct History {
    records: Vec<ModificationRecord>,
    #[serde(skip)]
    limit: Option<usize>,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep at most `limit` records, dropping the oldest settled ones first.
    ///
    /// Pending records are never dropped, so the log may exceed `limit`
    /// while more than `limit` records await an apply.
    pub fn with_limit(limit: usize) -> Self {
        Self {
            records: Vec::new(),
            limit: Some(limit.max(1)),
        }
    }

    pub fn push(&mut self, record: ModificationRecord) -> &ModificationRecord {
        if let Some(limit) = self.limit {
            while self.records.len() >= limit {
                match self.records.iter().position(|r| !r.is_pending()) {
                    Some(oldest) => {
                        self.records.remove(oldest);
                    }
                    None => break,
                }
            }
        }
        self.records.push(record);
        let last = self.records.len() - 1;
        &self.records[last]
    }

    pub fn get(&self, id: &str) -> Option<&ModificationRecord> {
        self.records.iter().find(|r| r.id == id)
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut ModificationRecord> {
        self.records.iter_mut().find(|r| r.id == id)
    }

    pub fn records(&self) -> &[ModificationRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Counts of (pending, applied, failed).
    pub fn status_counts(&self) -> (usize, usize, usize) {
        self.records.iter().fold((0, 0, 0), |(p, a, f), r| match r.status {
            ModificationStatus::Pending => (p + 1, a, f),
            ModificationStatus::Applied => (p, a + 1, f),
            ModificationStatus::Failed => (p, a, f + 1),
        })
    }
}
