//! Workout history - the log of performed treinos

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::storage::{self, Storage, StorageError, keys};

/// One performed workout, as stored in `gymfit_historico`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryEntry {
    #[serde(rename = "treinoId")]
    pub workout_id: i64,
    #[serde(rename = "treinoNome")]
    pub workout_name: String,
    #[serde(rename = "data")]
    pub date: DateTime<Utc>,
    #[serde(rename = "tempoTotal")]
    pub elapsed_secs: u32,
    #[serde(rename = "pontos")]
    pub xp: u64,
}

pub async fn append(store: &dyn Storage, entry: HistoryEntry) -> Result<(), StorageError> {
    let mut entries: Vec<HistoryEntry> = storage::load_list(store, keys::HISTORY).await?;
    entries.push(entry);
    storage::save_list(store, keys::HISTORY, &entries).await
}

/// Full history, newest first.
pub async fn list(store: &dyn Storage) -> Result<Vec<HistoryEntry>, StorageError> {
    let mut entries: Vec<HistoryEntry> = storage::load_list(store, keys::HISTORY).await?;
    entries.sort_by(|a, b| b.date.cmp(&a.date));
    Ok(entries)
}

/// "mm:ss" for an elapsed-seconds counter.
pub fn format_elapsed(secs: u32) -> String {
    format!("{:02}:{:02}", secs / 60, secs % 60)
}
