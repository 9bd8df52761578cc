//! Persisted shift session.
//!
//! One JSON record under [`SESSION_KEY`], always written whole.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use tracing::warn;

use super::boundaries::ShiftBoundaries;
use super::engine::Phase;
use crate::error::StoreError;
use crate::storage::{KvStore, SESSION_KEY};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub phase: Phase,
    #[serde(default)]
    pub boundaries: Option<ShiftBoundaries>,
    #[serde(default)]
    pub is_overtime: bool,
    #[serde(default)]
    pub overtime_start_time: Option<NaiveDateTime>,
    #[serde(default)]
    pub last_break_time: Option<NaiveDateTime>,
    /// End of the break in progress, when `phase` is `OnBreak`.
    #[serde(default)]
    pub break_ends_at: Option<NaiveDateTime>,
    /// Deadline of an unanswered break prompt.
    #[serde(default)]
    pub break_prompt_deadline: Option<NaiveDateTime>,
    /// Set once a shift ran to its end, until the next start or reset.
    #[serde(default)]
    pub completed_at: Option<NaiveDateTime>,
}

impl Session {
    /// Read the persisted session. Absent, unreadable and malformed records
    /// all come back as `None`.
    pub fn load(store: &impl KvStore) -> Option<Self> {
        let raw = match store.get(SESSION_KEY) {
            Ok(raw) => raw?,
            Err(e) => {
                warn!("failed to read session: {e}");
                return None;
            }
        };
        match serde_json::from_str(&raw) {
            Ok(session) => Some(session),
            Err(e) => {
                warn!("ignoring malformed session record: {e}");
                None
            }
        }
    }

    pub fn save(&self, store: &impl KvStore) -> Result<(), StoreError> {
        let raw = serde_json::to_string(self)
            .map_err(|e| StoreError::QueryFailed(format!("encode session: {e}")))?;
        store.set(SESSION_KEY, &raw)
    }

    pub fn clear(store: &impl KvStore) -> Result<(), StoreError> {
        store.delete(SESSION_KEY)
    }
}
