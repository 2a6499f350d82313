use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::conversation::ConversationTurn;
use super::lab::LabResult;
use crate::config::DEFAULT_LANGUAGE;

/// Turns kept per session (10 patient/assistant exchanges).
pub const MAX_CONVERSATION_TURNS: usize = 20;

/// State scoped to one uploaded report.
///
/// Field names on the wire match the persisted session file: the map key
/// carries the id, so `id` itself is not serialized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionRecord {
    #[serde(skip)]
    pub id: String,
    #[serde(rename = "pdf_text", alias = "source_text")]
    pub source_text: String,
    #[serde(rename = "conversation_history", default)]
    pub conversation: Vec<ConversationTurn>,
    #[serde(default = "default_language")]
    pub language: String,
    #[serde(default)]
    pub lab_data: Vec<LabResult>,
    #[serde(rename = "upload_time", deserialize_with = "upload_time::deserialize")]
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub filename: String,
}

fn default_language() -> String {
    DEFAULT_LANGUAGE.to_string()
}

/// Session files may carry zone-less ISO timestamps
/// (`2025-03-01T10:00:00.123456`); those are read as UTC.
mod upload_time {
    use chrono::{DateTime, NaiveDateTime, Utc};
    use serde::{de, Deserialize, Deserializer};

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        if let Ok(zoned) = raw.parse::<DateTime<Utc>>() {
            return Ok(zoned);
        }
        raw.parse::<NaiveDateTime>()
            .map(|naive| naive.and_utc())
            .map_err(|e| de::Error::custom(format!("invalid upload_time '{raw}': {e}")))
    }
}

impl SessionRecord {
    pub fn new(id: &str, filename: &str, source_text: String, lab_data: Vec<LabResult>) -> Self {
        Self {
            id: id.to_string(),
            source_text,
            conversation: Vec::new(),
            language: default_language(),
            lab_data,
            created_at: Utc::now(),
            filename: filename.to_string(),
        }
    }

    /// Append one patient/assistant exchange, then trim to the newest
    /// `MAX_CONVERSATION_TURNS` turns.
    pub fn append_exchange(&mut self, message: &str, reply: &str) {
        self.conversation.push(ConversationTurn::user(message));
        self.conversation.push(ConversationTurn::assistant(reply));
        self.trim_conversation();
    }

    fn trim_conversation(&mut self) {
        if self.conversation.len() > MAX_CONVERSATION_TURNS {
            let excess = self.conversation.len() - MAX_CONVERSATION_TURNS;
            self.conversation.drain(..excess);
        }
    }

    pub fn has_lab_data(&self) -> bool {
        !self.lab_data.is_empty()
    }
}
