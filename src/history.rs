//! Bounded conversation history for conversational generation runs

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use ts_rs::TS;

/// Rendered in place of an empty history
pub const EMPTY_HISTORY: &str = "No previous conversation";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum Speaker {
    Human,
    Ai,
}

impl Speaker {
    fn label(&self) -> &'static str {
        match self {
            Speaker::Human => "Human",
            Speaker::Ai => "AI",
        }
    }
}

/// One turn of the conversation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct HistoryEntry {
    pub speaker: Speaker,
    pub content: String,
}

impl HistoryEntry {
    pub fn human(content: impl Into<String>) -> Self {
        Self {
            speaker: Speaker::Human,
            content: content.into(),
        }
    }

    pub fn ai(content: impl Into<String>) -> Self {
        Self {
            speaker: Speaker::Ai,
            content: content.into(),
        }
    }
}

/// A prompt and the response it produced
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Exchange {
    pub prompt: String,
    pub response: String,
}

/// Fixed-capacity, oldest-first history buffer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "StoredHistory")]
pub struct ConversationHistory {
    capacity: usize,
    entries: VecDeque<HistoryEntry>,
}

impl ConversationHistory {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            entries: VecDeque::with_capacity(capacity),
        }
    }

    /// Build from existing entries, keeping only the newest `capacity`
    pub fn from_entries(capacity: usize, entries: impl IntoIterator<Item = HistoryEntry>) -> Self {
        let mut history = Self::new(capacity);
        for entry in entries {
            history.push(entry);
        }
        history
    }

    pub fn push(&mut self, entry: HistoryEntry) {
        if self.capacity == 0 {
            return;
        }
        while self.entries.len() >= self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(entry);
    }

    /// Append both turns of an exchange
    pub fn record(&mut self, exchange: Exchange) {
        self.push(HistoryEntry::human(exchange.prompt));
        self.push(HistoryEntry::ai(exchange.response));
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> impl Iterator<Item = &HistoryEntry> {
        self.entries.iter()
    }

    /// One `Human: ...` / `AI: ...` line per entry, oldest first
    pub fn render(&self) -> String {
        if self.entries.is_empty() {
            return EMPTY_HISTORY.to_string();
        }
        self.entries
            .iter()
            .map(|entry| format!("{}: {}", entry.speaker.label(), entry.content))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Serialized form; the capacity bound is re-applied on load
#[derive(Deserialize)]
struct StoredHistory {
    capacity: usize,
    #[serde(default)]
    entries: Vec<HistoryEntry>,
}

impl From<StoredHistory> for ConversationHistory {
    fn from(stored: StoredHistory) -> Self {
        Self::from_entries(stored.capacity, stored.entries)
    }
}

impl Default for ConversationHistory {
    fn default() -> Self {
        Self::new(crate::config::DEFAULT_HISTORY_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn exchange(n: usize) -> Exchange {
        Exchange {
            prompt: format!("prompt {}", n),
            response: format!("response {}", n),
        }
    }

    #[test]
    fn test_empty_history_renders_placeholder() {
        assert_eq!(ConversationHistory::new(4).render(), EMPTY_HISTORY);
    }

    #[test]
    fn test_record_renders_both_turns() {
        let mut history = ConversationHistory::new(4);
        history.record(exchange(1));
        assert_eq!(history.render(), "Human: prompt 1\nAI: response 1");
    }

    #[test]
    fn test_oldest_entries_are_evicted() {
        let mut history = ConversationHistory::new(4);
        for n in 1..=3 {
            history.record(exchange(n));
        }

        assert_eq!(history.len(), 4);
        let contents: Vec<&str> = history.entries().map(|e| e.content.as_str()).collect();
        assert_eq!(
            contents,
            vec!["prompt 2", "response 2", "prompt 3", "response 3"]
        );
    }

    #[test]
    fn test_from_entries_keeps_newest() {
        let entries = (0..7).map(|n| HistoryEntry::human(n.to_string()));
        let history = ConversationHistory::from_entries(3, entries);

        let contents: Vec<&str> = history.entries().map(|e| e.content.as_str()).collect();
        assert_eq!(contents, vec!["4", "5", "6"]);
    }

    #[test]
    fn test_zero_capacity_keeps_nothing() {
        let mut history = ConversationHistory::new(0);
        history.record(exchange(1));
        assert!(history.is_empty());
    }

    #[test]
    fn test_deserialize_enforces_capacity() {
        let history: ConversationHistory = serde_json::from_value(serde_json::json!({
            "capacity": 2,
            "entries": [
                {"speaker": "human", "content": "a"},
                {"speaker": "ai", "content": "b"},
                {"speaker": "human", "content": "c"},
                {"speaker": "ai", "content": "d"}
            ]
        }))
        .unwrap();

        assert!(history.len() <= history.capacity());
        assert_eq!(history.render(), "Human: c\nAI: d");
    }

    #[test]
    fn test_serialized_history_loads_back() {
        let mut history = ConversationHistory::new(4);
        history.record(exchange(1));

        let value = serde_json::to_value(&history).unwrap();
        let loaded: ConversationHistory = serde_json::from_value(value).unwrap();
        assert_eq!(loaded, history);
    }

    #[test]
    fn test_entry_serialization() {
        let value = serde_json::to_value(HistoryEntry::ai("done")).unwrap();
        assert_eq!(value, serde_json::json!({"speaker": "ai", "content": "done"}));
    }
}
