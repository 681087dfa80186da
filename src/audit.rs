//! Pipeline audit log
//!
//! Appends one JSONL entry per completed pipeline stage for debugging and
//! cost review. Writing never blocks or fails a run.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Mutex;
use uuid::Uuid;

/// Longest detail string stored per entry
const MAX_DETAIL_LEN: usize = 500;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StageStatus {
    Success,
    Error,
}

/// Outcome of one pipeline stage
#[derive(Debug, Clone)]
pub struct StageRecord<'a> {
    pub run_id: Uuid,
    pub stage: &'a str,
    pub status: StageStatus,
    pub model: Option<&'a str>,
    pub detail: Option<String>,
    pub duration_ms: u64,
}

/// Entry in the audit log
#[derive(Debug, Serialize)]
struct AuditEntry<'a> {
    timestamp: DateTime<Utc>,
    run_id: Uuid,
    stage: &'a str,
    status: StageStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    model: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    detail: Option<String>,
    duration_ms: u64,
}

/// Writer for audit log entries
#[derive(Debug)]
struct AuditLogWriter {
    path: PathBuf,
}

impl AuditLogWriter {
    fn write(&self, entry: &AuditEntry<'_>) -> std::io::Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;

        let json = serde_json::to_string(entry)?;
        writeln!(file, "{}", json)?;
        Ok(())
    }
}

/// Shared handle to a JSONL audit file
#[derive(Debug, Clone)]
pub struct AuditLog {
    writer: Arc<Mutex<AuditLogWriter>>,
}

impl AuditLog {
    pub fn new(log_path: impl Into<PathBuf>) -> Self {
        Self {
            writer: Arc::new(Mutex::new(AuditLogWriter {
                path: log_path.into(),
            })),
        }
    }

    pub async fn record(&self, record: StageRecord<'_>) {
        let entry = AuditEntry {
            timestamp: Utc::now(),
            run_id: record.run_id,
            stage: record.stage,
            status: record.status,
            model: record.model,
            detail: record.detail.map(|d| truncate_detail(&d)),
            duration_ms: record.duration_ms,
        };

        let writer = self.writer.lock().await;
        if let Err(e) = writer.write(&entry) {
            tracing::warn!(error = %e, "Failed to write audit log entry");
        }
    }
}

fn truncate_detail(detail: &str) -> String {
    match detail.char_indices().nth(MAX_DETAIL_LEN) {
        Some((idx, _)) => format!("{}... [truncated]", &detail[..idx]),
        None => detail.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[tokio::test]
    async fn test_logs_stage_entries() {
        let temp_file = NamedTempFile::new().unwrap();
        let audit = AuditLog::new(temp_file.path());
        let run_id = Uuid::new_v4();

        audit
            .record(StageRecord {
                run_id,
                stage: "GENERATE",
                status: StageStatus::Success,
                model: Some("o4-mini"),
                detail: None,
                duration_ms: 1200,
            })
            .await;
        audit
            .record(StageRecord {
                run_id,
                stage: "PARSE",
                status: StageStatus::Error,
                model: None,
                detail: Some("Generated output not valid JSON".to_string()),
                duration_ms: 0,
            })
            .await;

        let content = std::fs::read_to_string(temp_file.path()).unwrap();
        let lines: Vec<serde_json::Value> = content
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect();

        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0]["stage"], "GENERATE");
        assert_eq!(lines[0]["status"], "success");
        assert_eq!(lines[0]["model"], "o4-mini");
        assert_eq!(lines[1]["status"], "error");
        assert_eq!(lines[1]["run_id"], run_id.to_string());
        assert!(lines[1].get("model").is_none());
    }

    #[tokio::test]
    async fn test_unwritable_path_does_not_panic() {
        let audit = AuditLog::new("/nonexistent-dir/audit.jsonl");
        audit
            .record(StageRecord {
                run_id: Uuid::new_v4(),
                stage: "REPAIR",
                status: StageStatus::Success,
                model: None,
                detail: None,
                duration_ms: 5,
            })
            .await;
    }

    #[test]
    fn test_truncate_detail() {
        let long = "y".repeat(2000);
        let truncated = truncate_detail(&long);
        assert!(truncated.ends_with("... [truncated]"));
        assert_eq!(truncate_detail("short"), "short");
    }
}
