use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::Metadata;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    Pending,
    Completed,
    Failed,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::Completed => "completed",
            TaskStatus::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, TaskStatus::Pending)
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pending" => Ok(TaskStatus::Pending),
            "completed" => Ok(TaskStatus::Completed),
            "failed" => Ok(TaskStatus::Failed),
            other => Err(format!(
                "Invalid status: {}. Use pending, completed or failed",
                other
            )),
        }
    }
}

/// One URL's scrape request plus its eventual outcome.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: i64,
    pub url: String,
    pub owner_id: String,
    pub status: TaskStatus,
    pub title: Option<String>,
    pub description: Option<String>,
    pub keywords: Option<Vec<String>>,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub processed_at: Option<DateTime<Utc>>,
}

impl Task {
    /// Builds an unsaved pending task. The store assigns the real id.
    pub fn new(url: impl Into<String>, owner_id: impl Into<String>) -> Self {
        Self {
            id: 0,
            url: url.into(),
            owner_id: owner_id.into(),
            status: TaskStatus::Pending,
            title: None,
            description: None,
            keywords: None,
            error_message: None,
            created_at: Utc::now(),
            processed_at: None,
        }
    }

    pub fn display_title(&self) -> &str {
        self.title.as_deref().unwrap_or(&self.url)
    }

    /// Time between admission and the terminal transition.
    pub fn processing_time(&self) -> Option<Duration> {
        self.processed_at
            .map(|done| done.signed_duration_since(self.created_at))
    }

    /// Whether the field layout matches what `status` allows.
    pub fn is_consistent(&self) -> bool {
        match self.status {
            TaskStatus::Pending => {
                self.title.is_none()
                    && self.description.is_none()
                    && self.keywords.is_none()
                    && self.error_message.is_none()
            }
            TaskStatus::Completed => self.error_message.is_none() && self.keywords.is_some(),
            TaskStatus::Failed => {
                self.error_message.is_some()
                    && self.title.is_none()
                    && self.description.is_none()
                    && self.keywords.is_none()
            }
        }
    }
}

/// The single terminal transition a pending task can take.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskOutcome {
    Completed(Metadata),
    Failed { error_message: String },
}

impl TaskOutcome {
    pub fn failed(message: impl Into<String>) -> Self {
        TaskOutcome::Failed {
            error_message: message.into(),
        }
    }

    pub fn status(&self) -> TaskStatus {
        match self {
            TaskOutcome::Completed(_) => TaskStatus::Completed,
            TaskOutcome::Failed { .. } => TaskStatus::Failed,
        }
    }
}

/// Per-owner aggregate over stored tasks.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TaskStats {
    pub total: i64,
    pub pending: i64,
    pub completed: i64,
    pub failed: i64,
    /// Mean seconds from admission to terminal state, if any task finished.
    pub avg_processing_secs: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_task_is_pending_and_consistent() {
        let task = Task::new("https://example.com", "user-1");
        assert_eq!(task.id, 0);
        assert_eq!(task.status, TaskStatus::Pending);
        assert!(task.is_consistent());
        assert!(task.processing_time().is_none());
    }

    #[test]
    fn test_status_round_trips_through_str() {
        for status in [TaskStatus::Pending, TaskStatus::Completed, TaskStatus::Failed] {
            assert_eq!(status.as_str().parse::<TaskStatus>().unwrap(), status);
        }
        assert_eq!(" Failed ".parse::<TaskStatus>().unwrap(), TaskStatus::Failed);
        assert!("running".parse::<TaskStatus>().is_err());
    }

    #[test]
    fn test_terminal_states() {
        assert!(!TaskStatus::Pending.is_terminal());
        assert!(TaskStatus::Completed.is_terminal());
        assert!(TaskStatus::Failed.is_terminal());
    }

    #[test]
    fn test_failed_task_with_title_is_inconsistent() {
        let mut task = Task::new("https://example.com", "user-1");
        task.status = TaskStatus::Failed;
        task.error_message = Some("HTTP 404 Not Found".into());
        assert!(task.is_consistent());

        task.title = Some("Example".into());
        assert!(!task.is_consistent());
    }

    #[test]
    fn test_completed_task_allows_missing_title() {
        let mut task = Task::new("https://example.com", "user-1");
        task.status = TaskStatus::Completed;
        task.keywords = Some(vec![]);
        assert!(task.is_consistent());
    }

    #[test]
    fn test_display_title_falls_back_to_url() {
        let mut task = Task::new("https://example.com", "user-1");
        assert_eq!(task.display_title(), "https://example.com");
        task.title = Some("Example Domain".into());
        assert_eq!(task.display_title(), "Example Domain");
    }

    #[test]
    fn test_outcome_status() {
        assert_eq!(
            TaskOutcome::Completed(Metadata::default()).status(),
            TaskStatus::Completed
        );
        assert_eq!(TaskOutcome::failed("boom").status(), TaskStatus::Failed);
    }
}
