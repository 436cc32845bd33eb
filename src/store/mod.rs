pub mod sqlite;

use std::time::Duration;

use crate::app::Result;
use crate::domain::{Task, TaskOutcome, TaskStats, TaskStatus};

pub use sqlite::SqliteStore;

pub trait Store {
    // Queue operations used by the worker
    fn add_tasks(&self, tasks: &[Task]) -> Result<Vec<i64>>;
    fn get_task(&self, id: i64) -> Result<Option<Task>>;
    fn select_pending(&self, limit: usize) -> Result<Vec<Task>>;
    fn claim_pending(&self, limit: usize, claimant: &str, lease: Duration) -> Result<Vec<Task>>;
    fn release_stale_claims(&self, lease: Duration) -> Result<usize>;
    fn update_result(&self, id: i64, outcome: &TaskOutcome) -> Result<()>;

    // Owner-scoped reads and cleanup
    fn get_tasks_by_owner(&self, owner_id: &str, status: Option<TaskStatus>) -> Result<Vec<Task>>;
    fn delete_by_status(&self, owner_id: &str, status: TaskStatus) -> Result<usize>;
    fn owner_stats(&self, owner_id: &str) -> Result<TaskStats>;
}
