use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use chrono::{DateTime, SecondsFormat, TimeDelta, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row, TransactionBehavior};
use rusqlite_migration::{Migrations, M};

use crate::app::{PagemetaError, Result};
use crate::domain::{Task, TaskOutcome, TaskStats, TaskStatus};
use crate::store::Store;

const TASK_COLUMNS: &str = "id, url, owner_id, status, title, description, keywords, \
                            error_message, created_at, processed_at";

pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path)?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.run_migrations()?;
        Ok(store)
    }

    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.run_migrations()?;
        Ok(store)
    }

    fn run_migrations(&self) -> Result<()> {
        let migrations = Migrations::new(vec![M::up(include_str!(
            "../../migrations/001-initial/up.sql"
        ))]);

        let mut conn = self.lock()?;

        conn.busy_timeout(Duration::from_secs(5))?;
        migrations
            .to_latest(&mut conn)
            .map_err(|e| PagemetaError::Config(format!("Database migration failed: {}", e)))?;

        Ok(())
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|e| {
            PagemetaError::Database(rusqlite::Error::SqliteFailure(
                rusqlite::ffi::Error::new(1),
                Some(e.to_string()),
            ))
        })
    }

    fn parse_datetime(s: &str) -> Option<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(s)
            .map(|dt| dt.with_timezone(&Utc))
            .ok()
            .or_else(|| s.parse::<DateTime<Utc>>().ok())
    }

    /// Fixed-width RFC 3339 so that string order is time order.
    fn format_datetime(dt: &DateTime<Utc>) -> String {
        dt.to_rfc3339_opts(SecondsFormat::Micros, true)
    }

    fn lease_cutoff(lease: Duration) -> Result<String> {
        let lease = TimeDelta::from_std(lease)
            .map_err(|e| PagemetaError::Config(format!("Invalid claim lease: {}", e)))?;
        Ok(Self::format_datetime(&(Utc::now() - lease)))
    }

    fn row_to_task(row: &Row<'_>) -> rusqlite::Result<Task> {
        let status = row
            .get::<_, String>(3)?
            .parse::<TaskStatus>()
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(3, Type::Text, e.into()))?;

        let keywords = row
            .get::<_, Option<String>>(6)?
            .map(|raw| serde_json::from_str::<Vec<String>>(&raw))
            .transpose()
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(6, Type::Text, Box::new(e)))?;

        Ok(Task {
            id: row.get(0)?,
            url: row.get(1)?,
            owner_id: row.get(2)?,
            status,
            title: row.get(4)?,
            description: row.get(5)?,
            keywords,
            error_message: row.get(7)?,
            created_at: row
                .get::<_, String>(8)
                .ok()
                .and_then(|s| Self::parse_datetime(&s))
                .unwrap_or_else(Utc::now),
            processed_at: row
                .get::<_, Option<String>>(9)?
                .and_then(|s| Self::parse_datetime(&s)),
        })
    }
}

impl Store for SqliteStore {
    fn add_tasks(&self, tasks: &[Task]) -> Result<Vec<i64>> {
        let mut conn = self.lock()?;

        let tx = conn.transaction()?;
        let mut ids = Vec::with_capacity(tasks.len());

        {
            let mut stmt = tx.prepare(
                "INSERT INTO tasks (url, owner_id, status, created_at) VALUES (?1, ?2, 'pending', ?3)",
            )?;
            for task in tasks {
                stmt.execute(params![
                    task.url,
                    task.owner_id,
                    Self::format_datetime(&task.created_at)
                ])?;
                ids.push(tx.last_insert_rowid());
            }
        }

        tx.commit()?;
        Ok(ids)
    }

    fn get_task(&self, id: i64) -> Result<Option<Task>> {
        let conn = self.lock()?;

        let result = conn
            .query_row(
                &format!("SELECT {} FROM tasks WHERE id = ?1", TASK_COLUMNS),
                params![id],
                Self::row_to_task,
            )
            .optional()?;

        Ok(result)
    }

    /// Oldest unclaimed pending tasks first.
    fn select_pending(&self, limit: usize) -> Result<Vec<Task>> {
        let conn = self.lock()?;

        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM tasks
             WHERE status = 'pending' AND claimed_at IS NULL
             ORDER BY created_at, id LIMIT ?1",
            TASK_COLUMNS
        ))?;

        let tasks = stmt
            .query_map(params![limit as i64], Self::row_to_task)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(tasks)
    }

    fn claim_pending(&self, limit: usize, claimant: &str, lease: Duration) -> Result<Vec<Task>> {
        let cutoff = Self::lease_cutoff(lease)?;
        let claimed_at = Self::format_datetime(&Utc::now());

        let mut conn = self.lock()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let ids: Vec<i64> = {
            let mut stmt = tx.prepare(
                "SELECT id FROM tasks
                 WHERE status = 'pending' AND (claimed_at IS NULL OR claimed_at < ?1)
                 ORDER BY created_at, id LIMIT ?2",
            )?;
            let rows = stmt.query_map(params![cutoff, limit as i64], |row| row.get(0))?;
            rows.collect::<std::result::Result<Vec<_>, _>>()?
        };

        let mut tasks = Vec::with_capacity(ids.len());
        {
            let mut claim =
                tx.prepare("UPDATE tasks SET claimed_by = ?1, claimed_at = ?2 WHERE id = ?3")?;
            let mut select =
                tx.prepare(&format!("SELECT {} FROM tasks WHERE id = ?1", TASK_COLUMNS))?;

            for id in ids {
                claim.execute(params![claimant, claimed_at, id])?;
                tasks.push(select.query_row(params![id], Self::row_to_task)?);
            }
        }

        tx.commit()?;
        Ok(tasks)
    }

    fn release_stale_claims(&self, lease: Duration) -> Result<usize> {
        let cutoff = Self::lease_cutoff(lease)?;
        let conn = self.lock()?;

        let released = conn.execute(
            "UPDATE tasks SET claimed_by = NULL, claimed_at = NULL
             WHERE status = 'pending' AND claimed_at IS NOT NULL AND claimed_at < ?1",
            params![cutoff],
        )?;

        Ok(released)
    }

    fn update_result(&self, id: i64, outcome: &TaskOutcome) -> Result<()> {
        let processed_at = Self::format_datetime(&Utc::now());
        let conn = self.lock()?;

        // The status guard keeps terminal rows immutable.
        let changed = match outcome {
            TaskOutcome::Completed(meta) => {
                let keywords = serde_json::to_string(&meta.keywords)?;
                conn.execute(
                    "UPDATE tasks SET status = 'completed', title = ?1, description = ?2,
                     keywords = ?3, error_message = NULL, processed_at = ?4,
                     claimed_by = NULL, claimed_at = NULL
                     WHERE id = ?5 AND status = 'pending'",
                    params![meta.title, meta.description, keywords, processed_at, id],
                )?
            }
            TaskOutcome::Failed { error_message } => conn.execute(
                "UPDATE tasks SET status = 'failed', title = NULL, description = NULL,
                 keywords = NULL, error_message = ?1, processed_at = ?2,
                 claimed_by = NULL, claimed_at = NULL
                 WHERE id = ?3 AND status = 'pending'",
                params![error_message, processed_at, id],
            )?,
        };

        if changed == 0 {
            let exists: bool = conn.query_row(
                "SELECT EXISTS(SELECT 1 FROM tasks WHERE id = ?1)",
                params![id],
                |row| row.get(0),
            )?;
            return Err(if exists {
                PagemetaError::AlreadyTerminal(id)
            } else {
                PagemetaError::TaskNotFound(id)
            });
        }

        Ok(())
    }

    fn get_tasks_by_owner(&self, owner_id: &str, status: Option<TaskStatus>) -> Result<Vec<Task>> {
        let conn = self.lock()?;

        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM tasks
             WHERE owner_id = ?1 AND (?2 IS NULL OR status = ?2)
             ORDER BY created_at DESC, id DESC",
            TASK_COLUMNS
        ))?;

        let tasks = stmt
            .query_map(
                params![owner_id, status.map(|s| s.as_str())],
                Self::row_to_task,
            )?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(tasks)
    }

    fn delete_by_status(&self, owner_id: &str, status: TaskStatus) -> Result<usize> {
        if !status.is_terminal() {
            return Err(PagemetaError::Other(
                "Only completed or failed tasks can be cleared".to_string(),
            ));
        }

        let conn = self.lock()?;
        let deleted = conn.execute(
            "DELETE FROM tasks WHERE owner_id = ?1 AND status = ?2",
            params![owner_id, status.as_str()],
        )?;

        Ok(deleted)
    }

    fn owner_stats(&self, owner_id: &str) -> Result<TaskStats> {
        let conn = self.lock()?;

        let (total, pending, completed, failed) = conn.query_row(
            "SELECT COUNT(*),
                    COALESCE(SUM(status = 'pending'), 0),
                    COALESCE(SUM(status = 'completed'), 0),
                    COALESCE(SUM(status = 'failed'), 0)
             FROM tasks WHERE owner_id = ?1",
            params![owner_id],
            |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?)),
        )?;

        let mut stmt = conn.prepare(
            "SELECT created_at, processed_at FROM tasks
             WHERE owner_id = ?1 AND processed_at IS NOT NULL",
        )?;
        let durations = stmt
            .query_map(params![owner_id], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?
            .into_iter()
            .filter_map(|(created, processed)| {
                let created = Self::parse_datetime(&created)?;
                let processed = Self::parse_datetime(&processed)?;
                Some(processed.signed_duration_since(created).num_milliseconds())
            })
            .collect::<Vec<_>>();

        let avg_processing_secs = if durations.is_empty() {
            None
        } else {
            let total_ms: i64 = durations.iter().sum();
            Some(total_ms as f64 / durations.len() as f64 / 1000.0)
        };

        Ok(TaskStats {
            total,
            pending,
            completed,
            failed,
            avg_processing_secs,
        })
    }
}
