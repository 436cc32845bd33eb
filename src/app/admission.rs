use tracing::debug;

use crate::app::Result;
use crate::domain::Task;
use crate::store::Store;
use crate::validator::UrlValidator;

/// Outcome of submitting a batch of candidate URLs for one owner.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AdmissionReport {
    pub accepted: Vec<String>,
    pub rejected: Vec<String>,
    /// Ids of the created tasks, in the same order as `accepted`
    pub task_ids: Vec<i64>,
}

/// Validate candidates and enqueue one pending task per accepted URL.
///
/// Rejected candidates never reach the store. When nothing is accepted the
/// store is not touched at all.
pub fn admit<S, I, C>(store: &S, owner_id: &str, candidates: I) -> Result<AdmissionReport>
where
    S: Store + ?Sized,
    I: IntoIterator<Item = C>,
    C: AsRef<str>,
{
    let validation = UrlValidator::new().validate(candidates);

    let task_ids = if validation.accepted.is_empty() {
        Vec::new()
    } else {
        let tasks: Vec<Task> = validation
            .accepted
            .iter()
            .map(|url| Task::new(url.as_str(), owner_id))
            .collect();
        store.add_tasks(&tasks)?
    };

    debug!(
        "Admitted {} URLs for {} ({} rejected)",
        task_ids.len(),
        owner_id,
        validation.rejected_count()
    );

    Ok(AdmissionReport {
        accepted: validation.accepted,
        rejected: validation.rejected,
        task_ids,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::TaskStatus;
    use crate::store::SqliteStore;

    #[test]
    fn test_admit_mixed_batch() {
        let store = SqliteStore::in_memory().unwrap();
        let report = admit(
            &store,
            "user-1",
            ["https://a.com", "not a url", "ftp://x", "b.org/page"],
        )
        .unwrap();

        assert_eq!(report.accepted, vec!["https://a.com", "b.org/page"]);
        assert_eq!(report.rejected, vec!["not a url", "ftp://x"]);
        assert_eq!(report.task_ids.len(), 2);

        let tasks = store.get_tasks_by_owner("user-1", None).unwrap();
        assert_eq!(tasks.len(), 2);
        assert!(tasks.iter().all(|t| t.status == TaskStatus::Pending));
        assert!(tasks.iter().all(|t| t.title.is_none() && t.error_message.is_none()));
    }

    #[test]
    fn test_admit_keeps_duplicates() {
        let store = SqliteStore::in_memory().unwrap();
        let report = admit(&store, "u", ["https://a.com", "https://a.com"]).unwrap();

        assert_eq!(report.task_ids.len(), 2);
        assert_ne!(report.task_ids[0], report.task_ids[1]);
    }

    #[test]
    fn test_admit_nothing_valid_skips_store() {
        let store = SqliteStore::in_memory().unwrap();
        let report = admit(&store, "u", ["", "   ", "nope"]).unwrap();

        assert!(report.accepted.is_empty());
        assert_eq!(report.rejected.len(), 3);
        assert!(report.task_ids.is_empty());
        assert!(store.get_tasks_by_owner("u", None).unwrap().is_empty());
    }

    #[test]
    fn test_admit_scopes_tasks_to_owner() {
        let store = SqliteStore::in_memory().unwrap();
        admit(&store, "alice", ["https://a.com"]).unwrap();
        admit(&store, "bob", ["https://b.com", "https://c.com"]).unwrap();

        assert_eq!(store.get_tasks_by_owner("alice", None).unwrap().len(), 1);
        assert_eq!(store.get_tasks_by_owner("bob", None).unwrap().len(), 2);
    }
}
