use std::path::Path;

use crate::app::{AppContext, PagemetaError, Result};
use crate::domain::{Task, TaskStatus};
use crate::store::Store;
use crate::worker::{Schedule, WorkerConfig};

/// Worker settings given on the command line; unset values keep the config.
#[derive(Debug, Default)]
pub struct WorkerOverrides {
    pub batch_size: Option<usize>,
    pub interval: Option<String>,
    pub concurrency: Option<usize>,
    pub claim: bool,
    pub fixed_rate: bool,
}

impl WorkerOverrides {
    pub fn apply(self, mut config: WorkerConfig) -> Result<WorkerConfig> {
        if let Some(batch_size) = self.batch_size {
            config.batch_size = batch_size;
        }
        if let Some(interval) = self.interval {
            config.interval_secs =
                WorkerConfig::parse_interval(&interval).map_err(PagemetaError::Config)?;
        }
        if let Some(concurrency) = self.concurrency {
            config.concurrency = concurrency;
        }
        if self.claim {
            config.claim = true;
        }
        if self.fixed_rate {
            config.schedule = Schedule::FixedRate;
        }

        config.validate().map_err(PagemetaError::Config)?;
        Ok(config)
    }
}

pub fn submit(ctx: &AppContext, owner: &str, file: Option<&Path>, urls: &[String]) -> Result<()> {
    let mut candidates: Vec<String> = urls.to_vec();

    if let Some(path) = file {
        let content = std::fs::read_to_string(path)?;
        candidates.extend(content.lines().map(String::from));
    }

    if candidates.is_empty() {
        println!("No URLs given");
        return Ok(());
    }

    let report = ctx.admit(owner, &candidates)?;

    for rejected in &report.rejected {
        eprintln!("  Rejected: {:?}", rejected);
    }
    println!(
        "Queued {} URLs for {} ({} rejected)",
        report.task_ids.len(),
        owner,
        report.rejected.len()
    );

    Ok(())
}

pub fn list_tasks(
    ctx: &AppContext,
    owner: &str,
    status: Option<TaskStatus>,
    json: bool,
) -> Result<()> {
    let tasks = ctx.store.get_tasks_by_owner(owner, status)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&tasks)?);
        return Ok(());
    }

    if tasks.is_empty() {
        println!("No tasks");
        return Ok(());
    }

    for task in tasks {
        let date = task.created_at.format("%Y-%m-%d %H:%M");
        println!(
            "#{:<6} {:<9} {} {}",
            task.id,
            task.status.as_str(),
            date,
            task.display_title()
        );
        if let Some(error) = &task.error_message {
            println!("         {}", error);
        }
    }

    Ok(())
}

pub fn show_task(ctx: &AppContext, id: i64) -> Result<()> {
    let task = ctx
        .store
        .get_task(id)?
        .ok_or(PagemetaError::TaskNotFound(id))?;

    print_task(&task);
    Ok(())
}

fn print_task(task: &Task) {
    println!("Task #{}", task.id);
    println!("  URL:         {}", task.url);
    println!("  Owner:       {}", task.owner_id);
    println!("  Status:      {}", task.status);
    println!("  Created:     {}", task.created_at.to_rfc3339());

    if let Some(processed) = task.processed_at {
        println!("  Processed:   {}", processed.to_rfc3339());
    }
    if let Some(elapsed) = task.processing_time() {
        println!(
            "  Took:        {:.1}s",
            elapsed.num_milliseconds() as f64 / 1000.0
        );
    }
    if let Some(title) = &task.title {
        println!("  Title:       {}", title);
    }
    if let Some(description) = &task.description {
        println!("  Description: {}", description);
    }
    if let Some(keywords) = task.keywords.as_ref().filter(|k| !k.is_empty()) {
        println!("  Keywords:    {}", keywords.join(", "));
    }
    if let Some(error) = &task.error_message {
        println!("  Error:       {}", error);
    }
}

pub fn show_stats(ctx: &AppContext, owner: &str) -> Result<()> {
    let stats = ctx.store.owner_stats(owner)?;

    println!("Tasks for {}", owner);
    println!("  Total:     {}", stats.total);
    println!("  Pending:   {}", stats.pending);
    println!("  Completed: {}", stats.completed);
    println!("  Failed:    {}", stats.failed);
    match stats.avg_processing_secs {
        Some(avg) => println!("  Avg time:  {:.1}s", avg),
        None => println!("  Avg time:  -"),
    }

    Ok(())
}

pub fn clear_tasks(ctx: &AppContext, owner: &str, status: TaskStatus) -> Result<()> {
    let removed = ctx.store.delete_by_status(owner, status)?;
    println!("Removed {} {} tasks for {}", removed, status, owner);
    Ok(())
}

pub async fn run_worker(ctx: &AppContext, once: bool, overrides: WorkerOverrides) -> Result<()> {
    let config = overrides.apply(ctx.config.worker.clone())?;
    let worker = ctx.worker(config);

    if once {
        let report = worker.run_cycle().await?;
        println!(
            "Processed {} tasks: {} completed, {} failed, {} not recorded",
            report.selected, report.completed, report.failed, report.write_errors
        );
        return Ok(());
    }

    println!(
        "Worker {} polling every {} (Ctrl+C to stop)",
        worker.worker_id(),
        WorkerConfig::format_interval(worker.config().interval_secs)
    );
    worker.run_until_signal().await
}
