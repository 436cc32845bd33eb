pub mod metadata;
pub mod task;

pub use metadata::Metadata;
pub use task::{Task, TaskOutcome, TaskStats, TaskStatus};
