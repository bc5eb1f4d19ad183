//! Run Report: what one run read, dropped and wrote
use crate::context::RunContext;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub run_id: String,
    pub job: String,
    pub started_at: DateTime<Utc>,
    pub elapsed_ms: u64,
    /// Hooks invoked before the first row was pulled
    pub pre_processes: usize,
    /// One entry per source, in definition order
    pub sources: Vec<SourceStats>,
    /// Rows a transform turned into nothing
    pub rows_dropped: u64,
    /// One entry per destination, in definition order
    pub destinations: Vec<DestinationStats>,
    /// Hooks invoked after every destination was closed
    pub post_processes: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceStats {
    pub component: String,
    pub rows_read: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DestinationStats {
    pub component: String,
    pub rows_written: u64,
    pub closed: bool,
}

impl RunReport {
    pub fn new(ctx: &RunContext) -> Self {
        Self {
            run_id: ctx.run_id.clone(),
            job: ctx.job.clone(),
            started_at: Utc::now(),
            elapsed_ms: 0,
            pre_processes: 0,
            sources: Vec::new(),
            rows_dropped: 0,
            destinations: Vec::new(),
            post_processes: 0,
        }
    }

    pub fn rows_read(&self) -> u64 {
        self.sources.iter().map(|s| s.rows_read).sum()
    }

    /// Rows that made it through every transform.
    pub fn rows_delivered(&self) -> u64 {
        self.rows_read() - self.rows_dropped
    }

    pub fn summary(&self) -> String {
        format!(
            "{} [{}]: {} read, {} dropped, {} delivered to {} destination(s) in {}ms",
            self.job,
            self.run_id,
            self.rows_read(),
            self.rows_dropped,
            self.rows_delivered(),
            self.destinations.len(),
            self.elapsed_ms
        )
    }
}
