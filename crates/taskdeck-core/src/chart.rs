use serde::Serialize;
use tracing::debug;

use crate::gateway::TaskGateway;
use crate::task::{Priority, Status, Task};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatusCounts {
    pub not_started: u64,
    pub in_progress: u64,
    pub done: u64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PriorityCounts {
    pub low: u64,
    pub medium: u64,
    pub high: u64,
}

/// Count tasks per enumerated status. Labels outside the enumeration fall
/// into no bucket at all.
pub fn count_by_status(tasks: &[Task]) -> StatusCounts {
    let mut counts = StatusCounts::default();
    for task in tasks {
        match &task.status {
            Status::NotStarted => counts.not_started += 1,
            Status::InProgress => counts.in_progress += 1,
            Status::Done => counts.done += 1,
            Status::Other(_) => {}
        }
    }
    counts
}

pub fn count_by_priority(tasks: &[Task]) -> PriorityCounts {
    let mut counts = PriorityCounts::default();
    for task in tasks {
        match &task.priority {
            Priority::Low => counts.low += 1,
            Priority::Medium => counts.medium += 1,
            Priority::High => counts.high += 1,
            Priority::Other(_) => {}
        }
    }
    counts
}

/// Both frequency tables, computed from a single fetch at mount time. The
/// chart does not track later mutations made from the task list view.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ChartView {
    pub status: StatusCounts,
    pub priority: PriorityCounts,
}

impl ChartView {
    pub async fn mount<G: TaskGateway>(gateway: &G) -> anyhow::Result<Self> {
        let tasks = gateway.list().await?;
        debug!(count = tasks.len(), "aggregating tasks for chart view");
        Ok(Self {
            status: count_by_status(&tasks),
            priority: count_by_priority(&tasks),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::{count_by_priority, count_by_status};
    use crate::task::{Priority, Status, Task};

    fn task(status: Status, priority: Priority) -> Task {
        Task {
            id: "x".to_string(),
            title: "t".to_string(),
            status,
            priority,
            due_date: "2025-01-01".to_string(),
            members: vec![],
        }
    }

    #[test]
    fn counts_bucket_by_enumerated_status() {
        let tasks = vec![
            task(Status::Done, Priority::Low),
            task(Status::InProgress, Priority::Low),
            task(Status::Done, Priority::Low),
        ];
        let counts = count_by_status(&tasks);

        assert_eq!(counts.done, 2);
        assert_eq!(counts.in_progress, 1);
        assert_eq!(counts.not_started, 0);
    }

    #[test]
    fn unrecognized_labels_land_in_no_bucket() {
        let tasks = vec![
            task(Status::Other("archived".to_string()), Priority::Other("urgent".to_string())),
            task(Status::Done, Priority::High),
        ];

        let status = count_by_status(&tasks);
        assert_eq!(status.not_started + status.in_progress + status.done, 1);

        let priority = count_by_priority(&tasks);
        assert_eq!(priority.low + priority.medium + priority.high, 1);
    }
}
