use std::cmp::Reverse;

use anyhow::anyhow;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::task::{Priority, Status, Task};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SortKey {
    #[default]
    DueDate,
    Priority,
}

impl std::str::FromStr for SortKey {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "due" | "due-date" | "due_date" => Ok(SortKey::DueDate),
            "pri" | "priority" => Ok(SortKey::Priority),
            other => Err(anyhow!(
                "unknown sort key: {other} (expected due-date or priority)"
            )),
        }
    }
}

impl std::fmt::Display for SortKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SortKey::DueDate => f.write_str("due-date"),
            SortKey::Priority => f.write_str("priority"),
        }
    }
}

/// The whole UI state of the task list view, as one serializable record.
/// Unset filter fields impose no constraint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ViewState {
    pub status_filter: Option<Status>,
    pub priority_filter: Option<Priority>,
    pub due_filter: Option<String>,
    pub sort: SortKey,
    pub form_open: bool,
    pub editing: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ViewAction {
    FilterStatus(Option<Status>),
    FilterPriority(Option<Priority>),
    FilterDue(Option<String>),
    SortBy(SortKey),
    OpenForm,
    CloseForm,
    BeginEdit(String),
    CancelEdit,
    ClearFilters,
}

/// Single update function for all view-state transitions.
pub fn apply(state: ViewState, action: ViewAction) -> ViewState {
    let mut next = state;
    match action {
        ViewAction::FilterStatus(status) => next.status_filter = status,
        ViewAction::FilterPriority(priority) => next.priority_filter = priority,
        ViewAction::FilterDue(due) => next.due_filter = due,
        ViewAction::SortBy(key) => next.sort = key,
        ViewAction::OpenForm => next.form_open = true,
        ViewAction::CloseForm | ViewAction::CancelEdit => {
            next.form_open = false;
            next.editing = None;
        }
        ViewAction::BeginEdit(id) => {
            next.editing = Some(id);
            next.form_open = true;
        }
        ViewAction::ClearFilters => {
            next.status_filter = None;
            next.priority_filter = None;
            next.due_filter = None;
        }
    }
    next
}

/// Pure filter predicate: every set filter must match exactly, filters AND
/// together. Due-date matching is exact string equality, not a range.
pub fn passes(task: &Task, state: &ViewState) -> bool {
    if let Some(status) = &state.status_filter
        && task.status != *status
    {
        return false;
    }
    if let Some(priority) = &state.priority_filter
        && task.priority != *priority
    {
        return false;
    }
    if let Some(due) = &state.due_filter
        && task.due_date != *due
    {
        return false;
    }
    true
}

/// Compute the displayed sequence from the raw collection and the view
/// state. The input is never mutated; the output is a fresh ordering.
/// Both sorts are stable, so ties keep their input order.
pub fn derived<'a>(tasks: &'a [Task], state: &ViewState) -> Vec<&'a Task> {
    let mut view: Vec<&Task> = tasks.iter().filter(|task| passes(task, state)).collect();

    match state.sort {
        // Unparseable dates order after every real one.
        SortKey::DueDate => view.sort_by_key(|task| task.due().unwrap_or(NaiveDate::MAX)),
        SortKey::Priority => view.sort_by_key(|task| Reverse(task.priority.rank())),
    }

    trace!(
        total = tasks.len(),
        visible = view.len(),
        sort = %state.sort,
        "derived view recomputed"
    );
    view
}
