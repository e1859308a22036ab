use anyhow::{anyhow, bail};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Wire format for `due_date`: ISO calendar date, no time component.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Lifecycle state of a task. Wire labels the gateway does not recognize are
/// kept verbatim in `Other` so a full-record resubmit cannot corrupt them.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(from = "String", into = "String")]
pub enum Status {
    NotStarted,
    InProgress,
    Done,
    Other(String),
}

impl Status {
    pub fn label(&self) -> &str {
        match self {
            Status::NotStarted => "not-started",
            Status::InProgress => "in-progress",
            Status::Done => "done",
            Status::Other(raw) => raw,
        }
    }

    pub fn is_recognized(&self) -> bool {
        !matches!(self, Status::Other(_))
    }
}

impl From<String> for Status {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "not-started" => Status::NotStarted,
            "in-progress" => Status::InProgress,
            "done" => Status::Done,
            _ => Status::Other(raw),
        }
    }
}

impl From<Status> for String {
    fn from(status: Status) -> Self {
        status.label().to_string()
    }
}

impl std::str::FromStr for Status {
    type Err = anyhow::Error;

    /// Strict parse for user input; the tolerant path is the serde impl.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match Status::from(s.to_string()) {
            Status::Other(raw) => Err(anyhow!(
                "unknown status: {raw} (expected not-started, in-progress or done)"
            )),
            status => Ok(status),
        }
    }
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(from = "String", into = "String")]
pub enum Priority {
    Low,
    Medium,
    High,
    Other(String),
}

impl Priority {
    pub fn label(&self) -> &str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
            Priority::Other(raw) => raw,
        }
    }

    /// Severity rank used for sorting; unrecognized labels rank below `low`.
    pub fn rank(&self) -> u8 {
        match self {
            Priority::High => 3,
            Priority::Medium => 2,
            Priority::Low => 1,
            Priority::Other(_) => 0,
        }
    }

    pub fn is_recognized(&self) -> bool {
        !matches!(self, Priority::Other(_))
    }
}

impl From<String> for Priority {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "low" => Priority::Low,
            "medium" => Priority::Medium,
            "high" => Priority::High,
            _ => Priority::Other(raw),
        }
    }
}

impl From<Priority> for String {
    fn from(priority: Priority) -> Self {
        priority.label().to_string()
    }
}

impl std::str::FromStr for Priority {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match Priority::from(s.to_string()) {
            Priority::Other(raw) => Err(anyhow!(
                "unknown priority: {raw} (expected low, medium or high)"
            )),
            priority => Ok(priority),
        }
    }
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// A task record as the gateway returns it. `id` is opaque and assigned
/// server-side; the client never invents one.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Task {
    #[serde(rename = "_id")]
    pub id: String,

    pub title: String,

    pub status: Status,

    pub priority: Priority,

    pub due_date: String,

    #[serde(default)]
    pub members: Vec<String>,
}

impl Task {
    /// Parsed due date, if the stored string is a valid ISO date.
    pub fn due(&self) -> Option<NaiveDate> {
        NaiveDate::parse_from_str(&self.due_date, DATE_FORMAT).ok()
    }
}

/// Fields for a create call; the gateway assigns the id.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TaskDraft {
    pub title: String,
    pub status: Status,
    pub priority: Priority,
    pub due_date: String,
    #[serde(default)]
    pub members: Vec<String>,
}

impl TaskDraft {
    /// Pre-network validation; a failure here means no gateway call is made.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.title.trim().is_empty() {
            bail!("title must not be empty");
        }
        if self.due_date.trim().is_empty() {
            bail!("due date is required");
        }
        NaiveDate::parse_from_str(&self.due_date, DATE_FORMAT)
            .map_err(|err| anyhow!("invalid due date {:?}: {err}", self.due_date))?;
        Ok(())
    }
}

/// Field overlay for an edit. The gateway's update call replaces the whole
/// record, so a patch is merged into the fetched record before resubmitting.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskPatch {
    pub title: Option<String>,
    pub status: Option<Status>,
    pub priority: Option<Priority>,
    pub due_date: Option<String>,
    pub members: Option<Vec<String>>,
}

impl TaskPatch {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.status.is_none()
            && self.priority.is_none()
            && self.due_date.is_none()
            && self.members.is_none()
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if let Some(title) = &self.title
            && title.trim().is_empty()
        {
            bail!("title must not be empty");
        }
        if let Some(due_date) = &self.due_date {
            NaiveDate::parse_from_str(due_date, DATE_FORMAT)
                .map_err(|err| anyhow!("invalid due date {due_date:?}: {err}"))?;
        }
        Ok(())
    }

    pub fn apply_to(&self, task: &mut Task) {
        if let Some(title) = &self.title {
            task.title = title.clone();
        }
        if let Some(status) = &self.status {
            task.status = status.clone();
        }
        if let Some(priority) = &self.priority {
            task.priority = priority.clone();
        }
        if let Some(due_date) = &self.due_date {
            task.due_date = due_date.clone();
        }
        if let Some(members) = &self.members {
            task.members = members.clone();
        }
    }
}
