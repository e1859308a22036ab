use anyhow::Context;
use tracing::{debug, info, warn};

use crate::gateway::TaskGateway;
use crate::task::{Status, Task, TaskDraft, TaskPatch};
use crate::view::{self, ViewAction, ViewState};

/// A user-facing notification. Gateway failures never propagate out of the
/// session; they surface as exactly one of these and prior state is kept.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    Info(String),
    Error(String),
}

/// The task list view: the raw collection fetched from the gateway, the
/// current view state, and the notices queued for the user.
///
/// Consistency comes from one rule only: after every successful mutating
/// call the whole collection is re-fetched and replaced. The mutation
/// response is never trusted to reflect full server-side state, and nothing
/// is patched locally.
pub struct TaskListSession<G> {
    gateway: G,
    tasks: Vec<Task>,
    view: ViewState,
    notices: Vec<Notice>,
}

impl<G: TaskGateway> TaskListSession<G> {
    pub fn new(gateway: G) -> Self {
        Self {
            gateway,
            tasks: vec![],
            view: ViewState::default(),
            notices: vec![],
        }
    }

    /// Create the view with its initial fetch. A failed fetch leaves an
    /// empty, still-usable view behind one error notice.
    pub async fn mount(gateway: G) -> Self {
        let mut session = Self::new(gateway);
        if let Err(err) = session.refetch().await {
            warn!(error = %err, "initial task fetch failed");
            session
                .notices
                .push(Notice::Error(format!("failed to load tasks: {err:#}")));
        }
        session
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn view(&self) -> &ViewState {
        &self.view
    }

    /// The displayed sequence: filtered and sorted, source untouched.
    pub fn visible(&self) -> Vec<&Task> {
        view::derived(&self.tasks, &self.view)
    }

    pub fn apply(&mut self, action: ViewAction) {
        self.view = view::apply(self.view.clone(), action);
    }

    pub fn take_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    pub async fn submit_create(&mut self, draft: TaskDraft) {
        if let Err(err) = draft.validate() {
            self.notices
                .push(Notice::Error(format!("invalid task: {err:#}")));
            return;
        }

        match self.gateway.create(&draft).await {
            Ok(created) => {
                info!(id = %created.id, "task created");
                self.finish_mutation(format!("created task {:?}", draft.title))
                    .await;
            }
            Err(err) => self
                .notices
                .push(Notice::Error(format!("failed to create task: {err:#}"))),
        }
    }

    /// Edit form submit: any field, including a direct status value.
    pub async fn submit_edit(&mut self, id: &str, patch: TaskPatch) {
        if let Err(err) = patch.validate() {
            self.notices
                .push(Notice::Error(format!("invalid edit: {err:#}")));
            return;
        }
        if patch.is_empty() {
            self.notices
                .push(Notice::Info("nothing to change".to_string()));
            return;
        }

        match self.replace_record(id, |task| patch.apply_to(task)).await {
            Ok(_) => self.finish_mutation(format!("updated task {id}")).await,
            Err(err) => self.notices.push(Notice::Error(format!("{err:#}"))),
        }
    }

    /// Row-click transition: only a not-started task moves to in-progress.
    /// Clicking anything else is a no-op on this path, with no gateway write.
    pub async fn activate(&mut self, id: &str) {
        match self.gateway.get(id).await {
            Ok(current) if current.status != Status::NotStarted => {
                debug!(id, status = %current.status, "row click ignored, task already started");
            }
            Ok(mut current) => {
                current.status = Status::InProgress;
                match self.gateway.update(id, &current).await {
                    Ok(_) => self.finish_mutation(format!("started task {id}")).await,
                    Err(err) => self
                        .notices
                        .push(Notice::Error(format!("failed to start task {id}: {err:#}"))),
                }
            }
            Err(err) => self
                .notices
                .push(Notice::Error(format!("failed to fetch task {id}: {err:#}"))),
        }
    }

    /// Completion checkbox: done flips back to in-progress, anything else
    /// flips to done.
    pub async fn toggle_done(&mut self, id: &str) {
        let mut record = match self.gateway.get(id).await {
            Ok(record) => record,
            Err(err) => {
                self.notices
                    .push(Notice::Error(format!("failed to fetch task {id}: {err:#}")));
                return;
            }
        };

        record.status = if record.status == Status::Done {
            Status::InProgress
        } else {
            Status::Done
        };
        let status = record.status.clone();

        match self.gateway.update(id, &record).await {
            Ok(_) => {
                self.finish_mutation(format!("task {id} is now {status}"))
                    .await;
            }
            Err(err) => self
                .notices
                .push(Notice::Error(format!("failed to toggle task {id}: {err:#}"))),
        }
    }

    pub async fn remove(&mut self, id: &str) {
        match self.gateway.delete(id).await {
            Ok(()) => self.finish_mutation(format!("deleted task {id}")).await,
            Err(err) => self
                .notices
                .push(Notice::Error(format!("failed to delete task {id}: {err:#}"))),
        }
    }

    async fn refetch(&mut self) -> anyhow::Result<()> {
        self.tasks = self
            .gateway
            .list()
            .await
            .context("failed to fetch task list")?;
        debug!(count = self.tasks.len(), "task collection replaced");
        Ok(())
    }

    /// The update call replaces the whole record on the gateway side, so the
    /// current record is fetched and merged first; a partial body would
    /// erase the other fields.
    async fn replace_record(
        &mut self,
        id: &str,
        merge: impl FnOnce(&mut Task),
    ) -> anyhow::Result<Task> {
        let mut record = self
            .gateway
            .get(id)
            .await
            .with_context(|| format!("failed to fetch task {id}"))?;
        merge(&mut record);
        self.gateway
            .update(id, &record)
            .await
            .with_context(|| format!("failed to update task {id}"))
    }

    async fn finish_mutation(&mut self, message: String) {
        match self.refetch().await {
            Ok(()) => self.notices.push(Notice::Info(message)),
            Err(err) => self.notices.push(Notice::Error(format!(
                "{message}, but refreshing the list failed: {err:#}"
            ))),
        }
    }
}
