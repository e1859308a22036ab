use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use anyhow::{anyhow, bail};
use taskdeck_core::cli::Command;
use taskdeck_core::commands;
use taskdeck_core::config::Config;
use taskdeck_core::gateway::TaskGateway;
use taskdeck_core::render::Renderer;
use taskdeck_core::session::{Notice, TaskListSession};
use taskdeck_core::task::{Priority, Status, Task, TaskDraft, TaskPatch};
use taskdeck_core::view::{SortKey, ViewAction};

/// In-memory stand-in for the remote task API. `update` replaces the whole
/// record, exactly like the real gateway contract.
#[derive(Default)]
struct MemoryGateway {
    tasks: Mutex<Vec<Task>>,
    next_id: AtomicU64,
    updates: AtomicU64,
    fail_next: AtomicBool,
}

impl MemoryGateway {
    fn with_tasks(tasks: Vec<Task>) -> Self {
        let gateway = Self {
            next_id: AtomicU64::new(tasks.len() as u64 + 1),
            ..Self::default()
        };
        *gateway.tasks.lock().expect("lock") = tasks;
        gateway
    }

    fn fail_next(&self) {
        self.fail_next.store(true, Ordering::SeqCst);
    }

    fn should_fail(&self) -> bool {
        self.fail_next.swap(false, Ordering::SeqCst)
    }

    fn snapshot(&self) -> Vec<Task> {
        self.tasks.lock().expect("lock").clone()
    }

    fn update_count(&self) -> u64 {
        self.updates.load(Ordering::SeqCst)
    }
}

impl TaskGateway for &MemoryGateway {
    async fn list(&self) -> anyhow::Result<Vec<Task>> {
        if self.should_fail() {
            bail!("gateway offline");
        }
        Ok(self.snapshot())
    }

    async fn get(&self, id: &str) -> anyhow::Result<Task> {
        if self.should_fail() {
            bail!("gateway offline");
        }
        self.tasks
            .lock()
            .expect("lock")
            .iter()
            .find(|task| task.id == id)
            .cloned()
            .ok_or_else(|| anyhow!("no task with id {id}"))
    }

    async fn create(&self, draft: &TaskDraft) -> anyhow::Result<Task> {
        if self.should_fail() {
            bail!("gateway offline");
        }
        let id = format!("t{}", self.next_id.fetch_add(1, Ordering::SeqCst));
        let task = Task {
            id,
            title: draft.title.clone(),
            status: draft.status.clone(),
            priority: draft.priority.clone(),
            due_date: draft.due_date.clone(),
            members: draft.members.clone(),
        };
        self.tasks.lock().expect("lock").push(task.clone());
        Ok(task)
    }

    async fn update(&self, id: &str, record: &Task) -> anyhow::Result<Task> {
        if self.should_fail() {
            bail!("gateway offline");
        }
        self.updates.fetch_add(1, Ordering::SeqCst);

        let mut tasks = self.tasks.lock().expect("lock");
        let slot = tasks
            .iter_mut()
            .find(|task| task.id == id)
            .ok_or_else(|| anyhow!("no task with id {id}"))?;
        *slot = record.clone();
        Ok(record.clone())
    }

    async fn delete(&self, id: &str) -> anyhow::Result<()> {
        if self.should_fail() {
            bail!("gateway offline");
        }
        let mut tasks = self.tasks.lock().expect("lock");
        let idx = tasks
            .iter()
            .position(|task| task.id == id)
            .ok_or_else(|| anyhow!("no task with id {id}"))?;
        tasks.remove(idx);
        Ok(())
    }
}

fn task(id: &str, status: Status, priority: Priority, due_date: &str) -> Task {
    Task {
        id: id.to_string(),
        title: format!("task {id}"),
        status,
        priority,
        due_date: due_date.to_string(),
        members: vec![],
    }
}

fn draft(title: &str) -> TaskDraft {
    TaskDraft {
        title: title.to_string(),
        status: Status::NotStarted,
        priority: Priority::Low,
        due_date: "2025-01-01".to_string(),
        members: vec![],
    }
}

fn has_error(notices: &[Notice]) -> bool {
    notices
        .iter()
        .any(|notice| matches!(notice, Notice::Error(_)))
}

#[tokio::test]
async fn create_round_trips_through_a_refetch() {
    let gateway = MemoryGateway::default();
    let mut session = TaskListSession::new(&gateway);

    session.submit_create(draft("A")).await;

    let notices = session.take_notices();
    assert!(!has_error(&notices), "unexpected error: {notices:?}");

    let tasks = session.tasks();
    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0].title, "A");
    assert_eq!(tasks[0].status, Status::NotStarted);
    assert_eq!(tasks[0].priority, Priority::Low);
    assert_eq!(tasks[0].due_date, "2025-01-01");
    assert!(!tasks[0].id.is_empty(), "gateway must assign the id");
}

#[tokio::test]
async fn delete_removes_the_task_from_subsequent_lists() {
    let gateway = MemoryGateway::with_tasks(vec![
        task("t1", Status::NotStarted, Priority::Low, "2025-01-01"),
        task("t2", Status::Done, Priority::High, "2025-02-01"),
    ]);
    let mut session = TaskListSession::mount(&gateway).await;

    session.remove("t1").await;

    assert!(!has_error(&session.take_notices()));
    assert!(session.tasks().iter().all(|t| t.id != "t1"));
    assert_eq!(session.tasks().len(), 1);
}

#[tokio::test]
async fn row_click_starts_only_not_started_tasks() {
    let gateway = MemoryGateway::with_tasks(vec![task(
        "t1",
        Status::NotStarted,
        Priority::Low,
        "2025-01-01",
    )]);
    let mut session = TaskListSession::mount(&gateway).await;

    session.activate("t1").await;
    assert_eq!(session.tasks()[0].status, Status::InProgress);
    assert_eq!(gateway.update_count(), 1);

    // A second click takes the idempotent no-op path: no gateway write.
    session.activate("t1").await;
    assert_eq!(session.tasks()[0].status, Status::InProgress);
    assert_eq!(gateway.update_count(), 1);

    assert!(!has_error(&session.take_notices()));
}

#[tokio::test]
async fn toggling_twice_restores_the_original_status() {
    let gateway = MemoryGateway::with_tasks(vec![
        task("t1", Status::InProgress, Priority::Low, "2025-01-01"),
        task("t2", Status::Done, Priority::Low, "2025-01-01"),
    ]);
    let mut session = TaskListSession::mount(&gateway).await;

    session.toggle_done("t1").await;
    assert_eq!(session.tasks()[0].status, Status::Done);
    session.toggle_done("t1").await;
    assert_eq!(session.tasks()[0].status, Status::InProgress);

    session.toggle_done("t2").await;
    assert_eq!(session.tasks()[1].status, Status::InProgress);
    session.toggle_done("t2").await;
    assert_eq!(session.tasks()[1].status, Status::Done);

    assert!(!has_error(&session.take_notices()));
}

#[tokio::test]
async fn status_changes_submit_the_full_record() {
    let mut seeded = task("t1", Status::InProgress, Priority::High, "2025-01-01");
    seeded.title = "Quarterly report".to_string();
    seeded.members = vec!["ana".to_string(), "rui".to_string()];

    let gateway = MemoryGateway::with_tasks(vec![seeded]);
    let mut session = TaskListSession::mount(&gateway).await;

    session.toggle_done("t1").await;

    // The merge-then-submit contract: nothing besides status may change.
    let stored = &gateway.snapshot()[0];
    assert_eq!(stored.status, Status::Done);
    assert_eq!(stored.title, "Quarterly report");
    assert_eq!(stored.priority, Priority::High);
    assert_eq!(stored.members, vec!["ana".to_string(), "rui".to_string()]);
}

#[tokio::test]
async fn edit_overlays_fields_onto_the_fetched_record() {
    let gateway = MemoryGateway::with_tasks(vec![task(
        "t1",
        Status::NotStarted,
        Priority::Low,
        "2025-01-01",
    )]);
    let mut session = TaskListSession::mount(&gateway).await;

    let patch = TaskPatch {
        priority: Some(Priority::High),
        due_date: Some("2025-06-30".to_string()),
        ..TaskPatch::default()
    };
    session.submit_edit("t1", patch).await;

    let stored = &gateway.snapshot()[0];
    assert_eq!(stored.priority, Priority::High);
    assert_eq!(stored.due_date, "2025-06-30");
    assert_eq!(stored.title, "task t1");
    assert!(!has_error(&session.take_notices()));
}

#[tokio::test]
async fn validation_failures_never_reach_the_gateway() {
    let gateway = MemoryGateway::default();
    let mut session = TaskListSession::new(&gateway);

    session.submit_create(draft("")).await;

    assert!(has_error(&session.take_notices()));
    assert!(gateway.snapshot().is_empty());
}

#[tokio::test]
async fn a_failed_mutation_retains_prior_state() {
    let gateway = MemoryGateway::with_tasks(vec![
        task("t1", Status::NotStarted, Priority::Low, "2025-01-01"),
        task("t2", Status::Done, Priority::High, "2025-02-01"),
    ]);
    let mut session = TaskListSession::mount(&gateway).await;
    session.take_notices();

    gateway.fail_next();
    session.remove("t1").await;

    assert!(has_error(&session.take_notices()));
    assert_eq!(session.tasks().len(), 2, "collection must stay untouched");
    assert_eq!(gateway.snapshot().len(), 2);
}

#[tokio::test]
async fn a_failed_mount_leaves_an_empty_usable_view() {
    let gateway = MemoryGateway::with_tasks(vec![task(
        "t1",
        Status::Done,
        Priority::Low,
        "2025-01-01",
    )]);

    gateway.fail_next();
    let mut session = TaskListSession::mount(&gateway).await;

    assert!(has_error(&session.take_notices()));
    assert!(session.tasks().is_empty());
    assert!(session.visible().is_empty());
}

#[tokio::test]
async fn refetch_picks_up_changes_made_behind_the_views_back() {
    let gateway = MemoryGateway::with_tasks(vec![task(
        "t1",
        Status::NotStarted,
        Priority::Low,
        "2025-01-01",
    )]);
    let mut session = TaskListSession::mount(&gateway).await;
    assert_eq!(session.tasks().len(), 1);

    // Another client adds a task; the next mutation's refetch must see it.
    gateway
        .tasks
        .lock()
        .expect("lock")
        .push(task("t9", Status::Done, Priority::High, "2025-03-01"));

    session.toggle_done("t1").await;
    assert_eq!(session.tasks().len(), 2);
}

#[tokio::test]
async fn listing_an_empty_collection_still_succeeds() {
    use std::io::Write;

    let mut deckrc = tempfile::NamedTempFile::new().expect("tempfile");
    writeln!(deckrc, "color = off").expect("write deckrc");
    let cfg = Config::load(Some(deckrc.path())).expect("load config");
    let mut renderer = Renderer::new(&cfg).expect("renderer");

    let gateway = MemoryGateway::default();
    let command = Command::List {
        status: None,
        priority: None,
        due: None,
        sort: SortKey::default(),
    };

    // The empty collection renders its dedicated state rather than failing.
    commands::dispatch(&gateway, &cfg, &mut renderer, command)
        .await
        .expect("list over an empty collection");
}

#[tokio::test]
async fn the_view_state_drives_what_is_visible() {
    let gateway = MemoryGateway::with_tasks(vec![
        task("t1", Status::Done, Priority::Low, "2025-03-01"),
        task("t2", Status::InProgress, Priority::High, "2025-01-01"),
        task("t3", Status::Done, Priority::Medium, "2025-02-01"),
    ]);
    let mut session = TaskListSession::mount(&gateway).await;

    session.apply(ViewAction::FilterStatus(Some(Status::Done)));
    session.apply(ViewAction::SortBy(SortKey::DueDate));

    let visible: Vec<&str> = session
        .visible()
        .iter()
        .map(|task| task.id.as_str())
        .collect();
    assert_eq!(visible, vec!["t3", "t1"]);

    // The underlying collection keeps the gateway order.
    let raw: Vec<&str> = session.tasks().iter().map(|task| task.id.as_str()).collect();
    assert_eq!(raw, vec!["t1", "t2", "t3"]);
}
