use anyhow::anyhow;
use tracing::{debug, warn};

use crate::chart::ChartView;
use crate::cli::Command;
use crate::config::Config;
use crate::gateway::TaskGateway;
use crate::render::Renderer;
use crate::session::{Notice, TaskListSession};
use crate::task::{Priority, Status, TaskDraft, TaskPatch};
use crate::view::{SortKey, ViewAction};

/// Command used when none is given, taken from `default.command`.
pub fn default_command(cfg: &Config) -> Command {
    let default_list = Command::List {
        status: None,
        priority: None,
        due: None,
        sort: SortKey::default(),
    };

    match cfg.get("default.command").as_deref() {
        Some("chart") => Command::Chart,
        Some("list") | None => default_list,
        Some(other) => {
            warn!(command = other, "unknown default.command; falling back to list");
            default_list
        }
    }
}

pub async fn dispatch<G: TaskGateway>(
    gateway: G,
    cfg: &Config,
    renderer: &mut Renderer,
    command: Command,
) -> anyhow::Result<()> {
    debug!(command = ?command, "dispatching command");

    match command {
        Command::List {
            status,
            priority,
            due,
            sort,
        } => cmd_list(gateway, renderer, status, priority, due, sort).await,
        Command::Show { id } => cmd_show(gateway, renderer, &id).await,
        Command::Add {
            title,
            status,
            priority,
            due,
            members,
        } => cmd_add(gateway, renderer, title, status, priority, due, members).await,
        Command::Edit {
            id,
            title,
            status,
            priority,
            due,
            members,
        } => {
            let patch = TaskPatch {
                title,
                status,
                priority,
                due_date: due,
                members,
            };
            cmd_edit(gateway, renderer, &id, patch).await
        }
        Command::Start { id } => cmd_start(gateway, renderer, &id).await,
        Command::Toggle { id } => cmd_toggle(gateway, renderer, &id).await,
        Command::Delete { id } => cmd_delete(gateway, renderer, &id).await,
        Command::Chart => cmd_chart(gateway, renderer).await,
        Command::Config => cmd_config(cfg),
    }
}

async fn cmd_list<G: TaskGateway>(
    gateway: G,
    renderer: &mut Renderer,
    status: Option<Status>,
    priority: Option<Priority>,
    due: Option<String>,
    sort: SortKey,
) -> anyhow::Result<()> {
    let mut session = TaskListSession::mount(gateway).await;
    surface_notices(renderer, session.take_notices())?;

    session.apply(ViewAction::FilterStatus(status));
    session.apply(ViewAction::FilterPriority(priority));
    session.apply(ViewAction::FilterDue(due));
    session.apply(ViewAction::SortBy(sort));

    // The renderer surfaces the distinct empty state when nothing matches.
    renderer.print_task_table(&session.visible())
}

async fn cmd_show<G: TaskGateway>(
    gateway: G,
    renderer: &mut Renderer,
    id: &str,
) -> anyhow::Result<()> {
    let task = gateway.get(id).await?;
    renderer.print_task_info(&task)
}

async fn cmd_add<G: TaskGateway>(
    gateway: G,
    renderer: &mut Renderer,
    title: String,
    status: Option<Status>,
    priority: Option<Priority>,
    due: String,
    members: Vec<String>,
) -> anyhow::Result<()> {
    let draft = TaskDraft {
        title,
        status: status.unwrap_or(Status::NotStarted),
        priority: priority.unwrap_or(Priority::Low),
        due_date: due,
        members,
    };

    let mut session = TaskListSession::new(gateway);
    session.submit_create(draft).await;
    surface_notices(renderer, session.take_notices())
}

async fn cmd_edit<G: TaskGateway>(
    gateway: G,
    renderer: &mut Renderer,
    id: &str,
    patch: TaskPatch,
) -> anyhow::Result<()> {
    let mut session = TaskListSession::new(gateway);
    session.submit_edit(id, patch).await;
    surface_notices(renderer, session.take_notices())
}

async fn cmd_start<G: TaskGateway>(
    gateway: G,
    renderer: &mut Renderer,
    id: &str,
) -> anyhow::Result<()> {
    let mut session = TaskListSession::new(gateway);
    session.activate(id).await;
    surface_notices(renderer, session.take_notices())
}

async fn cmd_toggle<G: TaskGateway>(
    gateway: G,
    renderer: &mut Renderer,
    id: &str,
) -> anyhow::Result<()> {
    let mut session = TaskListSession::new(gateway);
    session.toggle_done(id).await;
    surface_notices(renderer, session.take_notices())
}

async fn cmd_delete<G: TaskGateway>(
    gateway: G,
    renderer: &mut Renderer,
    id: &str,
) -> anyhow::Result<()> {
    let mut session = TaskListSession::new(gateway);
    session.remove(id).await;
    surface_notices(renderer, session.take_notices())
}

async fn cmd_chart<G: TaskGateway>(gateway: G, renderer: &mut Renderer) -> anyhow::Result<()> {
    let chart = ChartView::mount(&gateway).await?;
    renderer.print_chart(&chart)
}

fn cmd_config(cfg: &Config) -> anyhow::Result<()> {
    let mut entries: Vec<(String, String)> = cfg
        .iter()
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect();
    entries.sort();

    for (key, value) in entries {
        println!("{key}={value}");
    }
    Ok(())
}

/// Print info notices; the first error notice aborts the command with a
/// single user-visible message. The session has already kept prior state.
fn surface_notices(renderer: &mut Renderer, notices: Vec<Notice>) -> anyhow::Result<()> {
    for notice in &notices {
        if let Notice::Info(message) = notice {
            renderer.print_notice(message)?;
        }
    }

    for notice in notices {
        if let Notice::Error(message) = notice {
            return Err(anyhow!(message));
        }
    }

    Ok(())
}
