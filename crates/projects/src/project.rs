use serde::{Deserialize, Serialize};
use serde_json::json;

use mosaic_core::{ensure_id, new_id, slugify, DomainError, DomainResult};
use mosaic_events::{emit_event, EventBus, EventDefinition};

use crate::events::{ProjectArchived, ProjectCreated, TaskAdded};

/// Command: CreateProject.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateProject {
    pub workspace_id: String,
    pub actor_id: String,
    /// Generated when absent.
    pub project_id: Option<String>,
    pub name: String,
    pub description: Option<String>,
}

/// Command: ArchiveProject.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArchiveProject {
    pub workspace_id: String,
    pub actor_id: String,
    pub project_id: String,
}

/// Command: AddTask.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddTask {
    pub workspace_id: String,
    pub actor_id: String,
    pub project_id: String,
    pub title: String,
    pub assignee_id: Option<String>,
}

pub fn create_project<B>(bus: &B, cmd: CreateProject) -> DomainResult<ProjectCreated>
where
    B: EventBus,
    ProjectCreated: Into<B::Event>,
{
    ensure_id("workspace_id", &cmd.workspace_id)?;
    let name = cmd.name.trim();
    if name.is_empty() {
        return Err(DomainError::validation("project name cannot be empty"));
    }
    let slug = slugify(name);
    if slug.is_empty() {
        return Err(DomainError::validation("project name must contain a letter or digit"));
    }

    let project_id = cmd.project_id.unwrap_or_else(new_id);
    let event = ProjectCreated::construct(json!({
        "aggregate_id": project_id,
        "actor_id": cmd.actor_id,
        "workspace_id": cmd.workspace_id,
        "project_id": project_id,
        "name": name,
        "slug": slug,
        "description": cmd.description,
    }))?;

    emit_event(bus, event)
}

pub fn archive_project<B>(bus: &B, cmd: ArchiveProject) -> DomainResult<ProjectArchived>
where
    B: EventBus,
    ProjectArchived: Into<B::Event>,
{
    ensure_id("workspace_id", &cmd.workspace_id)?;
    ensure_id("project_id", &cmd.project_id)?;
    let event = ProjectArchived::construct(json!({
        "aggregate_id": cmd.project_id,
        "actor_id": cmd.actor_id,
        "workspace_id": cmd.workspace_id,
        "project_id": cmd.project_id,
    }))?;

    emit_event(bus, event)
}

pub fn add_task<B>(bus: &B, cmd: AddTask) -> DomainResult<TaskAdded>
where
    B: EventBus,
    TaskAdded: Into<B::Event>,
{
    ensure_id("workspace_id", &cmd.workspace_id)?;
    ensure_id("project_id", &cmd.project_id)?;
    if cmd.title.trim().is_empty() {
        return Err(DomainError::validation("task title cannot be empty"));
    }

    let task_id = new_id();
    let event = TaskAdded::construct(json!({
        "aggregate_id": task_id,
        "actor_id": cmd.actor_id,
        "workspace_id": cmd.workspace_id,
        "task_id": task_id,
        "project_id": cmd.project_id,
        "title": cmd.title.trim(),
        "assignee_id": cmd.assignee_id,
    }))?;

    emit_event(bus, event)
}
