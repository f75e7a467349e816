use serde::{Deserialize, Serialize};
use serde_json::json;

use mosaic_core::{ensure_id, new_id, DomainError, DomainResult};
use mosaic_events::{emit_event, EventBus, EventDefinition};

use crate::events::{DocumentCreated, DocumentDeleted, DocumentUpdated};

const MAX_TITLE_LEN: usize = 200;

/// Command: CreateDocument.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateDocument {
    pub workspace_id: String,
    pub actor_id: String,
    pub title: String,
    pub project_id: Option<String>,
}

/// Command: UpdateDocument.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateDocument {
    pub workspace_id: String,
    pub actor_id: String,
    pub document_id: String,
    pub title: String,
    /// Revision being written (previous revision + 1).
    pub revision: u64,
}

/// Command: DeleteDocument.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteDocument {
    pub workspace_id: String,
    pub actor_id: String,
    pub document_id: String,
}

fn validate_title(title: &str) -> DomainResult<&str> {
    let title = title.trim();
    if title.is_empty() {
        return Err(DomainError::validation("document title cannot be empty"));
    }
    if title.chars().count() > MAX_TITLE_LEN {
        return Err(DomainError::validation(format!(
            "document title exceeds {MAX_TITLE_LEN} characters"
        )));
    }
    Ok(title)
}

pub fn create_document<B>(bus: &B, cmd: CreateDocument) -> DomainResult<DocumentCreated>
where
    B: EventBus,
    DocumentCreated: Into<B::Event>,
{
    ensure_id("workspace_id", &cmd.workspace_id)?;
    let title = validate_title(&cmd.title)?;

    let document_id = new_id();
    let event = DocumentCreated::construct(json!({
        "aggregate_id": document_id,
        "actor_id": cmd.actor_id,
        "workspace_id": cmd.workspace_id,
        "document_id": document_id,
        "title": title,
        "project_id": cmd.project_id,
    }))?;

    emit_event(bus, event)
}

pub fn update_document<B>(bus: &B, cmd: UpdateDocument) -> DomainResult<DocumentUpdated>
where
    B: EventBus,
    DocumentUpdated: Into<B::Event>,
{
    ensure_id("document_id", &cmd.document_id)?;
    let title = validate_title(&cmd.title)?;
    if cmd.revision == 0 {
        return Err(DomainError::invariant("revisions start at 1"));
    }

    let event = DocumentUpdated::construct(json!({
        "aggregate_id": cmd.document_id,
        "actor_id": cmd.actor_id,
        "workspace_id": cmd.workspace_id,
        "document_id": cmd.document_id,
        "title": title,
        "revision": cmd.revision,
    }))?;

    emit_event(bus, event)
}

pub fn delete_document<B>(bus: &B, cmd: DeleteDocument) -> DomainResult<DocumentDeleted>
where
    B: EventBus,
    DocumentDeleted: Into<B::Event>,
{
    ensure_id("document_id", &cmd.document_id)?;

    let event = DocumentDeleted::construct(json!({
        "aggregate_id": cmd.document_id,
        "actor_id": cmd.actor_id,
        "workspace_id": cmd.workspace_id,
        "document_id": cmd.document_id,
    }))?;

    emit_event(bus, event)
}
