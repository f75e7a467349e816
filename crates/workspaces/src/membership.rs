use core::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::json;

use mosaic_core::{ensure_id, new_id, DomainError, DomainResult};
use mosaic_events::{emit_event, EventBus, EventDefinition};

use crate::events::{MemberInvited, MemberJoined, WorkspaceCreated};

/// Membership role inside a workspace.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Owner,
    Admin,
    Member,
    Viewer,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Owner => "owner",
            Role::Admin => "admin",
            Role::Member => "member",
            Role::Viewer => "viewer",
        }
    }
}

impl FromStr for Role {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "owner" => Ok(Role::Owner),
            "admin" => Ok(Role::Admin),
            "member" => Ok(Role::Member),
            "viewer" => Ok(Role::Viewer),
            other => Err(DomainError::validation(format!("unknown role: {other}"))),
        }
    }
}

/// Command: CreateWorkspace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateWorkspace {
    pub owner_id: String,
    pub name: String,
}

/// Command: InviteMember.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InviteMember {
    pub workspace_id: String,
    pub inviter_id: String,
    pub invitee_id: String,
    pub invitee_email: String,
    pub role: Role,
}

/// Command: JoinWorkspace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoinWorkspace {
    pub workspace_id: String,
    pub user_id: String,
    pub role: Role,
}

pub fn create_workspace<B>(bus: &B, cmd: CreateWorkspace) -> DomainResult<WorkspaceCreated>
where
    B: EventBus,
    WorkspaceCreated: Into<B::Event>,
{
    ensure_id("owner_id", &cmd.owner_id)?;
    let name = cmd.name.trim();
    if name.is_empty() {
        return Err(DomainError::validation("workspace name cannot be empty"));
    }

    let workspace_id = new_id();
    let event = WorkspaceCreated::construct(json!({
        "aggregate_id": workspace_id,
        "actor_id": cmd.owner_id,
        "workspace_id": workspace_id,
        "name": name,
        "owner_id": cmd.owner_id,
    }))?;

    emit_event(bus, event)
}

pub fn invite_member<B>(bus: &B, cmd: InviteMember) -> DomainResult<MemberInvited>
where
    B: EventBus,
    MemberInvited: Into<B::Event>,
{
    ensure_id("workspace_id", &cmd.workspace_id)?;
    ensure_id("invitee_id", &cmd.invitee_id)?;
    if cmd.role == Role::Owner {
        return Err(DomainError::invariant("ownership cannot be granted by invitation"));
    }
    if !cmd.invitee_email.contains('@') {
        return Err(DomainError::validation("invitee_email must be an email address"));
    }
    if cmd.inviter_id == cmd.invitee_id {
        return Err(DomainError::invariant("cannot invite yourself"));
    }

    let event = MemberInvited::construct(json!({
        "aggregate_id": format!("{}:{}", cmd.workspace_id, cmd.invitee_id),
        "actor_id": cmd.inviter_id,
        "workspace_id": cmd.workspace_id,
        "target_user_id": cmd.invitee_id,
        "invitee_email": cmd.invitee_email,
        "role": cmd.role.as_str(),
    }))?;

    emit_event(bus, event)
}

pub fn join_workspace<B>(bus: &B, cmd: JoinWorkspace) -> DomainResult<MemberJoined>
where
    B: EventBus,
    MemberJoined: Into<B::Event>,
{
    ensure_id("workspace_id", &cmd.workspace_id)?;
    ensure_id("user_id", &cmd.user_id)?;

    let event = MemberJoined::construct(json!({
        "aggregate_id": format!("{}:{}", cmd.workspace_id, cmd.user_id),
        "actor_id": cmd.user_id,
        "workspace_id": cmd.workspace_id,
        "user_id": cmd.user_id,
        "role": cmd.role.as_str(),
    }))?;

    emit_event(bus, event)
}
