//! Workspaces context: workspace lifecycle and membership.

pub mod events;
pub mod membership;

pub use events::{MemberInvited, MemberJoined, WorkspaceCreated, WorkspacesEvent};
pub use membership::{create_workspace, invite_member, join_workspace, CreateWorkspace, InviteMember, JoinWorkspace, Role};
