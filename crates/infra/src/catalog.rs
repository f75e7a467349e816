//! Every event type declared in the system, as one sum type.
//!
//! Workers dispatch on it (`TryFrom<AnyEvent>`) and the legacy bridge matches
//! on it. A new event type has to be listed here before it can travel on the
//! production bus.

use mosaic_chat::MessagePosted;
use mosaic_documents::{DocumentCreated, DocumentDeleted, DocumentUpdated};
use mosaic_events::event_union;
use mosaic_notifications::{NotificationCreated, NotificationRead};
use mosaic_projects::{ProjectArchived, ProjectCreated, TaskAdded};
use mosaic_workspaces::{MemberInvited, MemberJoined, WorkspaceCreated};

event_union! {
    pub enum AnyEvent {
        WorkspaceCreated,
        MemberInvited,
        MemberJoined,
        ProjectCreated,
        ProjectArchived,
        TaskAdded,
        DocumentCreated,
        DocumentUpdated,
        DocumentDeleted,
        MessagePosted,
        NotificationCreated,
        NotificationRead,
    }
}

// Context-level unions widen into the catalog.
macro_rules! widen_context_union {
    ($krate:ident :: $union:ident { $( $variant:ident ),+ $(,)? }) => {
        impl From<$krate::$union> for AnyEvent {
            fn from(event: $krate::$union) -> Self {
                match event {
                    $( $krate::$union::$variant(inner) => AnyEvent::$variant(inner), )+
                }
            }
        }
    };
}

widen_context_union!(mosaic_workspaces::WorkspacesEvent { WorkspaceCreated, MemberInvited, MemberJoined });
widen_context_union!(mosaic_projects::ProjectsEvent { ProjectCreated, ProjectArchived, TaskAdded });
widen_context_union!(mosaic_documents::DocumentsEvent { DocumentCreated, DocumentUpdated, DocumentDeleted });
widen_context_union!(mosaic_chat::ChatEvent { MessagePosted });
widen_context_union!(mosaic_notifications::NotificationsEvent { NotificationCreated, NotificationRead });
