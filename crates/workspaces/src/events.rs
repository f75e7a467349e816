use mosaic_events::{domain_event, event_union};

domain_event! {
    pub struct WorkspaceCreated {
        context: Workspaces,
        aggregate: "workspace",
        slots: { workspace_id: Required },
        fields: {
            name: String,
            owner_id: String,
        },
    }
}

domain_event! {
    /// Someone was invited into a workspace. Delivered to the invitee's user topic.
    pub struct MemberInvited {
        context: Workspaces,
        aggregate: "membership",
        slots: { workspace_id: Required, target_user_id: Required },
        fields: {
            invitee_email: String,
            role: String = "member".to_string(),
        },
    }
}

domain_event! {
    pub struct MemberJoined {
        context: Workspaces,
        aggregate: "membership",
        slots: { workspace_id: Required },
        fields: {
            user_id: String,
            role: String,
        },
    }
}

event_union! {
    pub enum WorkspacesEvent {
        WorkspaceCreated,
        MemberInvited,
        MemberJoined,
    }
}
