use mosaic_events::{domain_event, event_union};

domain_event! {
    /// A project was created inside a workspace.
    pub struct ProjectCreated {
        context: Projects,
        aggregate: "project",
        slots: { workspace_id: Required },
        fields: {
            project_id: String,
            name: String,
            /// URL-safe name, unique per workspace.
            slug: String,
            description: Option<String> = None,
        },
    }
}

domain_event! {
    /// A project was archived; its tasks stay readable.
    pub struct ProjectArchived {
        context: Projects,
        aggregate: "project",
        slots: { workspace_id: Required },
        fields: {
            project_id: String,
        },
    }
}

domain_event! {
    pub struct TaskAdded {
        context: Projects,
        aggregate: "task",
        slots: { workspace_id: Required },
        fields: {
            task_id: String,
            project_id: String,
            title: String,
            assignee_id: Option<String> = None,
        },
    }
}

event_union! {
    /// Every event the projects context emits.
    pub enum ProjectsEvent {
        ProjectCreated,
        ProjectArchived,
        TaskAdded,
    }
}
