//! Event types shared by the unit tests of this crate.

use serde_json::json;

use crate::definition::EventDefinition;

crate::domain_event! {
    pub struct ProjectCreated {
        context: Projects,
        aggregate: "project",
        slots: { workspace_id: Required },
        fields: {
            project_id: String,
            name: String,
            slug: String,
            description: Option<String> = None,
        },
    }
}

crate::domain_event! {
    pub struct TaskAdded {
        context: Projects,
        aggregate: "task",
        fields: {
            task_id: String,
            title: String,
        },
    }
}

crate::domain_event! {
    pub struct UserPinged {
        context: Notifications,
        aggregate: "notification",
        slots: { target_user_id: Required },
        fields: {
            message: String,
        },
    }
}

crate::domain_event! {
    pub struct AccountClosed {
        context: Accounts,
        aggregate: "account",
        slots: { workspace_id = "global" },
        fields: {
            reason: String = "unspecified".to_string(),
        },
    }
}

crate::domain_event! {
    /// Declares base fields among its own fields.
    pub struct SiteAudited {
        context: Audits,
        aggregate: "site",
        fields: {
            workspace_id: String,
            target_user_id: String,
            score: u32,
        },
    }
}

crate::domain_event! {
    pub struct SiteArchived {
        context: Audits,
        aggregate: "site",
        fields: {
            workspace_id: String = "global".to_string(),
        },
    }
}

crate::event_union! {
    pub enum FixtureEvent {
        ProjectCreated,
        TaskAdded,
        UserPinged,
        AccountClosed,
    }
}

pub fn project_created(workspace_id: &str, project_id: &str) -> ProjectCreated {
    ProjectCreated::construct(json!({
        "aggregate_id": project_id,
        "actor_id": "u1",
        "workspace_id": workspace_id,
        "project_id": project_id,
        "name": "Demo",
        "slug": "demo",
    }))
    .unwrap()
}

pub fn task_added(workspace_id: Option<&str>, task_id: &str) -> TaskAdded {
    TaskAdded::construct(json!({
        "aggregate_id": task_id,
        "actor_id": "u1",
        "workspace_id": workspace_id,
        "task_id": task_id,
        "title": "Write docs",
    }))
    .unwrap()
}

pub fn user_pinged(target_user_id: &str) -> UserPinged {
    UserPinged::construct(json!({
        "aggregate_id": "n1",
        "actor_id": "u1",
        "target_user_id": target_user_id,
        "message": "hello",
    }))
    .unwrap()
}
