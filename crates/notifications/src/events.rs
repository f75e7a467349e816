use mosaic_events::{domain_event, event_union};

domain_event! {
    /// A notification for one user. Global when `workspace_id` is absent.
    pub struct NotificationCreated {
        context: Notifications,
        aggregate: "notification",
        slots: { target_user_id: Required },
        fields: {
            notification_id: String,
            notification_type: String,
            title: String,
            link: Option<String> = None,
        },
    }
}

domain_event! {
    pub struct NotificationRead {
        context: Notifications,
        aggregate: "notification",
        slots: { target_user_id: Required },
        fields: {
            notification_id: String,
        },
    }
}

event_union! {
    pub enum NotificationsEvent {
        NotificationCreated,
        NotificationRead,
    }
}
