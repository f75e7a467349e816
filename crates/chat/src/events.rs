use mosaic_events::{domain_event, event_union};

domain_event! {
    /// A message was posted to a conversation. Direct conversations have no workspace.
    pub struct MessagePosted {
        context: Chat,
        aggregate: "message",
        fields: {
            conversation_id: String,
            message_id: String,
            body: String,
            /// User ids mentioned in the body.
            mentions: Vec<String> = Vec::new(),
        },
    }
}

event_union! {
    pub enum ChatEvent {
        MessagePosted,
    }
}
