use mosaic_events::{domain_event, event_union};

domain_event! {
    pub struct DocumentCreated {
        context: Documents,
        aggregate: "document",
        slots: { workspace_id: Required },
        fields: {
            document_id: String,
            title: String,
            project_id: Option<String> = None,
        },
    }
}

domain_event! {
    /// A new revision of a document was saved.
    pub struct DocumentUpdated {
        context: Documents,
        aggregate: "document",
        slots: { workspace_id: Required },
        fields: {
            document_id: String,
            title: String,
            /// Strictly increasing per document, starting at 1.
            revision: u64,
        },
    }
}

domain_event! {
    pub struct DocumentDeleted {
        context: Documents,
        aggregate: "document",
        slots: { workspace_id: Required },
        fields: {
            document_id: String,
        },
    }
}

event_union! {
    pub enum DocumentsEvent {
        DocumentCreated,
        DocumentUpdated,
        DocumentDeleted,
    }
}
