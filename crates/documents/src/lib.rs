//! Documents context.

pub mod document;
pub mod events;

pub use document::{create_document, delete_document, update_document, CreateDocument, DeleteDocument, UpdateDocument};
pub use events::{DocumentCreated, DocumentDeleted, DocumentUpdated, DocumentsEvent};
