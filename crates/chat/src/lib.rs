//! Chat context: conversations inside (or outside) workspaces.

pub mod events;
pub mod message;

pub use events::{ChatEvent, MessagePosted};
pub use message::{post_message, PostMessage, MAX_BODY_LEN};
