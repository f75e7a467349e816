//! Notifications context.
//!
//! Besides its own use cases, this context reacts to other contexts' events
//! (invitations, chat mentions) through [`reactions`].

pub mod events;
pub mod notification;
pub mod reactions;

pub use events::{NotificationCreated, NotificationRead, NotificationsEvent};
pub use notification::{mark_read, notify_user, MarkRead, Notify};
pub use reactions::{InvitationNotifier, MentionNotifier};
