//! Projects context.
//!
//! Declares the project/task events and the use cases that emit them. No IO:
//! the bus is handed in by the caller.

pub mod events;
pub mod project;

pub use events::{ProjectArchived, ProjectCreated, ProjectsEvent, TaskAdded};
pub use project::{add_task, archive_project, create_project, AddTask, ArchiveProject, CreateProject};
