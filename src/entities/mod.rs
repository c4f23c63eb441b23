//! Entity module - Contains the SeaORM entity definitions for the remote tables.
//! These are the remote record shapes; `crate::models` holds the view models
//! the rest of the application works with.

pub mod note;
pub mod reminder;
pub mod tag;

// Re-export specific types to avoid conflicts
pub use note::{Column as NoteColumn, Entity as NoteEntity, Model as NoteRecord};
pub use reminder::{Column as ReminderColumn, Entity as ReminderEntity, Model as ReminderRecord};
pub use tag::{Column as TagColumn, Entity as TagEntity, Model as TagRecord};
