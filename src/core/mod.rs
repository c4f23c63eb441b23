/// Record <-> view model conversion
pub mod mapper;
/// Note operations against the `notes` table
pub mod notes;
/// Payment operations against the `reminders` table
pub mod payments;
/// Form suggestion heuristics
pub mod suggest;
/// Tag operations against the `tags` table
pub mod tags;
