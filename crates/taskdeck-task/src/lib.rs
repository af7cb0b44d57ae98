//! Persistence and interaction layer for taskdeck.
//!
//! [`TaskRepo`] maps the domain state onto a `KeyValueStore`; [`Controller`]
//! owns that state and turns user actions into mutations followed by a flush.

pub mod controller;
pub mod edit;
pub mod repo;

pub use controller::{Confirm, Controller, DELETE_PROMPT};
pub use edit::{EditBuffer, EditState};
pub use repo::{Snapshot, TaskRepo};
