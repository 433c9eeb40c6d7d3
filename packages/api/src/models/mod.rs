//! Data models for the application.

mod profile;

pub use profile::{ApprovalStatus, UserProfile};
