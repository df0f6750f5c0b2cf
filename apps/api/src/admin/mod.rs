// Admin surface: user directory listing and dashboard aggregates.
// Every route takes the `AdminUser` extractor.

pub mod handlers;
pub mod stats;
pub mod users;
