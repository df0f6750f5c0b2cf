// The per-user profile: the source material base resumes are built from.

pub mod handlers;
pub mod repo;
