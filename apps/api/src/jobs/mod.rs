// Saved job listings. Tailored resumes hang off these.

pub mod handlers;
pub mod repo;
