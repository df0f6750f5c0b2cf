// Resume CRUD: base resumes built from the profile, tailored copies linked to a job.
// The base/tailored job link is checked here and by a CHECK constraint in the schema.

pub mod builder;
pub mod handlers;
pub mod repo;
