pub mod job;
pub mod profile;
pub mod resume;
pub mod sections;
pub mod subscription;
pub mod user;
