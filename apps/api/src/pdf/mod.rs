// Resume PDF pipeline: settings -> style sheet -> LaTeX source -> external engine.
// Rendered bytes are cached by content hash and archived to S3.

pub mod cache;
pub mod document;
pub mod handlers;
pub mod renderer;
pub mod service;
pub mod settings;
pub mod styles;
