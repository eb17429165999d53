// Learning roadmaps: read access and step progress.

pub mod handlers;
pub mod progress;
