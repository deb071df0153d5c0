pub mod api;
pub mod evaluation;
pub mod job;
