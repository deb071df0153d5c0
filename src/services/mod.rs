pub mod extract;
pub mod llm;
pub mod parser;
pub mod pipeline;
pub mod prompt;
pub mod queue;
pub mod registry;
pub mod retry;
pub mod storage;
pub mod worker;
