pub mod config;
pub mod conversation;
pub mod export;
pub mod llm;
pub mod outline;
pub mod prompts;
pub mod stream;
pub mod workflow;
