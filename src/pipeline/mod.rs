pub mod chat;
pub mod extraction;
pub mod fallback;
pub mod llm;
pub mod structuring;
