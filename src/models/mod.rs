pub mod conversation;
pub mod enums;
pub mod lab;
pub mod session;

pub use conversation::ConversationTurn;
pub use enums::{ConversationRole, ExportFormat, InvalidEnum, LabStatus, StatusLevel};
pub use lab::LabResult;
pub use session::{SessionRecord, MAX_CONVERSATION_TURNS};
