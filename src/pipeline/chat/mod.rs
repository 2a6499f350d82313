pub mod prompt;
pub mod responder;

pub use prompt::*;
pub use responder::*;
