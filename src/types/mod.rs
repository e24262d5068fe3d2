//! Core Types
//!
//! Conversation, configuration, tool and delta types shared by every backend.

mod conversation;
mod delta;
mod generation;
mod tools;

pub use conversation::*;
pub use delta::*;
pub use generation::*;
pub use tools::*;
