//! Wire protocol: envelope codec and constants

pub mod constants;
pub mod message;

pub use message::{Message, MessageType};
