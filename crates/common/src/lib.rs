//! Common types shared across the Quill crates.
//!
//! This crate provides the error type, the chat message model that every
//! completion call is built from, and the tolerant JSON extraction used to
//! recover structured data from model output.

pub mod error;
pub mod json;
pub mod message;

pub use error::{QuillError, Result};
pub use json::{extract_json_object, parse_json_object};
pub use message::{AgentMessage, ContentPart, MessageContent, MessageRole};
