//! Claude provider implementation
//!
//! Streams completions from the Anthropic Messages API using an API key.

pub mod client;
pub mod mapper;
pub mod sse;
pub mod types;

pub use client::{ClaudeClient, ClaudeModel};
