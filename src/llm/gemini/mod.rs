//! Gemini provider implementation
//!
//! Streams completions from the Google Generative Language API using an API key.

pub mod client;
pub mod mapper;
pub mod sse;
pub mod types;

pub use client::{GeminiClient, GeminiModel};
