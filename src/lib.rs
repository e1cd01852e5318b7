//! OpenAI-compatible chat proxy for Monica
//!
//! Translates OpenAI chat-completion requests into Monica's threaded bot-chat
//! requests, uploading embedded images to Monica file storage on the way.

pub mod app;
pub mod catalog;
pub mod error;
pub mod ingest;
pub mod models;
pub mod provider;
pub mod translate;

pub use error::{Error, IngestError, Result};
