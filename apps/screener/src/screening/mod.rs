//! HTTP handlers for parsing and screening uploaded resumes.

pub mod handlers;
pub mod upload;
