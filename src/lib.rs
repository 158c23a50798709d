//! # Stagebot
//!
//! A messenger-agnostic bot framework. Users move through named stages; text,
//! inline-button payloads and uploads are routed to page handlers, and replies
//! are delivered per platform under a rate limit.

pub mod application;
pub mod domain;
pub mod infrastructure;
pub mod interface;
pub mod strings;
