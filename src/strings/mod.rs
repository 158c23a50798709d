//! # Strings Module
//!
//! Centralizes user-facing texts and log messages.

pub mod logs;
pub mod messages;
