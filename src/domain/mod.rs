//! # Domain Layer
//!
//! Core definitions, types, and traits that define the business domain of the framework.
//! Independent of specific platforms, serving as the contract for other layers.

pub mod config;
pub mod error;
pub mod reply;
pub mod traits;
pub mod types;
