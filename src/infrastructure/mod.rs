//! # Infrastructure Layer
//!
//! Implementations of the domain traits that talk to the outside world: the
//! TCP server front ends connect to, the in-memory user store and the console
//! replier.

pub mod console;
pub mod memory_store;
pub mod server;
