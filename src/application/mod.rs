//! # Application Layer
//!
//! The routing core: identifier shortening, the payload codec, the transition
//! table with its router, the message handler and the per-platform reply
//! division.

pub mod division;
pub mod handler;
pub mod payloads;
pub mod route;
pub mod shortening;
pub mod throttle;
pub mod transitions;
