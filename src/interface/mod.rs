//! # Interface Layer
//!
//! The bundled demo bot: its pages and the wiring that turns them into a
//! router and a reply division.

pub mod demo;
pub mod pages;
