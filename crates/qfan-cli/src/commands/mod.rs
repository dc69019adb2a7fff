//! CLI command implementations.

pub mod common;
pub mod demo;
pub mod pack;
