//! Album Art CLI Library
//!
//! Configuration, terminal output and command orchestration for the
//! `albumart` binary, exposed as a library so they can be tested directly.

pub mod config;
pub mod error;
pub mod orchestrators;
pub mod progress;
pub mod terminal;
