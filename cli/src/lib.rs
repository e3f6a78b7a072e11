//! pipewright-cli library: argument types and command wiring, shared by the
//! binary and its tests.

pub mod app;
pub mod commands;
