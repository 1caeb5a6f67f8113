//! themekit - build pipeline for front-end theme assets
//!
//! This library provides:
//! - A task registry and fail-fast sequencer
//! - Build mode state threaded through every task
//! - A watch trigger re-running sequences on file changes
//! - The built-in theme tasks and the entrypoints composing them

pub mod build;
pub mod cli;
pub mod config;
pub mod entrypoint;
pub mod mode;
pub mod sequence;
pub mod task;
pub mod tasks;
pub mod watch;
