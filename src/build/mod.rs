//! Build support shared by every task.
//!
//! - **Context**: configuration, paths and mode handed to each task
//! - **Discovery**: glob resolution with `{a,b}` alternatives
//! - **Progress**: reporting sequence and task lifecycle events

pub mod context;
pub mod discovery;
pub mod progress;

pub use context::*;
pub use discovery::*;
