//! A client for a personal finance coach.
//!
//! The library is organized around four pieces of state: the `session::SessionShell`, which owns
//! the active view and whether any transaction data has been ingested, and the three controllers
//! it routes to (`upload`, `dashboard` and `conversation`). The controllers never do I/O
//! themselves; the `runtime::Runtime` executes their requests against an `api::Backend`.

pub mod api;
pub mod args;
pub mod commands;
mod config;
pub mod conversation;
pub mod dashboard;
mod error;
pub mod model;
pub mod render;
pub mod runtime;
pub mod session;
#[cfg(test)]
mod test;
pub mod upload;
mod utils;

pub use api::Mode;
pub use config::Config;
pub use error::Error;
pub use error::ErrorType;
pub use error::Result;
