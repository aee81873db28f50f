//! I/O helpers for rtgraph commands.

pub mod config;
pub mod emitter;
pub mod init;
pub mod model_store;
