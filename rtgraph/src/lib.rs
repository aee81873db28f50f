//! Runtime goal model to time-indexed container graph.
//!
//! Actors of a goal-oriented requirements model are turned into a shared-node
//! graph of goal and plan containers. Each container carries its temporal
//! coordinates and the cross-references stated by runtime annotations, ready
//! for a state-transition emitter. The architecture enforces a strict
//! separation:
//!
//! - **[`core`]**: Pure, deterministic logic (parsing, validation, graph
//!   construction, linking). No I/O, fully testable in isolation.
//! - **[`io`]**: Side-effecting operations (model and config files, emitters).
//!
//! [`generate`] coordinates both to implement the CLI commands.

pub mod core;
pub mod exit_codes;
pub mod generate;
pub mod io;
pub mod logging;
pub mod model;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
