//! Stable exit codes for rtgraph CLI commands.

/// Command succeeded.
pub const OK: i32 = 0;
/// The model was rejected by the label, annotation or structural rules.
pub const MODEL_REJECTED: i32 = 1;
/// Any other failure (I/O, config, schema, arguments).
pub const FAILURE: i32 = 2;
