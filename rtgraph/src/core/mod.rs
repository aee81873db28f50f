//! Deterministic, pure logic of the graph generator.
//!
//! Core modules must be free of I/O side effects. They turn a raw actor into
//! a linked container graph and report violations as [`error::ModelError`].

pub mod annotation;
pub mod builder;
pub mod error;
pub mod facts;
pub mod label;
pub mod linker;
pub mod registry;
pub mod types;
pub mod validator;
