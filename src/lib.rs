//! dtrules: turn decision-tree DOT dumps into human-readable rules.
//!
//! Layers, innermost first: `domain` (parsing, tree building, path
//! enumeration), `application` (file-backed services), `infrastructure`
//! (I/O traits and wiring), `cli`.

pub mod application;
pub mod cli;
pub mod config;
pub mod domain;
pub mod exitcode;
pub mod infrastructure;
pub mod util;
