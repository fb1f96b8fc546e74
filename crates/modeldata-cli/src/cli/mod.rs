//! # CLI Behavior
//!
//! This is **one possible UI client** for modeldata, not the application itself.
//! The CLI is the only place that knows about terminal I/O, exit codes, and output formatting.
//!
//! For the overall architecture, see the crate-level documentation in [`crate`].
//!
//! ## One Process, One Operation
//!
//! Every invocation builds a fresh cache, so mutating commands always start with
//! a `load`:
//!
//! - `modeldata list events` loads and prints `[index] {record}` lines.
//! - `modeldata add events '{"title": "Assembly"}'` loads, then appends.
//! - `modeldata update events 0 '{...}'` loads, then replaces index 0.
//! - `modeldata delete events 0` loads, then removes index 0.
//!
//! If the load fails, its outcome is printed and nothing is written.
//!
//! ## Output
//!
//! Successes go to stdout, failures to stderr as `✗ <headline>: <message>`.
//! With `--json` the status snapshot is printed to stdout as one JSON line
//! instead. The exit code is 1 whenever the reported outcome is a failure.
//!
//! ## Module Structure
//!
//! - `commands`: Runtime setup, config resolution, dispatch
//! - `render`: Output formatting (listings, outcome lines, JSON)
//! - `setup`: Argument parsing via clap
//! - `logging`: tracing subscriber on stderr

mod commands;
mod logging;
mod render;
pub mod setup;

pub use commands::run;
