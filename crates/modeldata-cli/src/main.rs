//! # Modeldata CLI Architecture
//!
//! The `modeldata` binary is a thin client over the `modeldata` library: the CLI
//! lives in `src/cli/`, while this file only invokes `cli::run()` and decides the
//! process exit code.
//!
//! ## Workspace Structure
//!
//! - `crates/modeldata/`: core library (collection cache, status tracking, gateways)
//! - `crates/modeldata-cli/`: this CLI tool, depends on the `modeldata` library
//!
//! ## Layering
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  CLI Layer (crates/modeldata-cli/src/cli/)                  │
//! │  - clap argument parsing (setup.rs)                         │
//! │  - Runtime, config and command dispatch (commands.rs)       │
//! │  - Terminal rendering of records and outcomes (render.rs)   │
//! │  - tracing subscriber installation (logging.rs)             │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Cache Layer (crates/modeldata/src/cache.rs)                │
//! │  - load/create/update/delete against one collection         │
//! │  - Reports every result as a status Outcome                 │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Storage Layer (crates/modeldata/src/store/)                │
//! │  - FsGateway: one JSON document per collection              │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! The cache never returns errors; the CLI reads the tracker's last outcome and
//! turns a failure into exit code 1. Plumbing errors (bad config, bad JSON on the
//! command line, runtime setup) come back as `anyhow` errors and are printed as
//! `Error: ...`, also with exit code 1.
//!
//! ## Testing Approach
//!
//! - Rendering is unit tested in `render.rs` against canned outcomes.
//! - Argument parsing is unit tested in `setup.rs`.
//! - `tests/cli_e2e.rs` drives the real binary against a temporary data dir.

mod cli;

fn main() {
    match cli::run() {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}
