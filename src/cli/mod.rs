//! # CLI Module
//!
//! Command-line access to the CORS engine, shipped as the `brrtcors` binary.
//!
//! ## Commands
//!
//! ### `check`
//!
//! Merge and validate a configuration file; prints one line per policy and
//! exits non-zero on the first invalid one:
//!
//! ```bash
//! brrtcors check --config cors.yaml
//! ```
//!
//! ### `resolve`
//!
//! Show the headers a request would receive:
//!
//! ```bash
//! brrtcors resolve --config cors.yaml \
//!     --method OPTIONS --path /widgets \
//!     --origin https://app.example.com --request-method PUT
//! ```
//!
//! `--config` may also come from `BRRTCORS_CONFIG`. Logging is configured
//! through the `BRRTCORS_LOG_*` variables (see [`crate::logging`]).

mod commands;

#[cfg(test)]
mod tests;

pub use commands::{build_table, run_cli, Cli, Commands};
