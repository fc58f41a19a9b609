//! Structured logging for the palette.
//!
//! Every layer logs through `tracing` macros: state transitions at `debug`,
//! per-keystroke detail at `trace`, swallowed failures (a skipped duplicate, a
//! failed spawn, a hook error) at `warn`. Pipeline work runs inside spans, and
//! resolutions are instrumented futures, so nested events carry the mode and
//! item they belong to.
//!
//! Libraries usually leave subscriber setup to the host; [`init_tracing`] is
//! a convenience for hosts that have none.
//!
//! # Configuration
//!
//! Trace level is controlled via:
//! 1. `RUST_LOG` environment variable (highest priority)
//! 2. `trace_level` config option
//! 3. Default: `"info"`
//!
//! # Modules
//!
//! - [`init`]: Tracing initialization and subscriber setup

mod init;

pub use init::init_tracing;
