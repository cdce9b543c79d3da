//! Core library for the `reqbench` CLI.
//!
//! The [`bench`] module holds the engine: a validated [`bench::Benchmark`]
//! probes the target once, measures a sequential baseline, then drains a
//! bounded concurrent batch and combines both rates into a score. HTTP goes
//! through the [`transport`] seam; [`report`] renders results for the CLI.
pub mod args;
pub mod bench;
pub mod config;
pub mod error;
pub mod logger;
pub mod report;
pub mod transport;
