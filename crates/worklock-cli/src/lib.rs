//! # worklock-cli — Operator Tooling
//!
//! Subcommand handlers for the `worklock` binary. Each module owns one
//! subcommand: its clap arguments and its handler.

pub mod demo;
pub mod inspect;
pub mod run;
