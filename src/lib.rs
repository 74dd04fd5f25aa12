// src/lib.rs

//! pacbundle
//!
//! A declarative pacman wrapper. The desired system state is described as a
//! set of bundles in a TOML manifest; pacbundle compares it against the
//! explicitly installed packages and asks pacman to close the gap.
//!
//! # Architecture
//!
//! - Manifest-first: bundles, groups and packages live in `config.toml`
//! - Conditional bundles: an `include` shell condition decides participation
//! - Non-destructive sync: extra packages are demoted to dependencies, never removed
//! - pacman stays in charge: every mutation is a pacman command line

pub mod bundle;
pub mod commands;
pub mod config;
mod error;
pub mod exec;
pub mod output;
pub mod pacman;
pub mod reconcile;

pub use error::{Error, Result};
