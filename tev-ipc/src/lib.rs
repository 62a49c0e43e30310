//! # tev-ipc: command-line remote control for tev
//!
//! Thin layer over `tev-ipc-core`: TOML configuration and the demo driver
//! used by the `tev-ipc` binary.

pub mod config;
pub mod demo;
