//! A Rust library for decompiling binary programs through a local
//! [Ghidra](https://ghidra-sre.org/) installation.
//!
//! The library does not disassemble or decompile anything itself. It drives
//! Ghidra's headless analyzer: it keeps a scratch project on disk, imports
//! binaries into it, asks Ghidra to decompile every function, and assembles
//! the per-function C output into a single document. The accompanying
//! `gdecompile` tool exposes this pipeline on the command line.
//!
//! Ghidra has to be installed separately. Point the library at it either by
//! setting the `GHIDRA_INSTALL_DIR` environment variable or by giving the
//! full path to the `analyzeHeadless` launcher via `GHIDRA_ANALYZE_HEADLESS`.

// `error_chain!` can recurse deeply.
#![recursion_limit = "1024"]

// Add more lint checks.
#![deny(unsafe_code)]
#![deny(unstable_features)]
#![warn(trivial_casts)]
#![warn(trivial_numeric_casts)]
#![warn(unused_qualifications)]
#![warn(unused_extern_crates)]
#![warn(unused_import_braces)]

extern crate clap;
extern crate json;
extern crate regex;
#[macro_use]
extern crate error_chain;

/// Crate version.
pub const VERSION: &'static str = env!("CARGO_PKG_VERSION");

pub mod decompilation;
pub mod engine;
pub mod error;
pub mod program;
pub mod project;
pub mod settings;
pub mod tools;
