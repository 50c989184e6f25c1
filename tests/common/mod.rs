//! Common functionality for integration tests.

use std::env;
use std::process::Command;
use std::process::Output;

pub fn run_tool(args: &[&str], envs: &[(&str, &str)], cleared_envs: &[&str]) -> Output {
    let mut command = Command::new("cargo");
    command.args(&["run", "--quiet", "--bin", "gdecompile", "--"])
        .args(args);
    for &(name, value) in envs {
        command.env(name, value);
    }
    for name in cleared_envs {
        command.env_remove(name);
    }
    command.output()
        .expect("failed to execute the command")
}

/// Is a local Ghidra installation available to the tests?
///
/// Tests that need to drive the real headless analyzer return early when
/// this returns `false`.
pub fn local_ghidra_available() -> bool {
    env::var("GHIDRA_INSTALL_DIR").is_ok() || env::var("GHIDRA_ANALYZE_HEADLESS").is_ok()
}
