//! A program for decompiling binary files through a local
//! [Ghidra](https://ghidra-sre.org/) installation. Internally, it uses the
//! `gdecompile` library.

extern crate gdecompile;

fn main() {
    gdecompile::tools::gdecompile::main();
}
