//! Decompilation of loaded programs into a single document.

use engine::FunctionSource;
use error::Result;
use error::ResultExt;
use program::Program;
use project::Project;

/// Arguments for a decompilation.
///
/// # Examples
///
/// ```
/// use gdecompile::decompilation::DecompilationArguments;
///
/// let args = DecompilationArguments::new()
///     .with_include_all(true);
///
/// assert!(args.include_all());
/// ```
#[derive(Clone, Debug, Default)]
pub struct DecompilationArguments {
    include_all: bool,
}

impl DecompilationArguments {
    /// Returns new arguments initialized to default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets whether thunks and external stubs are included when used as a
    /// builder.
    ///
    /// By default, only ordinary functions are included.
    pub fn with_include_all(mut self, include_all: bool) -> Self {
        self.set_include_all(include_all);
        self
    }

    /// Sets whether thunks and external stubs are included.
    pub fn set_include_all(&mut self, include_all: bool) {
        self.include_all = include_all;
    }

    /// Are thunks and external stubs included?
    pub fn include_all(&self) -> bool {
        self.include_all
    }
}

/// The result of decompiling a program: an ordered sequence of per-function
/// source blocks.
///
/// The blocks keep the engine's natural enumeration order, so decompiling
/// the same program twice yields the same document.
#[derive(Clone, Debug, PartialEq)]
pub struct DecompiledDocument {
    blocks: Vec<FunctionSource>,
}

impl DecompiledDocument {
    /// Creates a document from the given function blocks.
    pub fn new(blocks: Vec<FunctionSource>) -> Self {
        DecompiledDocument { blocks: blocks }
    }

    /// Returns the function blocks of the document.
    pub fn blocks(&self) -> &[FunctionSource] {
        &self.blocks
    }

    /// Renders the document as human-readable text.
    ///
    /// Each function block is headed by a line naming the function and
    /// separated from the next block by a blank line.
    pub fn to_text(&self) -> String {
        let mut text = String::new();
        for block in &self.blocks {
            if !text.is_empty() {
                text.push('\n');
            }
            text.push_str(&format!("// Function: {}\n\n", block.name));
            text.push_str(block.code.trim_right());
            text.push('\n');
        }
        text
    }
}

/// Decompiles the given program into a document.
///
/// Asks the engine for every function of the program and keeps them in the
/// engine's enumeration order. Unless `include_all` is set, thunks and
/// external stubs are left out. A failure to decompile any single function
/// aborts the whole decompilation.
pub fn decompile(project: &mut Project,
                 program: &Program,
                 args: &DecompilationArguments) -> Result<DecompiledDocument> {
    let functions = project.decompile_program(program.name())
        .chain_err(|| format!("failed to decompile program {}", program.name()))?;
    let blocks = functions.into_iter()
        .filter(|function| args.include_all() || !function.thunk)
        .collect();
    Ok(DecompiledDocument::new(blocks))
}
