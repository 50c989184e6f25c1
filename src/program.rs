//! Programs (imported binaries) inside a project.

use std::path::Path;

use error::Result;
use error::ResultExt;
use project::Project;

/// One imported binary inside a project, the unit the engine analyzes and
/// decompiles.
#[derive(Clone, Debug, PartialEq)]
pub struct Program {
    name: String,
}

impl Program {
    /// Returns the name of the program.
    pub fn name(&self) -> &str {
        &self.name
    }
}

/// Returns a ready-to-analyze program for the binary at the given path.
///
/// The project is searched for an already-imported program matching the
/// binary's file name; when one is found it is reused, which avoids
/// re-importing identical binaries across repeated invocations against the
/// same project. Otherwise the binary is imported fresh, which mutates the
/// project's on-disk program list.
///
/// # Examples
///
/// ```no_run
/// use gdecompile::engine::EngineFactory;
/// use gdecompile::engine::HeadlessEngineFactory;
/// use gdecompile::program::load_program;
/// use gdecompile::project::Project;
/// use gdecompile::settings::Settings;
///
/// let settings = Settings::new();
/// let engine = HeadlessEngineFactory::new(settings.clone()).new_engine().unwrap();
/// let mut project = Project::open(
///     engine,
///     settings.project_dir(),
///     settings.project_name(),
/// );
/// let program = load_program(&mut project, "/bin/true".as_ref()).unwrap();
/// assert_eq!(program.name(), "true");
/// ```
pub fn load_program(project: &mut Project, binary_path: &Path) -> Result<Program> {
    let name = binary_name(binary_path)?;
    let existing = project.program_names()
        .chain_err(|| format!("failed to list the programs of project {}", project.name()))?;
    if !existing.iter().any(|program| *program == name) {
        project.import_program(binary_path)?;
    }
    Ok(Program { name: name })
}

fn binary_name(binary_path: &Path) -> Result<String> {
    let name = binary_path.file_name()
        .ok_or(format!("no file name in {}", binary_path.display()))?;
    Ok(name.to_string_lossy().into_owned())
}
