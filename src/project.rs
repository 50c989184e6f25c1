//! Projects in which the engine persists imported binaries.

use std::fs;
use std::path::Path;
use std::path::PathBuf;

use engine::Engine;
use engine::FunctionSource;
use error::Result;
use error::ResultExt;

/// Makes sure the given project directory exists.
///
/// Idempotent. Returns an error naming the directory when it cannot be
/// created (missing permissions, a file occupying the path, a full disk).
pub fn prepare_project_dir(project_dir: &Path) -> Result<()> {
    fs::create_dir_all(project_dir)
        .chain_err(|| format!("failed to create project directory {}", project_dir.display()))
}

/// A named project rooted at a directory.
///
/// The engine uses the project to persist imported binaries and analysis
/// results across runs; this crate treats the stored data as opaque. The
/// on-disk project is created by the engine on first use and reused
/// afterwards.
///
/// A project is a scoped resource. It is released either explicitly via
/// `close()` or, on early returns and panics, by its destructor, so the
/// engine's on-disk state is never left locked.
pub struct Project {
    engine: Box<Engine>,
    dir: PathBuf,
    name: String,
    released: bool,
}

impl Project {
    /// Opens the project with the given name inside the given directory.
    pub fn open<D, N>(engine: Box<Engine>, dir: D, name: N) -> Self
        where D: Into<PathBuf>, N: Into<String>
    {
        Project {
            engine: engine,
            dir: dir.into(),
            name: name.into(),
            released: false,
        }
    }

    /// Returns the directory the project is rooted at.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Returns the name of the project.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the version of the engine the project is opened with.
    pub fn engine_version(&self) -> &str {
        self.engine.version()
    }

    /// Returns the names of the programs already imported into the project.
    pub fn program_names(&mut self) -> Result<Vec<String>> {
        self.engine.program_names(&self.dir, &self.name)
    }

    /// Imports the binary at the given path into the project.
    pub fn import_program(&mut self, binary_path: &Path) -> Result<()> {
        self.engine.import_program(&self.dir, &self.name, binary_path)
    }

    /// Decompiles every function of the given program.
    pub fn decompile_program(&mut self, program: &str) -> Result<Vec<FunctionSource>> {
        self.engine.decompile_program(&self.dir, &self.name, program)
    }

    /// Closes the project, releasing its on-disk state.
    pub fn close(mut self) -> Result<()> {
        self.release()
    }

    fn release(&mut self) -> Result<()> {
        if self.released {
            return Ok(());
        }
        self.released = true;

        // The engine's launcher removes its lock files on a clean exit, so
        // they only remain after an aborted invocation. Removing them here
        // keeps the project usable for the next run.
        for lock_name in &[format!("{}.lock", self.name), format!("{}.lock~", self.name)] {
            let lock_path = self.dir.join(lock_name);
            if lock_path.exists() {
                fs::remove_file(&lock_path)
                    .chain_err(|| format!("failed to remove lock file {}", lock_path.display()))?;
            }
        }
        Ok(())
    }
}

impl Drop for Project {
    fn drop(&mut self) {
        // Errors cannot be propagated from a destructor; close() reports
        // them on the explicit path.
        let _ = self.release();
    }
}
