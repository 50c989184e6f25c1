//! Settings for the decompilation pipeline.

use std::env;
use std::path::Path;
use std::path::PathBuf;

const DEFAULT_PROJECT_DIR_NAME: &'static str = "gdecompile";
const DEFAULT_PROJECT_NAME: &'static str = "gdecompile";

/// Settings for the decompilation pipeline.
///
/// The settings hold the location of the scratch project that Ghidra uses to
/// persist imported binaries across runs and the location of the Ghidra
/// installation itself.
///
/// # Examples
///
/// ```
/// use gdecompile::settings::Settings;
///
/// let s = Settings::new()
///     .with_project_name("my-project");
///
/// assert_eq!(s.project_name(), "my-project");
/// ```
#[derive(Debug, Clone)]
pub struct Settings {
    project_dir: PathBuf,
    project_name: String,
    ghidra_dir: Option<PathBuf>,
    headless_path: Option<PathBuf>,
}

impl Settings {
    /// Creates new settings.
    ///
    /// The default values depend on whether the following environment
    /// variables are set:
    ///
    /// * `GDECOMPILE_PROJECT_DIR`: If set, its value will be used as the
    ///   default project directory. Otherwise, a `gdecompile` directory under
    ///   the system's temporary-storage path is used.
    /// * `GDECOMPILE_PROJECT_NAME`: If set, its value will be used as the
    ///   default project name. Otherwise, the project is named `gdecompile`.
    /// * `GHIDRA_INSTALL_DIR`: If set, its value will be used as the default
    ///   Ghidra installation directory.
    /// * `GHIDRA_ANALYZE_HEADLESS`: If set, its value will be used as the
    ///   default path to the `analyzeHeadless` launcher, taking precedence
    ///   over the installation directory.
    pub fn new() -> Self {
        Settings {
            project_dir: Self::default_project_dir(),
            project_name: Self::default_project_name(),
            ghidra_dir: env::var("GHIDRA_INSTALL_DIR").ok().map(PathBuf::from),
            headless_path: env::var("GHIDRA_ANALYZE_HEADLESS").ok().map(PathBuf::from),
        }
    }

    /// Sets the project directory when used as a builder.
    ///
    /// This is the scratch directory in which Ghidra keeps the project that
    /// persists imported binaries across runs.
    pub fn with_project_dir<D: Into<PathBuf>>(mut self, new_project_dir: D) -> Self {
        self.set_project_dir(new_project_dir);
        self
    }

    /// Sets the project name when used as a builder.
    pub fn with_project_name<N: Into<String>>(mut self, new_project_name: N) -> Self {
        self.set_project_name(new_project_name);
        self
    }

    /// Sets the Ghidra installation directory when used as a builder.
    pub fn with_ghidra_dir<D: Into<PathBuf>>(mut self, new_ghidra_dir: D) -> Self {
        self.set_ghidra_dir(new_ghidra_dir);
        self
    }

    /// Sets the path to the `analyzeHeadless` launcher when used as a builder.
    ///
    /// Takes precedence over the installation directory.
    pub fn with_headless_path<P: Into<PathBuf>>(mut self, new_headless_path: P) -> Self {
        self.set_headless_path(new_headless_path);
        self
    }

    /// Sets the project directory.
    pub fn set_project_dir<D: Into<PathBuf>>(&mut self, new_project_dir: D) {
        self.project_dir = new_project_dir.into();
    }

    /// Sets the project name.
    pub fn set_project_name<N: Into<String>>(&mut self, new_project_name: N) {
        self.project_name = new_project_name.into();
    }

    /// Sets the Ghidra installation directory.
    pub fn set_ghidra_dir<D: Into<PathBuf>>(&mut self, new_ghidra_dir: D) {
        self.ghidra_dir = Some(new_ghidra_dir.into());
    }

    /// Sets the path to the `analyzeHeadless` launcher.
    pub fn set_headless_path<P: Into<PathBuf>>(&mut self, new_headless_path: P) {
        self.headless_path = Some(new_headless_path.into());
    }

    /// Returns the project directory.
    pub fn project_dir(&self) -> &Path {
        &self.project_dir
    }

    /// Returns the project name.
    pub fn project_name(&self) -> &str {
        &self.project_name
    }

    /// Returns the Ghidra installation directory.
    ///
    /// If no directory was set, it returns `None`.
    pub fn ghidra_dir(&self) -> Option<&Path> {
        self.ghidra_dir.as_ref().map(PathBuf::as_path)
    }

    /// Returns the path to the `analyzeHeadless` launcher.
    ///
    /// If no path was set, it returns `None`.
    pub fn headless_path(&self) -> Option<&Path> {
        self.headless_path.as_ref().map(PathBuf::as_path)
    }

    fn default_project_dir() -> PathBuf {
        match env::var("GDECOMPILE_PROJECT_DIR") {
            Ok(project_dir) => PathBuf::from(project_dir),
            Err(_) => env::temp_dir().join(DEFAULT_PROJECT_DIR_NAME),
        }
    }

    fn default_project_name() -> String {
        match env::var("GDECOMPILE_PROJECT_NAME") {
            Ok(project_name) => project_name,
            Err(_) => DEFAULT_PROJECT_NAME.to_string(),
        }
    }
}
