//! Access to the external decompilation engine (Ghidra's headless analyzer).

use std::ffi::OsStr;
use std::fs;
use std::io::Write;
use std::path::Path;
use std::path::PathBuf;
use std::process::Command;
use std::process::Output;

use json;
use regex::Regex;

use error::Result;
use error::ResultExt;
use settings::Settings;

/// The export script that the headless analyzer runs for us. It is bundled
/// with the crate and materialized into the project directory before use.
const EXPORT_SCRIPT: &'static str = include_str!("scripts/gdecompile_export.py");
const EXPORT_SCRIPT_NAME: &'static str = "gdecompile_export.py";

/// A single function recovered from the engine.
///
/// `thunk` is `true` for trampolines to external or library code. Such
/// entries carry no original logic from the target binary and are excluded
/// from the output unless explicitly requested.
#[derive(Clone, Debug, PartialEq)]
pub struct FunctionSource {
    pub name: String,
    pub thunk: bool,
    pub code: String,
}

/// The decompilation engine.
///
/// All operations take the directory and name of the project they act on.
/// Each call is synchronous and blocks until the engine has finished.
pub trait Engine {
    /// Returns the version of the engine installation.
    fn version(&self) -> &str;

    /// Returns the names of the programs already imported into the project.
    ///
    /// A project that does not exist yet has no programs.
    fn program_names(&mut self,
                     project_dir: &Path,
                     project_name: &str) -> Result<Vec<String>>;

    /// Imports the binary at the given path into the project and analyzes it.
    ///
    /// Creates the on-disk project when it does not exist yet.
    fn import_program(&mut self,
                      project_dir: &Path,
                      project_name: &str,
                      binary_path: &Path) -> Result<()>;

    /// Decompiles every function of the given program.
    ///
    /// The functions are returned in the engine's natural enumeration order.
    /// A single function failing to decompile fails the whole call.
    fn decompile_program(&mut self,
                         project_dir: &Path,
                         project_name: &str,
                         program: &str) -> Result<Vec<FunctionSource>>;
}

/// Factory for starting new engines.
pub trait EngineFactory {
    /// Starts the engine.
    ///
    /// Verifies that the engine is installed and usable. Returns an error
    /// when the installation cannot be found.
    fn new_engine(&self) -> Result<Box<Engine>>;
}

/// The Ghidra headless analyzer, driven through its `analyzeHeadless`
/// launcher.
pub struct HeadlessEngine {
    headless_path: PathBuf,
    version: String,
}

impl HeadlessEngine {
    fn run_headless(&self, args: &[&OsStr]) -> Result<Output> {
        let output = Command::new(&self.headless_path)
            .args(args)
            .output()
            .chain_err(|| format!("failed to run {}", self.headless_path.display()))?;
        if output.status.success() {
            return Ok(output);
        }

        bail!("the headless analyzer failed: {}", failure_reason(&output));
    }

    fn write_export_script(&self, script_dir: &Path) -> Result<PathBuf> {
        fs::create_dir_all(script_dir)
            .chain_err(|| format!("failed to create script directory {}", script_dir.display()))?;
        let script_path = script_dir.join(EXPORT_SCRIPT_NAME);
        let mut script = fs::File::create(&script_path)
            .chain_err(|| format!("failed to create {}", script_path.display()))?;
        script.write_all(EXPORT_SCRIPT.as_bytes())
            .chain_err(|| format!("failed to write {}", script_path.display()))?;
        Ok(script_path)
    }
}

impl Engine for HeadlessEngine {
    fn version(&self) -> &str {
        &self.version
    }

    fn program_names(&mut self,
                     project_dir: &Path,
                     project_name: &str) -> Result<Vec<String>> {
        // The headless analyzer has no listing command, so we read the index
        // of the project database. A missing index means a fresh project.
        let index_path = project_dir
            .join(format!("{}.rep", project_name))
            .join("idata")
            .join("~index.dat");
        if !index_path.is_file() {
            return Ok(Vec::new());
        }

        let index = fs::read_to_string(&index_path)
            .chain_err(|| format!("failed to read project index {}", index_path.display()))?;
        Ok(parse_program_index(&index))
    }

    fn import_program(&mut self,
                      project_dir: &Path,
                      project_name: &str,
                      binary_path: &Path) -> Result<()> {
        let args = [
            project_dir.as_os_str(),
            OsStr::new(project_name),
            OsStr::new("-import"),
            binary_path.as_os_str(),
        ];
        self.run_headless(&args)
            .chain_err(|| format!("failed to import {}", binary_path.display()))?;
        Ok(())
    }

    fn decompile_program(&mut self,
                         project_dir: &Path,
                         project_name: &str,
                         program: &str) -> Result<Vec<FunctionSource>> {
        let script_dir = project_dir.join("scripts");
        self.write_export_script(&script_dir)?;
        let results_path = project_dir.join(format!("{}.decompiled.json", program));

        let args = [
            project_dir.as_os_str(),
            OsStr::new(project_name),
            OsStr::new("-process"),
            OsStr::new(program),
            OsStr::new("-noanalysis"),
            OsStr::new("-scriptPath"),
            script_dir.as_os_str(),
            OsStr::new("-postScript"),
            OsStr::new(EXPORT_SCRIPT_NAME),
            results_path.as_os_str(),
        ];
        self.run_headless(&args)
            .chain_err(|| format!("failed to decompile {}", program))?;

        let results = fs::read_to_string(&results_path)
            .chain_err(|| format!("failed to read the decompilation results from {}",
                                  results_path.display()))?;
        let _ = fs::remove_file(&results_path);
        parse_decompiled_functions(&results)
    }
}

/// Factory for starting the Ghidra headless analyzer.
pub struct HeadlessEngineFactory {
    settings: Settings,
}

impl HeadlessEngineFactory {
    /// Creates a new factory with the given settings.
    pub fn new(settings: Settings) -> Self {
        HeadlessEngineFactory {
            settings: settings,
        }
    }
}

impl EngineFactory for HeadlessEngineFactory {
    fn new_engine(&self) -> Result<Box<Engine>> {
        let headless_path = resolve_headless_path(&self.settings)?;
        let version = detect_version(&headless_path, &self.settings);
        Ok(Box::new(
            HeadlessEngine {
                headless_path: headless_path,
                version: version,
            }
        ))
    }
}

fn headless_launcher_name() -> &'static str {
    if cfg!(target_os = "windows") {
        "analyzeHeadless.bat"
    } else {
        "analyzeHeadless"
    }
}

fn resolve_headless_path(settings: &Settings) -> Result<PathBuf> {
    if let Some(path) = settings.headless_path() {
        if path.is_file() {
            return Ok(path.to_path_buf());
        }
        bail!("analyzeHeadless not found at {}", path.display());
    }

    if let Some(dir) = settings.ghidra_dir() {
        let candidates = [
            dir.join("support").join(headless_launcher_name()),
            dir.join(headless_launcher_name()),
        ];
        for candidate in &candidates {
            if candidate.is_file() {
                return Ok(candidate.clone());
            }
        }
        bail!("no analyzeHeadless launcher under {}", dir.display());
    }

    bail!("Ghidra installation not found: set GHIDRA_INSTALL_DIR or GHIDRA_ANALYZE_HEADLESS");
}

fn detect_version(headless_path: &Path, settings: &Settings) -> String {
    // The launcher lives in <install-dir>/support, so when only the launcher
    // path is known, the installation root is two levels up.
    let install_dir = settings.ghidra_dir()
        .map(Path::to_path_buf)
        .or_else(|| {
            headless_path.parent()
                .and_then(Path::parent)
                .map(Path::to_path_buf)
        });
    if let Some(install_dir) = install_dir {
        let properties_path = install_dir.join("Ghidra").join("application.properties");
        if let Ok(properties) = fs::read_to_string(&properties_path) {
            if let Some(version) = parse_application_version(&properties) {
                return version;
            }
        }
    }
    "unknown".to_string()
}

fn parse_application_version(properties: &str) -> Option<String> {
    const KEY: &'static str = "application.version=";
    for line in properties.lines() {
        let line = line.trim();
        if line.starts_with(KEY) && line.len() > KEY.len() {
            return Some(line[KEY.len()..].to_string());
        }
    }
    None
}

fn parse_program_index(index: &str) -> Vec<String> {
    let mut names = Vec::new();
    for line in index.lines() {
        let line = line.trim();
        // Metadata lines (e.g. VERSION=1) use '='; entry lines end with the
        // stored program name after the last ':'.
        if line.is_empty() || line.contains('=') {
            continue;
        }
        let name = line.rsplit(':').next().unwrap_or(line);
        if !name.is_empty() {
            names.push(name.to_string());
        }
    }
    names
}

fn failure_reason(output: &Output) -> String {
    let log = format!(
        "{}\n{}",
        String::from_utf8_lossy(&output.stdout),
        String::from_utf8_lossy(&output.stderr)
    );
    let reasons = extract_error_lines(&log);
    if reasons.is_empty() {
        format!("exited with {}", output.status)
    } else {
        reasons.join("; ")
    }
}

fn extract_error_lines(log: &str) -> Vec<String> {
    let error_line_regex = Regex::new(r"(?m)^ERROR\s+(.+)$")
        .expect("invalid regexp - this should never happen");
    error_line_regex.captures_iter(log)
        .filter_map(|captures| captures.get(1))
        .map(|reason| reason.as_str().trim().to_string())
        .collect()
}

fn parse_decompiled_functions(results: &str) -> Result<Vec<FunctionSource>> {
    let parsed = json::parse(results)
        .chain_err(|| "failed to parse the decompilation results as JSON")?;
    if !parsed.is_array() {
        bail!("the decompilation results are not a JSON array");
    }

    let mut functions = Vec::new();
    for entry in parsed.members() {
        let name = entry["name"].as_str()
            .ok_or("missing function name in the decompilation results")?;
        let thunk = entry["thunk"].as_bool()
            .ok_or(format!("missing thunk flag for function {}", name))?;
        let code = entry["code"].as_str()
            .ok_or(format!("missing decompiled code for function {}", name))?;
        functions.push(
            FunctionSource {
                name: name.to_string(),
                thunk: thunk,
                code: code.to_string(),
            }
        );
    }
    Ok(functions)
}

#[cfg(test)]
pub mod tests {
    use super::*;

    use std::cell::RefCell;
    use std::rc::Rc;

    /// A scripted engine to be used in tests.
    pub struct EngineMock {
        version: String,
        programs: Vec<String>,
        functions: Vec<FunctionSource>,
        decompile_error: Option<String>,
        imports: Vec<PathBuf>,
        decompilations: Vec<String>,
    }

    impl EngineMock {
        /// Creates a new mock with an empty project and no functions.
        pub fn new() -> Self {
            EngineMock {
                version: "10.4-TEST".to_string(),
                programs: Vec::new(),
                functions: Vec::new(),
                decompile_error: None,
                imports: Vec::new(),
                decompilations: Vec::new(),
            }
        }

        /// Sets the programs already present in the project.
        pub fn set_programs(&mut self, programs: Vec<String>) {
            self.programs = programs;
        }

        /// Sets the functions returned by `decompile_program()`.
        pub fn set_functions(&mut self, functions: Vec<FunctionSource>) {
            self.functions = functions;
        }

        /// Makes `decompile_program()` fail with the given error.
        pub fn set_decompile_error<M: Into<String>>(&mut self, error: M) {
            self.decompile_error = Some(error.into());
        }

        /// Has an import of the given binary been requested?
        pub fn import_requested(&self, binary_path: &Path) -> bool {
            self.imports.iter().any(|path| path == binary_path)
        }

        /// Check if no imports were requested.
        pub fn no_imports_requested(&self) -> bool {
            self.imports.is_empty()
        }

        /// Has a decompilation of the given program been requested?
        pub fn decompilation_requested(&self, program: &str) -> bool {
            self.decompilations.iter().any(|name| name == program)
        }
    }

    impl Engine for EngineMock {
        fn version(&self) -> &str {
            &self.version
        }

        fn program_names(&mut self,
                         _project_dir: &Path,
                         _project_name: &str) -> Result<Vec<String>> {
            Ok(self.programs.clone())
        }

        fn import_program(&mut self,
                          _project_dir: &Path,
                          _project_name: &str,
                          binary_path: &Path) -> Result<()> {
            self.imports.push(binary_path.to_path_buf());
            if let Some(name) = binary_path.file_name() {
                self.programs.push(name.to_string_lossy().into_owned());
            }
            Ok(())
        }

        fn decompile_program(&mut self,
                             _project_dir: &Path,
                             _project_name: &str,
                             program: &str) -> Result<Vec<FunctionSource>> {
            self.decompilations.push(program.to_string());
            if let Some(ref error) = self.decompile_error {
                bail!("the headless analyzer failed: {}", error);
            }
            Ok(self.functions.clone())
        }
    }

    /// A wrapper over `EngineMock` that can be passed to functions that
    /// expect `Box<Engine>`.
    pub struct EngineMockWrapper {
        version: String,
        engine: Rc<RefCell<EngineMock>>,
    }

    impl EngineMockWrapper {
        pub fn new(engine: Rc<RefCell<EngineMock>>) -> Self {
            let version = engine.borrow().version.clone();
            EngineMockWrapper {
                version: version,
                engine: engine,
            }
        }
    }

    impl Engine for EngineMockWrapper {
        fn version(&self) -> &str {
            &self.version
        }

        fn program_names(&mut self,
                         project_dir: &Path,
                         project_name: &str) -> Result<Vec<String>> {
            self.engine.borrow_mut().program_names(project_dir, project_name)
        }

        fn import_program(&mut self,
                          project_dir: &Path,
                          project_name: &str,
                          binary_path: &Path) -> Result<()> {
            self.engine.borrow_mut().import_program(project_dir, project_name, binary_path)
        }

        fn decompile_program(&mut self,
                             project_dir: &Path,
                             project_name: &str,
                             program: &str) -> Result<Vec<FunctionSource>> {
            self.engine.borrow_mut().decompile_program(project_dir, project_name, program)
        }
    }

    /// An engine-factory mock to be used in tests.
    pub struct EngineFactoryMock {
        engine: Rc<RefCell<EngineMock>>,
    }

    impl EngineFactoryMock {
        /// Creates a new factory.
        pub fn new(engine: Rc<RefCell<EngineMock>>) -> Self {
            EngineFactoryMock { engine: engine }
        }
    }

    impl EngineFactory for EngineFactoryMock {
        fn new_engine(&self) -> Result<Box<Engine>> {
            Ok(Box::new(EngineMockWrapper::new(self.engine.clone())))
        }
    }

    #[test]
    fn engine_factory_mock_returns_engine_sharing_recorded_state() {
        let engine = Rc::new(RefCell::new(EngineMock::new()));
        let factory = EngineFactoryMock::new(engine.clone());

        let mut started = factory.new_engine()
            .expect("expected new_engine() to succeed");
        started.import_program(Path::new("/tmp/p"), "p", Path::new("/samples/sample.bin"))
            .expect("expected import_program() to succeed");

        assert_eq!(started.version(), "10.4-TEST");
        assert!(engine.borrow().import_requested(Path::new("/samples/sample.bin")));
    }

    #[test]
    fn parse_application_version_returns_version_when_present() {
        let properties = "application.name=Ghidra\napplication.version=10.4\n";

        assert_eq!(parse_application_version(properties), Some("10.4".to_string()));
    }

    #[test]
    fn parse_application_version_returns_none_when_version_is_missing() {
        let properties = "application.name=Ghidra\n";

        assert_eq!(parse_application_version(properties), None);
    }

    #[test]
    fn parse_application_version_returns_none_when_version_is_empty() {
        let properties = "application.version=\n";

        assert_eq!(parse_application_version(properties), None);
    }

    #[test]
    fn parse_program_index_returns_entry_names() {
        let index = "VERSION=1\n00000000:sample.bin\n00000001:other.exe\n";

        assert_eq!(
            parse_program_index(index),
            vec!["sample.bin".to_string(), "other.exe".to_string()]
        );
    }

    #[test]
    fn parse_program_index_returns_no_names_for_empty_index() {
        assert!(parse_program_index("").is_empty());
        assert!(parse_program_index("VERSION=1\n\n").is_empty());
    }

    #[test]
    fn parse_program_index_keeps_lines_without_separator() {
        let index = "sample.bin\n";

        assert_eq!(parse_program_index(index), vec!["sample.bin".to_string()]);
    }

    #[test]
    fn extract_error_lines_returns_error_lines_from_analyzer_log() {
        let log = "INFO  Starting analysis\nERROR Import failed: bad format\nINFO  Done\n";

        assert_eq!(
            extract_error_lines(log),
            vec!["Import failed: bad format".to_string()]
        );
    }

    #[test]
    fn extract_error_lines_returns_no_lines_for_clean_log() {
        let log = "INFO  Starting analysis\nINFO  Done\n";

        assert!(extract_error_lines(log).is_empty());
    }

    #[test]
    fn parse_decompiled_functions_returns_functions_in_order() {
        let results = r#"[
            {"name": "main", "thunk": false, "code": "int main(void) {}"},
            {"name": "_init", "thunk": true, "code": "void _init(void) {}"}
        ]"#;

        let functions = parse_decompiled_functions(results)
            .expect("expected the results to parse");

        assert_eq!(functions.len(), 2);
        assert_eq!(functions[0].name, "main");
        assert!(!functions[0].thunk);
        assert_eq!(functions[0].code, "int main(void) {}");
        assert_eq!(functions[1].name, "_init");
        assert!(functions[1].thunk);
    }

    #[test]
    fn parse_decompiled_functions_returns_error_when_results_are_not_an_array() {
        let result = parse_decompiled_functions("{}");

        let err = result.err()
            .expect("expected parse_decompiled_functions() to fail");
        assert_eq!(err.to_string(), "the decompilation results are not a JSON array");
    }

    #[test]
    fn parse_decompiled_functions_returns_error_when_entry_is_incomplete() {
        let result = parse_decompiled_functions(r#"[{"name": "main", "thunk": false}]"#);

        let err = result.err()
            .expect("expected parse_decompiled_functions() to fail");
        assert_eq!(err.to_string(), "missing decompiled code for function main");
    }

    #[test]
    fn parse_decompiled_functions_returns_error_for_invalid_json() {
        let result = parse_decompiled_functions("not json");

        let err = result.err()
            .expect("expected parse_decompiled_functions() to fail");
        assert_eq!(err.to_string(), "failed to parse the decompilation results as JSON");
    }

    #[test]
    fn resolve_headless_path_returns_error_when_explicit_path_does_not_exist() {
        let settings = Settings::new()
            .with_headless_path("/nonexistent/analyzeHeadless");

        let result = resolve_headless_path(&settings);

        let err = result.err()
            .expect("expected resolve_headless_path() to fail");
        assert_eq!(
            err.to_string(),
            "analyzeHeadless not found at /nonexistent/analyzeHeadless"
        );
    }
}
