//! A tool for decompiling binaries through a local Ghidra installation.

use std::fs;
use std::io::Write;
use std::io;

use clap::App;
use clap::AppSettings;
use clap::Arg;
use clap::ArgMatches;

use VERSION;
use decompilation::DecompilationArguments;
use decompilation::DecompiledDocument;
use decompilation::decompile;
use engine::EngineFactory;
use engine::HeadlessEngineFactory;
use error::Result;
use error::ResultExt;
use program::load_program;
use project::Project;
use project::prepare_project_dir;
use settings::Settings;

fn parse_args<'a>(args: &Vec<String>) -> ArgMatches<'a> {
    App::new("gdecompile")
        .version(VERSION)
        .about("Decompiles the given binary through a local Ghidra installation.")
        .setting(AppSettings::ColorNever)
        .arg(Arg::with_name("FILE")
            .required(true)
            .help("Binary file to be decompiled"))
        .arg(Arg::with_name("output")
            .short("o")
            .long("output")
            .takes_value(true)
            .value_name("PATH")
            .help("Store the result in this file instead of printing it to stdout"))
        .arg(Arg::with_name("include_all")
            .short("a")
            .help("Include all functions (thunk functions, stubs, etc.)"))
        .arg(Arg::with_name("project_dir")
            .long("project-dir")
            .takes_value(true)
            .value_name("DIR")
            // It is important not to require the directory by default because
            // it enables the use of the GDECOMPILE_PROJECT_DIR environment
            // variable.
            .help("Directory holding the Ghidra project"))
        .arg(Arg::with_name("project_name")
            .long("project-name")
            .takes_value(true)
            .value_name("NAME")
            // It is important not to require the name by default because it
            // enables the use of the GDECOMPILE_PROJECT_NAME environment
            // variable.
            .help("Name of the Ghidra project"))
        .get_matches_from(args)
}

fn write_output(document: &DecompiledDocument, output: Option<&str>) -> Result<()> {
    match output {
        Some(path) => {
            let mut file = fs::File::create(path)
                .chain_err(|| format!("failed to create {}", path))?;
            file.write_all(document.to_text().as_bytes())
                .chain_err(|| format!("failed to write {}", path))?;
            println!("Finished decompiling, wrote output to {}", path);
        }
        None => {
            let mut stdout = io::stdout();
            stdout.write(document.to_text().as_bytes())
                .chain_err(|| "failed to print the result on the standard output")?;
        }
    }
    Ok(())
}

fn run(args: &Vec<String>) -> Result<()> {
    let args = parse_args(args);

    let mut settings = Settings::new();
    if let Some(project_dir) = args.value_of("project_dir") {
        settings = settings.with_project_dir(project_dir);
    }
    if let Some(project_name) = args.value_of("project_name") {
        settings = settings.with_project_name(project_name);
    }
    let binary_path = args.value_of("FILE").unwrap();
    let binary_path = fs::canonicalize(binary_path)
        .chain_err(|| format!("failed to access {}", binary_path))?;

    prepare_project_dir(settings.project_dir())?;

    let factory = HeadlessEngineFactory::new(settings.clone());
    let engine = factory.new_engine()?;
    let mut project = Project::open(
        engine,
        settings.project_dir(),
        settings.project_name(),
    );

    let program = load_program(&mut project, &binary_path)?;
    let decompilation_args = DecompilationArguments::new()
        .with_include_all(args.is_present("include_all"));
    let document = decompile(&mut project, &program, &decompilation_args)?;
    write_output(&document, args.value_of("output"))?;
    project.close()?;
    Ok(())
}

generate_main_for_tool!(run);
