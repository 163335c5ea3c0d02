use std::{fs, io, path::Path, process::ExitCode};

use anstream::{eprintln, print, println};
use cellml_importer::{Importer, ImporterOptions};
use cellml_ir::Model;
use cellml_runner::{FileLoader, base_directory};
use cellml_shared::{Context, Diagnostics, Issue, Level};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::command::{CliCommand, Commands, ImportArgs};

mod command;
mod print_dependencies;
mod print_issue;
mod print_library;
mod stylesheet;

fn main() -> io::Result<ExitCode> {
    let cli = CliCommand::parse();

    if cli.no_colors {
        anstream::ColorChoice::Never.write_global();
    }
    init_logging(cli.verbose);

    let print_debug = cli.print_debug;
    match cli.command {
        Commands::Resolve { import } => resolve(&import, print_debug),
        Commands::Flatten { import, output } => flatten(&import, output.as_deref(), print_debug),
        Commands::Deps { import } => deps(&import, print_debug),
        Commands::Library { import } => library(&import, print_debug),
    }
}

/// Installs the log subscriber, writing to standard error
fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "error",
        1 => "warn",
        2 => "info",
        3 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

/// A root model after resolution, with the importer that resolved it
struct Resolved<'l> {
    importer: Importer<&'l FileLoader>,
    model: Model,
    diagnostics: Diagnostics,
}

/// Loads the model named by `args` and resolves its imports
///
/// Returns `None`, after printing why, if the model itself cannot be
/// loaded.
fn load_and_resolve<'l>(
    args: &ImportArgs,
    loader: &'l FileLoader,
    print_debug: bool,
) -> Option<Resolved<'l>> {
    let mut diagnostics = Diagnostics::new();
    let mut model = match loader.load_file(&args.file, &mut diagnostics) {
        Ok(model) => model,
        Err(error) => {
            let issue = Issue::new(
                Level::Error,
                format!("The model at '{}' could not be loaded.", args.file.display()),
            )
            .with_context(Context::Note(error.to_string()));
            print_issue::print(&issue, print_debug);
            return None;
        }
    };

    let base = args
        .base
        .clone()
        .unwrap_or_else(|| base_directory(&args.file));

    let missing_document_level = if args.missing_as_warning {
        Level::Warning
    } else {
        Level::Error
    };
    let options = ImporterOptions::new()
        .with_max_depth(args.max_depth)
        .with_missing_document_level(missing_document_level);

    let mut importer = Importer::with_options(loader, options);
    importer.resolve_imports(&mut model, &base, &mut diagnostics);

    Some(Resolved {
        importer,
        model,
        diagnostics,
    })
}

fn exit_code(diagnostics: &Diagnostics) -> ExitCode {
    if diagnostics.has_errors() {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

fn resolve(args: &ImportArgs, print_debug: bool) -> io::Result<ExitCode> {
    let loader = FileLoader::new();
    let Some(resolved) = load_and_resolve(args, &loader, print_debug) else {
        return Ok(ExitCode::FAILURE);
    };

    print_issue::print_all(&resolved.diagnostics, print_debug);

    let documents = resolved.importer.library_count();
    if resolved.model.has_unresolved_imports() {
        println!(
            "{}: resolved with {documents} imported document(s), some imports are unresolved",
            resolved.model.name()
        );
    } else {
        println!(
            "{}: resolved with {documents} imported document(s)",
            resolved.model.name()
        );
    }

    Ok(exit_code(&resolved.diagnostics))
}

fn flatten(args: &ImportArgs, output: Option<&Path>, print_debug: bool) -> io::Result<ExitCode> {
    let loader = FileLoader::new();
    let Some(mut resolved) = load_and_resolve(args, &loader, print_debug) else {
        return Ok(ExitCode::FAILURE);
    };

    let flat = resolved
        .importer
        .flatten_model(&resolved.model, &mut resolved.diagnostics);
    print_issue::print_all(&resolved.diagnostics, print_debug);

    if print_debug {
        println!("{flat:#?}");
        return Ok(exit_code(&resolved.diagnostics));
    }

    let text = cellml_xml::print_model(&flat).map_err(io::Error::other)?;
    match output {
        Some(path) => {
            fs::write(path, text)?;
            eprintln!("wrote '{}'", path.display());
        }
        None => print!("{text}"),
    }

    Ok(exit_code(&resolved.diagnostics))
}

fn deps(args: &ImportArgs, print_debug: bool) -> io::Result<ExitCode> {
    let loader = FileLoader::new();
    let Some(resolved) = load_and_resolve(args, &loader, print_debug) else {
        return Ok(ExitCode::FAILURE);
    };

    print_issue::print_all(&resolved.diagnostics, print_debug);

    match resolved.importer.dependencies(&resolved.model) {
        Some(dependencies) => print_dependencies::print(&dependencies, print_debug),
        None if resolved.model.has_unresolved_imports() => println!(
            "{}: dependencies are only listed once every import resolves",
            resolved.model.name()
        ),
        None => println!("{}: no imports", resolved.model.name()),
    }

    Ok(exit_code(&resolved.diagnostics))
}

fn library(args: &ImportArgs, print_debug: bool) -> io::Result<ExitCode> {
    let loader = FileLoader::new();
    let Some(resolved) = load_and_resolve(args, &loader, print_debug) else {
        return Ok(ExitCode::FAILURE);
    };

    print_issue::print_all(&resolved.diagnostics, print_debug);
    print_library::print(resolved.importer.library(), print_debug);

    Ok(exit_code(&resolved.diagnostics))
}
