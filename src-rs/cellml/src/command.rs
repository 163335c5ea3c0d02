use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// CellML import tools
#[derive(Parser)]
#[command(name = "cellml")]
#[command(version, about = "Resolve and flatten CellML imports", long_about = None)]
pub struct CliCommand {
    #[command(subcommand)]
    pub command: Commands,

    /// Disable colors in the output
    #[arg(long, global = true)]
    pub no_colors: bool,

    /// Print the output in debug format
    #[arg(long, global = true)]
    pub print_debug: bool,

    /// Log more; repeat for more detail (overridden by `RUST_LOG`)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Resolve the imports of a model and report problems
    Resolve {
        #[command(flatten)]
        import: ImportArgs,
    },
    /// Resolve a model and write an import-free copy of it
    Flatten {
        #[command(flatten)]
        import: ImportArgs,

        /// Where to write the flattened model (standard output if omitted)
        #[arg(short, long, value_name = "OUT")]
        output: Option<PathBuf>,
    },
    /// Print the import dependencies of a model
    Deps {
        #[command(flatten)]
        import: ImportArgs,
    },
    /// List the documents loaded while resolving a model
    Library {
        #[command(flatten)]
        import: ImportArgs,
    },
}

#[derive(Args)]
pub struct ImportArgs {
    /// Path to the CellML model
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    /// Directory relative import urls are resolved against (defaults to
    /// the directory of FILE)
    #[arg(long, value_name = "DIR")]
    pub base: Option<String>,

    /// Maximum length of a chain of imports
    #[arg(long, value_name = "N", default_value_t = cellml_importer::DEFAULT_MAX_DEPTH)]
    pub max_depth: usize,

    /// Report documents that cannot be loaded as warnings
    #[arg(long)]
    pub missing_as_warning: bool,
}
