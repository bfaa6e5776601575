#![forbid(unsafe_code)]
//! Weft command line interface

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use console::style;
use tracing_subscriber::EnvFilter;

use weft::commands::{
    execute_add, execute_analyze, execute_features, execute_generate, execute_init, AddOptions,
    AnalyzeOptions, FeaturesOptions, GenerateOptions, InitOptions,
};

#[derive(Parser)]
#[command(name = "weft")]
#[command(about = "Feature-driven workspace generator with shared dependency catalogs")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Project root directory
    #[arg(short, long, global = true, default_value = ".")]
    root: PathBuf,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize a new weft project
    Init {
        /// Force overwrite existing settings
        #[arg(short, long)]
        force: bool,

        /// Skip interactive prompts
        #[arg(short = 'y', long)]
        yes: bool,

        /// Project name for the root manifest
        #[arg(long)]
        name: Option<String>,
    },

    /// Assemble the workspace from selected features
    Generate {
        /// Feature ids to compose (dependencies are included automatically)
        #[arg(required = true)]
        features: Vec<String>,

        /// JSON file with pre-collected answers
        #[arg(long)]
        answers: Option<PathBuf>,

        /// Skip prompts and use declared defaults
        #[arg(short = 'y', long)]
        yes: bool,

        /// Print the run report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Add dependencies to a workspace through the catalog resolver
    Add {
        /// Package names
        #[arg(required = true)]
        packages: Vec<String>,

        /// Destination workspace id
        #[arg(short, long, default_value = "root")]
        workspace: String,

        /// Add to devDependencies
        #[arg(short = 'D', long)]
        dev: bool,

        /// Explicit version
        #[arg(long)]
        version: Option<String>,

        /// Overwrite a conflicting version
        #[arg(short, long)]
        force: bool,

        /// Print resolutions as JSON
        #[arg(long)]
        json: bool,
    },

    /// Report (and optionally apply) dependency optimizations
    Analyze {
        /// Print the report as JSON
        #[arg(long)]
        json: bool,

        /// Apply catalog/duplicate-removal suggestions
        #[arg(long)]
        apply: bool,
    },

    /// List registered feature definitions
    Features {
        /// Print the registry as JSON
        #[arg(long)]
        json: bool,
    },
}

fn main() {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "weft=debug" } else { "weft=warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    let result = match cli.command {
        Commands::Init { force, yes, name } => {
            execute_init(&cli.root, InitOptions { force, yes, name })
        }
        Commands::Generate {
            features,
            answers,
            yes,
            json,
        } => execute_generate(
            &cli.root,
            GenerateOptions {
                features,
                answers_file: answers,
                yes,
                json,
            },
        ),
        Commands::Add {
            packages,
            workspace,
            dev,
            version,
            force,
            json,
        } => execute_add(
            &cli.root,
            AddOptions {
                packages,
                workspace,
                dev,
                version,
                force,
                json,
            },
        ),
        Commands::Analyze { json, apply } => {
            execute_analyze(&cli.root, AnalyzeOptions { json, apply })
        }
        Commands::Features { json } => execute_features(&cli.root, FeaturesOptions { json }),
    };

    if let Err(e) = result {
        eprintln!("{} {:#}", style("✗").red(), e);
        std::process::exit(1);
    }
}
