mod commands;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;

#[derive(Parser)]
#[command(name = "ciflow")]
#[command(about = "CodePipeline CI for Serverless services, from one KDL file", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Which job of a service to inspect
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Job {
    Build,
    Deploy,
}

#[derive(Subcommand)]
enum Commands {
    /// Synthesize the pipeline template
    Synth {
        /// Environment stage (dev, stg, prod)
        stage: Option<String>,
        /// Environment stage (-s/--stage flag, CIFLOW_ENV_STAGE)
        #[arg(short = 's', long = "stage", env = "CIFLOW_ENV_STAGE", hide = true)]
        stage_flag: Option<String>,
        /// Print the template instead of writing it to .ciflow/
        #[arg(long)]
        stdout: bool,
    },
    /// Show what changed since the last synth
    Diff {
        /// Environment stage (dev, stg, prod)
        stage: Option<String>,
        /// Environment stage (-s/--stage flag, CIFLOW_ENV_STAGE)
        #[arg(short = 's', long = "stage", env = "CIFLOW_ENV_STAGE", hide = true)]
        stage_flag: Option<String>,
    },
    /// Validate the project file and pipeline wiring
    Validate {
        /// Environment stage (dev, stg, prod)
        stage: Option<String>,
        /// Environment stage (-s/--stage flag, CIFLOW_ENV_STAGE)
        #[arg(short = 's', long = "stage", env = "CIFLOW_ENV_STAGE", hide = true)]
        stage_flag: Option<String>,
    },
    /// List services and their pipeline actions
    List {
        /// Environment stage (dev, stg, prod)
        stage: Option<String>,
        /// Environment stage (-s/--stage flag, CIFLOW_ENV_STAGE)
        #[arg(short = 's', long = "stage", env = "CIFLOW_ENV_STAGE", hide = true)]
        stage_flag: Option<String>,
    },
    /// Print a service job's buildspec as YAML
    Buildspec {
        /// Service name
        service: String,
        /// Environment stage (dev, stg, prod)
        stage: Option<String>,
        /// Environment stage (-s/--stage flag, CIFLOW_ENV_STAGE)
        #[arg(short = 's', long = "stage", env = "CIFLOW_ENV_STAGE", hide = true)]
        stage_flag: Option<String>,
        /// Job to print
        #[arg(short, long, value_enum, default_value_t = Job::Build)]
        job: Job,
    },
    /// Show version information
    Version,
}

impl Commands {
    /// Positional stage first, then `-s` / `CIFLOW_ENV_STAGE`
    fn stage(&self) -> Option<String> {
        let (stage, stage_flag) = match self {
            Commands::Synth {
                stage, stage_flag, ..
            }
            | Commands::Diff { stage, stage_flag }
            | Commands::Validate { stage, stage_flag }
            | Commands::List { stage, stage_flag }
            | Commands::Buildspec {
                stage, stage_flag, ..
            } => (stage, stage_flag),
            Commands::Version => return None,
        };
        ciflow_core::resolve_stage(stage.as_deref().or(stage_flag.as_deref()))
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // stdout carries templates and buildspecs, so logs go to stderr
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    // Version needs no project file
    if matches!(cli.command, Commands::Version) {
        println!("ciflow {}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    let stage = cli.command.stage();

    // Validate reports load errors itself
    if matches!(cli.command, Commands::Validate { .. }) {
        return commands::validate::handle(stage.as_deref());
    }

    let project_root = match ciflow_core::find_project_root() {
        Ok(root) => root,
        Err(e @ ciflow_core::ProjectError::ProjectRootNotFound(_)) => {
            eprintln!("{} {}", "Error:".red().bold(), e);
            std::process::exit(1);
        }
        Err(e) => return Err(e.into()),
    };
    let project =
        ciflow_core::load_project_from_root_with_stage(&project_root, stage.as_deref())?;

    match cli.command {
        Commands::Synth { stdout, .. } => {
            commands::synth::handle(&project, &project_root, stdout).await?;
        }
        Commands::Diff { .. } => {
            commands::diff::handle(&project, &project_root).await?;
        }
        Commands::List { .. } => {
            commands::list::handle(&project)?;
        }
        Commands::Buildspec { service, job, .. } => {
            commands::buildspec::handle(&project, &service, job)?;
        }
        Commands::Validate { .. } => {
            unreachable!("Validate is handled before project loading");
        }
        Commands::Version => {
            unreachable!("Version is handled before project loading");
        }
    }

    Ok(())
}
