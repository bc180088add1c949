use clap::{Parser, Subcommand};
use clap_complete::Shell;

use runway::commands;
use runway::context::ExecutionContext;
use runway::engine::{LandOptions, Strategy};
use runway::error::{as_land_error, LandError};
use runway::ui::output;

#[derive(Parser)]
#[command(
    name = "runway",
    about = "Runway: land reviewed changes onto remote branches",
    long_about = None,
    version,
    disable_help_subcommand = true
)]
struct Cli {
    /// Show git commands being executed
    #[arg(short = 'v', long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Integrate changes into a target branch, push, and clean up
    #[command(after_help = "\
Examples:
  land                     Land the current branch onto the default target
  land feature1 feature2   Land several branches in one operation
  land --onto release      Land onto \"release\" instead of the default
  land --hold              Integrate locally but do not push
  land --strategy merge    Keep a merge commit instead of squashing")]
    Land {
        /// Branches or commits to land (defaults to the current branch)
        symbols: Vec<String>,
        /// Target refs to push onto (repeatable)
        #[arg(long, value_name = "REF")]
        onto: Vec<String>,
        /// Remote to push onto
        #[arg(long, value_name = "REMOTE")]
        onto_remote: Option<String>,
        /// Ref to integrate against before pushing
        #[arg(long, value_name = "REF")]
        into: Option<String>,
        /// Remote to fetch the integration target from
        #[arg(long, value_name = "REMOTE", conflicts_with_all = ["into_empty", "into_local"])]
        into_remote: Option<String>,
        /// Integrate against the empty state, creating a new root
        #[arg(long, conflicts_with = "into_local")]
        into_empty: bool,
        /// Integrate against a local ref without fetching
        #[arg(long)]
        into_local: bool,
        /// Integration strategy
        #[arg(long, value_enum, value_name = "STRATEGY")]
        strategy: Option<Strategy>,
        /// Message for the integration commit (defaults to the newest commit's)
        #[arg(short = 'm', long, value_name = "MESSAGE")]
        message: Option<String>,
        /// Integrate but do not push or clean up
        #[arg(long)]
        hold: bool,
        /// Skip the confirmation prompt
        #[arg(short = 'y', long)]
        yes: bool,
    },
    /// Generate shell completions
    Completion {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

fn main() {
    let cli = Cli::parse();
    ExecutionContext::init(cli.verbose);

    let result = match cli.command {
        Commands::Land {
            symbols,
            onto,
            onto_remote,
            into,
            into_remote,
            into_empty,
            into_local,
            strategy,
            message,
            hold,
            yes,
        } => {
            let options = LandOptions {
                symbols,
                onto,
                onto_remote,
                into,
                into_remote,
                into_empty,
                into_local,
                strategy,
                hold,
            };
            commands::land::run(options, message, yes)
        }
        Commands::Completion { shell } => commands::completion::run::<Cli>(shell),
    };

    if let Err(e) = result {
        let code = match as_land_error(&e) {
            Some(LandError::Config(_)) => 2,
            _ => 1,
        };
        output::error_stderr(&format!("{:#}", e));
        std::process::exit(code);
    }
}
