use clap::{Args, Parser, Subcommand};
use git_syncd::commands::{execute_command, execute_serve};
use git_syncd::core::{
    command::{GitCommand, DEFAULT_LOG_COUNT},
    config::SyncConfig,
    error::{Result, SyncError},
    print_sync_error,
};
use git_syncd::service::Dispatcher;
use std::env;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser)]
#[command(name = "git-syncd")]
#[command(about = "Serialized, cached git command dispatch for working copies")]
#[command(version = "0.1.0")]
struct Cli {
    /// Enable debug logging
    #[arg(long, global = true)]
    debug: bool,

    /// Read configuration from FILE instead of the user config directory
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct Target {
    /// Working copy to operate on
    #[arg(long, default_value = ".")]
    repo: PathBuf,

    /// Print the typed result as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Show branch, tracking and changed files
    Status {
        #[command(flatten)]
        target: Target,
    },
    /// Show recent commits, newest first
    Log {
        /// Maximum number of commits
        #[arg(short = 'n', long = "max-count", default_value_t = DEFAULT_LOG_COUNT)]
        max_count: usize,
        #[command(flatten)]
        target: Target,
    },
    /// List local and remote-tracking branches
    Branches {
        #[command(flatten)]
        target: Target,
    },
    /// Create a local branch without switching to it
    Branch {
        name: String,
        /// Commit the branch starts at (defaults to HEAD)
        start_point: Option<String>,
        #[command(flatten)]
        target: Target,
    },
    /// Show unstaged changes, or the changes made by one commit
    Diff {
        file: Option<PathBuf>,
        /// Show what COMMIT changed relative to its first parent
        #[arg(long, value_name = "COMMIT")]
        commit: Option<String>,
        #[command(flatten)]
        target: Target,
    },
    /// Stage files or directories
    Stage {
        #[arg(required_unless_present = "all", conflicts_with = "all")]
        files: Vec<PathBuf>,
        /// Stage every change in the working tree
        #[arg(short, long)]
        all: bool,
        #[command(flatten)]
        target: Target,
    },
    /// Commit the staged changes
    Commit {
        #[arg(short, long)]
        message: String,
        #[command(flatten)]
        target: Target,
    },
    /// Switch to a local branch
    Checkout {
        branch: String,
        #[command(flatten)]
        target: Target,
    },
    /// Pull from the upstream of the current branch
    Pull {
        /// Give up after SECS seconds
        #[arg(long, value_name = "SECS")]
        timeout: Option<u64>,
        #[command(flatten)]
        target: Target,
    },
    /// Push the current branch to its upstream
    Push {
        /// Give up after SECS seconds
        #[arg(long, value_name = "SECS")]
        timeout: Option<u64>,
        #[command(flatten)]
        target: Target,
    },
    /// Answer newline-delimited JSON requests on stdin
    Serve,
}

impl Commands {
    fn into_request(self) -> Option<(GitCommand, Target, Option<Duration>)> {
        let request = match self {
            Commands::Status { target } => (GitCommand::Status, target, None),
            Commands::Log { max_count, target } => (GitCommand::Log { max_count }, target, None),
            Commands::Branches { target } => (GitCommand::Branches, target, None),
            Commands::Branch {
                name,
                start_point,
                target,
            } => (GitCommand::CreateBranch { name, start_point }, target, None),
            Commands::Diff {
                file,
                commit,
                target,
            } => {
                let command = match commit {
                    Some(commit) => GitCommand::DiffCommit { commit, path: file },
                    None => GitCommand::Diff { path: file },
                };
                (command, target, None)
            }
            Commands::Stage {
                all: true, target, ..
            } => (GitCommand::StageAll, target, None),
            Commands::Stage { files, target, .. } => (
                GitCommand::Stage {
                    paths: files.into_iter().collect(),
                },
                target,
                None,
            ),
            Commands::Commit { message, target } => (GitCommand::Commit { message }, target, None),
            Commands::Checkout { branch, target } => {
                (GitCommand::Checkout { branch }, target, None)
            }
            Commands::Pull { timeout, target } => {
                (GitCommand::Pull, target, timeout.map(Duration::from_secs))
            }
            Commands::Push { timeout, target } => {
                (GitCommand::Push, target, timeout.map(Duration::from_secs))
            }
            Commands::Serve => return None,
        };
        Some(request)
    }
}

fn load_config(path: Option<&PathBuf>) -> Result<SyncConfig> {
    match path {
        Some(path) => SyncConfig::load_from(path),
        None => SyncConfig::load(),
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = load_config(cli.config.as_ref())?;
    let dispatcher = Dispatcher::new(config);

    let result = match cli.command.into_request() {
        Some((command, target, timeout)) => {
            execute_command(&dispatcher, &target.repo, command, timeout, target.json).await
        }
        None => execute_serve(&dispatcher).await,
    };

    dispatcher.shutdown().await;
    result
}

fn main() {
    let cli = Cli::parse();

    // Configure logging based on --debug flag
    if cli.debug {
        env::set_var("RUST_LOG", "debug");
    } else if env::var_os("RUST_LOG").is_none() {
        env::set_var("RUST_LOG", "warn");
    }
    env_logger::init();

    let result = tokio::runtime::Runtime::new()
        .map_err(SyncError::from)
        .and_then(|runtime| runtime.block_on(run(cli)));

    if let Err(e) = result {
        print_sync_error(&e);
        std::process::exit(1);
    }
}
