use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod cmd;

#[derive(Parser)]
#[command(name = "autofix")]
#[command(
    version,
    about = "Classify open GitHub issues and open pull requests with templated fixes"
)]
pub struct Cli {
    /// Log progress details to stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Repository working tree (defaults to the current directory)
    #[arg(long, global = true)]
    pub workdir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Fix up to --max-fixes open issues, or run maintenance when none qualify
    Run {
        /// Repository as owner/name (falls back to GITHUB_REPOSITORY, then the remote URL)
        #[arg(long, env = "REPO_NAME")]
        repo: Option<String>,

        /// Stop after this many successful fixes [default: 3]
        #[arg(long, env = "MAX_FIXES")]
        max_fixes: Option<usize>,

        /// Commit locally but do not push, open pull requests or comment
        #[arg(long, env = "DRY_RUN", value_name = "BOOL")]
        dry_run: Option<String>,

        /// GitHub token
        #[arg(long, env = "GITHUB_TOKEN", hide = true, hide_env_values = true)]
        token: Option<String>,

        /// Append pr_created/fixes_applied outputs to this file
        #[arg(long, env = "GITHUB_OUTPUT")]
        output: Option<PathBuf>,

        /// GitHub REST API root [default: https://api.github.com]
        #[arg(long, env = "GITHUB_API_URL")]
        api_url: Option<String>,
    },
    /// Run only the repository-wide maintenance pass
    Maintain {
        /// Commit locally but do not push or open a pull request
        #[arg(long, env = "DRY_RUN", value_name = "BOOL")]
        dry_run: Option<String>,
    },
    /// Show how an issue would be classified and handled
    Classify {
        #[arg(long)]
        title: String,

        #[arg(long, default_value = "")]
        body: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose {
        tracing::Level::INFO
    } else {
        tracing::Level::WARN
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(default_level.into()),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let workdir = match cli.workdir.clone() {
        Some(dir) => dir,
        None => std::env::current_dir().context("Failed to get current directory")?,
    };
    let workdir = workdir
        .canonicalize()
        .with_context(|| format!("Failed to resolve working tree: {}", workdir.display()))?;

    match cli.command {
        Commands::Run {
            repo,
            max_fixes,
            dry_run,
            token,
            output,
            api_url,
        } => {
            let repo = repo.or_else(|| std::env::var("GITHUB_REPOSITORY").ok());
            let overrides = autofix::config::ConfigOverrides {
                workdir,
                token,
                repo,
                max_fixes,
                dry_run,
                output_file: output,
                api_url,
            };
            cmd::cmd_run(&overrides).await?;
        }
        Commands::Maintain { dry_run } => {
            let overrides = autofix::config::ConfigOverrides {
                workdir,
                dry_run,
                ..Default::default()
            };
            cmd::cmd_maintain(&overrides).await?;
        }
        Commands::Classify { title, body } => cmd::cmd_classify(&title, &body),
    }

    Ok(())
}
