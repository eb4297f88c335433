//! action-uses - GitHub Actions `uses:` inventory CLI
//!
//! Lists every action referenced by workflow steps in a repository, a user
//! or organization, or every organization of an enterprise.
//!
//! ## Output
//!
//! - `--csv <path>`: CSV table(s)
//! - `--md <path>`: Markdown table(s) with links
//! - neither: the result as pretty JSON on stdout

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{ArgGroup, Parser};
use tracing::{error, info, Level};

use action_uses_core::{ActionUses, ActionUsesConfig, DiscoveryConfig, UniqueMode};

#[derive(Parser, Debug)]
#[command(name = "action-uses")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(
    about = "List GitHub Actions `uses:` references across a repository, owner or enterprise",
    long_about = None
)]
#[command(group(
    ArgGroup::new("scope")
        .required(true)
        .args(["enterprise", "owner", "repository"]),
))]
struct Cli {
    /// GitHub Enterprise Cloud account slug
    #[arg(short, long)]
    enterprise: Option<String>,

    /// GitHub organization or user login
    #[arg(short, long)]
    owner: Option<String>,

    /// GitHub repository as owner/repo
    #[arg(short, long)]
    repository: Option<String>,

    /// Write the inventory to a CSV file
    #[arg(long, value_name = "PATH", value_parser = non_empty_path)]
    csv: Option<PathBuf>,

    /// Write the inventory to a Markdown file
    #[arg(long, value_name = "PATH", value_parser = non_empty_path)]
    md: Option<PathBuf>,

    /// List unique actions instead of every use (`both` writes both tables)
    #[arg(
        long,
        value_name = "false|true|both",
        num_args = 0..=1,
        default_value = "false",
        default_missing_value = "true"
    )]
    unique: UniqueMode,

    /// Leave out actions authored by the `actions` and `github` organizations
    #[arg(long)]
    exclude: bool,

    /// Personal access token
    #[arg(short, long, env = "GITHUB_TOKEN", hide_env_values = true)]
    token: String,

    /// REST API root, for GitHub Enterprise Server
    #[arg(long, env = "GITHUB_API_URL")]
    api_url: Option<String>,

    /// Pause before each code-search page after the first
    #[arg(long, value_name = "MS", default_value_t = 20_500)]
    search_pause_ms: u64,

    /// Keep search order instead of sorting by action
    #[arg(long)]
    no_sort: bool,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long)]
    json: bool,
}

fn non_empty_path(value: &str) -> std::result::Result<PathBuf, String> {
    if value.trim().is_empty() {
        Err("path must not be empty".to_string())
    } else {
        Ok(PathBuf::from(value))
    }
}

impl Cli {
    fn config(&self) -> ActionUsesConfig {
        ActionUsesConfig {
            enterprise: self.enterprise.clone(),
            owner: self.owner.clone(),
            repository: self.repository.clone(),
            csv_path: self.csv.clone(),
            markdown_path: self.md.clone(),
            exclude_github_actions: self.exclude,
            unique: self.unique,
            api_url: self.api_url.clone(),
            discovery: DiscoveryConfig::default()
                .with_search_pause(Duration::from_millis(self.search_pause_ms))
                .with_sort(!self.no_sort),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    action_uses_core::init_tracing(cli.json, level);

    let config = cli.config();
    let mode = config.unique;
    let uses = ActionUses::new(&cli.token, config).context("Failed to set up GitHub client")?;

    let result = uses.discover().await?;
    let summary = result.summary();
    info!(
        records = summary.records,
        unique_actions = summary.unique_actions,
        repositories = summary.repositories,
        "found {} uses of {} actions in {} repositories",
        summary.records,
        summary.unique_actions,
        summary.repositories
    );

    if cli.csv.is_none() && cli.md.is_none() {
        let json = serde_json::to_string_pretty(&result).context("Failed to serialize result")?;
        println!("{}", json);
        return Ok(());
    }

    // Each report is attempted even if the other one fails.
    let outcomes = [
        ("CSV", uses.save_csv(&result, mode)),
        ("Markdown", uses.save_markdown(&result, mode)),
    ];
    let mut failed = Vec::new();
    for (kind, outcome) in outcomes {
        if let Err(e) = outcome {
            error!(report = kind, error = %e, "Failed to save {} report", kind);
            failed.push(kind);
        }
    }
    if !failed.is_empty() {
        bail!("Failed to save {} report(s)", failed.join(" and "));
    }

    Ok(())
}
