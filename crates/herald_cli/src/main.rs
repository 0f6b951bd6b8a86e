//! Herald CLI - runs the notification pipeline from the command line.

mod commands;
mod config;
mod progress;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use console::Term;
use herald::RawOptions;
use herald::config::keys;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "herald")]
#[command(version)]
#[command(about = "GitHub notifications as a stream of events")]
#[command(
    long_about = "Herald polls the GitHub notifications of one account and writes one JSON \
event per notification to stdout. It can mark each notification's repository as read, \
add release details (tag, tarball, changelog) to release notifications, and keep only \
releases whose tag matches a pattern."
)]
#[command(after_long_help = r#"EXAMPLES
    Run once, marking notifications as read:
        $ herald run

    Only emit v2 releases, without touching read state:
        $ herald run --regex-filter-tag '^v2\.' --mark-as-read false

    See what would be emitted without marking anything read:
        $ herald run --dry-run

    Check that the last run worked and something arrived recently:
        $ herald health

    Generate shell completions:
        $ herald completions bash > ~/.local/share/bash-completion/completions/herald

EVENT
    Each event is the notification as GitHub returned it. Release notifications
    gain tagname, tarball_url and changelog when release details are enabled:

    {
      "id": "1",
      "unread": true,
      "reason": "subscribed",
      "updated_at": "2024-06-27T14:44:56Z",
      "last_read_at": null,
      "subject": {
        "title": "v2.1.0",
        "url": "https://api.github.com/repos/octo-org/octo-repo/releases/1",
        "latest_comment_url": null,
        "type": "Release"
      },
      "repository": { "full_name": "octo-org/octo-repo", ... },
      "url": "https://api.github.com/notifications/threads/1",
      "subscription_url": "https://api.github.com/notifications/threads/1/subscription",
      "tagname": "v2.1.0",
      "tarball_url": "https://api.github.com/repos/octo-org/octo-repo/tarball/v2.1.0",
      "changelog": "https://github.com/octo-org/octo-repo/releases/tag/v2.1.0"
    }

CONFIGURATION
    Herald reads configuration from:
      1. ~/.config/herald/config.toml (or $XDG_CONFIG_HOME/herald/config.toml)
      2. ./herald.toml
      3. Environment variables (HERALD_* prefix, e.g., HERALD_TOKEN)
      4. .env file in current directory
      5. Command-line flags

ENVIRONMENT VARIABLES
    HERALD_USERNAME                          GitHub username
    HERALD_TOKEN                             Personal access token
    HERALD_MARK_AS_READ                      true/false (default: true)
    HERALD_ADD_RELEASE_DETAILS               true/false (default: true)
    HERALD_REGEX_FILTER_TAG                  Only emit records whose tag matches
    HERALD_EXPECTED_RECEIVE_PERIOD_IN_DAYS   Staleness threshold (default: 2)
    HERALD_STATE_FILE                        Where the last run result is kept
                                             (default: ~/.local/state/herald/state.json)
"#)]
struct Cli {
    /// File holding the result of the last run
    #[arg(long, global = true, env = "HERALD_STATE_FILE", value_name = "PATH")]
    state_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch notifications once and write events to stdout
    Run {
        /// Dry run - fetch, enrich and filter, but mark nothing as read
        #[arg(short = 'n', long)]
        dry_run: bool,

        #[command(flatten)]
        options: OptionOverrides,
    },
    /// Check the configuration without contacting GitHub
    Validate {
        #[command(flatten)]
        options: OptionOverrides,
    },
    /// Report whether the last run worked and events arrive on time
    Health {
        /// Print the status as JSON (default when stdout is not a terminal)
        #[arg(long)]
        json: bool,

        #[command(flatten)]
        options: OptionOverrides,
    },
    /// Generate shell completion scripts
    Completions {
        /// Shell to generate completions for
        shell: clap_complete::Shell,
    },
}

/// Per-invocation overrides. Values are validated together with every other
/// layer, so they are taken as plain strings here.
#[derive(Debug, Clone, Default, clap::Args)]
struct OptionOverrides {
    /// GitHub username
    #[arg(short = 'u', long)]
    username: Option<String>,

    /// Personal access token (prefer HERALD_TOKEN; flags show up in process lists)
    #[arg(long)]
    token: Option<String>,

    /// Mark each notification's repository as read (true/false)
    #[arg(long, value_name = "BOOL")]
    mark_as_read: Option<String>,

    /// Add tag, tarball and changelog to release notifications (true/false)
    #[arg(long, value_name = "BOOL")]
    add_release_details: Option<String>,

    /// Only emit records whose release tag matches this regex
    #[arg(short = 't', long, value_name = "REGEX")]
    regex_filter_tag: Option<String>,

    /// Days without an emitted event before the instance is unhealthy
    #[arg(long, value_name = "DAYS")]
    expected_receive_period_in_days: Option<String>,

    /// Mark each repository as read at most once per run (true/false)
    #[arg(long, value_name = "BOOL")]
    dedupe_acknowledgements: Option<String>,

    /// Per-request timeout in seconds
    #[arg(long, value_name = "SECS")]
    request_timeout_secs: Option<String>,

    /// API root (default: https://api.github.com)
    #[arg(long, value_name = "URL")]
    api_base: Option<String>,
}

impl OptionOverrides {
    fn into_pairs(self) -> [(&'static str, Option<String>); 9] {
        [
            (keys::USERNAME, self.username),
            (keys::TOKEN, self.token),
            (keys::MARK_AS_READ, self.mark_as_read),
            (keys::ADD_RELEASE_DETAILS, self.add_release_details),
            (keys::REGEX_FILTER_TAG, self.regex_filter_tag),
            (
                keys::EXPECTED_RECEIVE_PERIOD_IN_DAYS,
                self.expected_receive_period_in_days,
            ),
            (keys::DEDUPE_ACKNOWLEDGEMENTS, self.dedupe_acknowledgements),
            (keys::REQUEST_TIMEOUT_SECS, self.request_timeout_secs),
            (keys::API_BASE, self.api_base),
        ]
    }
}

/// Layered configuration with this invocation's flags on top.
fn load_options(overrides: OptionOverrides) -> Result<RawOptions, Box<dyn std::error::Error>> {
    let mut raw = config::load()?;
    config::apply_overrides(&mut raw, overrides.into_pairs());
    Ok(raw)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    // Stdout is the event stream; logs always go to stderr.
    let env_filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::new("herald=info,herald_cli=info"),
    };

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_ansi(Term::stderr().is_term())
        .with_target(false)
        .init();

    let cli = Cli::parse();
    let state_path = cli.state_file.or_else(config::default_state_path);

    match cli.command {
        Commands::Run { dry_run, options } => {
            let raw = load_options(options)?;
            commands::run::handle_run(&raw, dry_run, state_path.as_deref()).await?;
        }
        Commands::Validate { options } => {
            let raw = load_options(options)?;
            commands::validate::handle_validate(&raw)?;
        }
        Commands::Health { json, options } => {
            let raw = load_options(options)?;
            commands::health::handle_health(&raw, state_path.as_deref(), json)?;
        }
        Commands::Completions { shell } => {
            commands::meta::handle_completions(shell)?;
        }
    }

    Ok(())
}
