use std::ffi::OsString;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};
use colored::Colorize;

use crate::client::{
    ArenaClient, HttpTransport, InspectTransport, Query, ResourceKind, Status, DEFAULT_API_URL,
};
use crate::config::{mask, Config};
use crate::dispatch::{self, DispatchOptions};
use crate::edit::ExternalEditor;
use crate::format::{self, Field, FormatOptions};
use crate::normalize::{self, CommandKind, Invocation, ResourceType};
use crate::prompts;

const EXAMPLES: &str = "\
Examples:
  arena channels -x5 -p2 -s slug          Get page 2 of a list of 5 new channels, print their slugs
  arena channel great-clothes-4295553     Get a channel by slug
  arena create channel Math Problems      Create a new channel
  arena delete channel math-problems-389752
                                          Delete a channel by slug";

#[derive(Parser)]
#[command(name = "arena", version)]
#[command(about = "A CLI client for Are.na channels and blocks", long_about = None)]
#[command(after_help = EXAMPLES)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[command(flatten)]
    pub flags: Flags,

    /// API base URL (overrides config)
    #[arg(long, env = "ARENA_API_URL", global = true)]
    pub api_url: Option<String>,

    /// Increase log verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,
}

#[derive(Args, Debug, Clone)]
pub struct Flags {
    /// Accept multiple arguments and perform the command for each
    #[arg(short, long, global = true)]
    pub multiple: bool,

    /// Fields to select and print (comma-separated or repeated)
    #[arg(short, long, value_enum, value_delimiter = ',', global = true)]
    pub select: Vec<Field>,

    /// Print only link[s]
    #[arg(short, long, global = true)]
    pub link: bool,

    /// String to join fields by
    #[arg(short, long, default_value = ", ", global = true)]
    pub join: String,

    /// Get results from the specified page
    #[arg(short, long, global = true)]
    pub page: Option<u32>,

    /// Get this many results per page
    #[arg(short = 'x', long, global = true)]
    pub per: Option<u32>,

    /// Status of new, updated, or retrieved channel[s]
    #[arg(short = 'S', long, value_enum, global = true)]
    pub status: Option<Status>,

    /// Output JSON rather than the default textual format
    #[arg(short = 'J', long, global = true)]
    pub json: bool,

    /// Pretty print JSON
    #[arg(short = 'P', long, global = true)]
    pub pretty: bool,

    /// Read arguments from this file (use - for stdin)
    #[arg(short, long, global = true)]
    pub file: Option<PathBuf>,

    /// Edit blocks/channels using yaml (--yaml=false edits the first field as text)
    #[arg(
        short,
        long,
        global = true,
        default_value_t = true,
        num_args = 0..=1,
        require_equals = true,
        default_missing_value = "true",
        action = ArgAction::Set
    )]
    pub yaml: bool,

    /// Don't make the requests, print them
    #[arg(short = 'D', long = "debug", visible_alias = "dry", global = true)]
    pub debug: bool,
}

/// `type` positional for get/create/delete/edit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum TypeArg {
    Channel,
    Channels,
    Block,
    Blocks,
}

/// `type` positional for search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SearchType {
    Channels,
    Blocks,
    Users,
}

impl From<TypeArg> for ResourceType {
    fn from(arg: TypeArg) -> Self {
        match arg {
            TypeArg::Channel => Self::singular(ResourceKind::Channel),
            TypeArg::Channels => Self::plural(ResourceKind::Channel),
            TypeArg::Block => Self::singular(ResourceKind::Block),
            TypeArg::Blocks => Self::plural(ResourceKind::Block),
        }
    }
}

impl From<SearchType> for ResourceType {
    fn from(arg: SearchType) -> Self {
        match arg {
            SearchType::Channels => Self::plural(ResourceKind::Channel),
            SearchType::Blocks => Self::plural(ResourceKind::Block),
            SearchType::Users => Self::plural(ResourceKind::User),
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Retrieve channels or blocks
    Get {
        #[arg(value_enum)]
        r#type: TypeArg,
        /// Slugs or ids
        #[arg(value_name = "SLUGS|IDS")]
        ids: Vec<String>,
    },

    /// Create channels or blocks
    #[command(visible_aliases = ["new", "add"])]
    Create {
        #[arg(value_enum)]
        r#type: TypeArg,
        /// Channel titles, or a channel followed by block titles/urls
        #[arg(value_name = "TITLES|URLS")]
        titles: Vec<String>,
    },

    /// Delete channels or blocks
    Delete {
        #[arg(value_enum)]
        r#type: TypeArg,
        #[arg(value_name = "SLUGS|IDS")]
        ids: Vec<String>,
    },

    /// Search channels, blocks, or users
    Search {
        #[arg(value_enum)]
        r#type: SearchType,
        query: Vec<String>,
    },

    /// Edit a block or channel
    Edit {
        #[arg(value_enum)]
        r#type: TypeArg,
        #[arg(value_name = "SLUGS|IDS", required = true)]
        ids: Vec<String>,
    },

    /// Authentication commands
    #[command(subcommand)]
    Auth(AuthCommands),

    /// Configuration commands
    #[command(subcommand)]
    Config(ConfigCommands),
}

#[derive(Subcommand)]
pub enum AuthCommands {
    /// Store an access token in the system keyring
    Login {
        /// Access token (prompted for when omitted)
        #[arg(short, long)]
        token: Option<String>,
    },
    /// Logout (remove stored access token)
    Logout,
    /// Show authentication status
    Status,
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Set a configuration value
    Set {
        /// Configuration key (e.g., api.url)
        key: String,
        /// Configuration value
        value: String,
    },
    /// Get a configuration value
    Get {
        /// Configuration key
        key: String,
    },
}

const SUBCOMMANDS: &[&str] = &[
    "get", "create", "new", "add", "delete", "search", "edit", "auth", "config", "help",
];

/// Global flags that consume the following argument as their value.
const VALUE_FLAGS: &[&str] = &[
    "-s", "--select", "-j", "--join", "-p", "--page", "-x", "--per", "-S", "--status", "-f",
    "--file", "--api-url",
];

fn first_positional(args: &[OsString]) -> Option<&str> {
    let mut iter = args.iter().skip(1).filter_map(|arg| arg.to_str());
    while let Some(arg) = iter.next() {
        if arg == "--" {
            return iter.next();
        }
        if arg == "-" || !arg.starts_with('-') {
            return Some(arg);
        }
        if VALUE_FLAGS.contains(&arg) {
            iter.next();
        }
    }
    None
}

/// Insert `get` when the first positional argument is not a subcommand, so
/// that `arena channels` means `arena get channels`.
pub fn with_default_command<I>(args: I) -> Vec<OsString>
where
    I: IntoIterator<Item = OsString>,
{
    let mut args: Vec<OsString> = args.into_iter().collect();
    let needs_default = first_positional(&args).is_some_and(|arg| !SUBCOMMANDS.contains(&arg));
    if needs_default {
        args.insert(1, OsString::from("get"));
    }
    args
}

impl Flags {
    fn invocation(
        &self,
        command: CommandKind,
        resource: ResourceType,
        values: Vec<String>,
    ) -> Invocation {
        Invocation {
            command,
            resource,
            values,
            multiple: self.multiple,
            select: self.select.clone(),
            link: self.link,
            status: self.status,
            file: self.file.clone(),
        }
    }

    fn dispatch_options(&self) -> DispatchOptions {
        DispatchOptions {
            query: Query {
                page: self.page,
                per: self.per,
                status: self.status,
            },
            status: self.status,
            yaml: self.yaml,
            inspect: self.debug,
        }
    }
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        let config = Config::load()?;
        let api_url = self
            .api_url
            .or_else(|| config.api_url.clone())
            .unwrap_or_else(|| DEFAULT_API_URL.to_string());

        let (kind, resource, values): (CommandKind, ResourceType, Vec<String>) =
            match self.command {
                Commands::Auth(cmd) => return run_auth(cmd, &config),
                Commands::Config(cmd) => return run_config(cmd, &config),
                Commands::Get { r#type, ids } => (CommandKind::Get, r#type.into(), ids),
                Commands::Create { r#type, titles } => {
                    (CommandKind::Create, r#type.into(), titles)
                }
                Commands::Delete { r#type, ids } => (CommandKind::Delete, r#type.into(), ids),
                Commands::Search { r#type, query } => {
                    (CommandKind::Search, r#type.into(), query)
                }
                Commands::Edit { r#type, ids } => (CommandKind::Edit, r#type.into(), ids),
            };

        let invocation = self.flags.invocation(kind, resource, values);
        run_resources(&invocation, &self.flags, &api_url, &config).await
    }
}

async fn run_resources(
    invocation: &Invocation,
    flags: &Flags,
    api_url: &str,
    config: &Config,
) -> Result<()> {
    let file_text = match &invocation.file {
        Some(path) => Some(normalize::read_file(path)?),
        None => None,
    };
    let plan = normalize::normalize(invocation, file_text.as_deref());
    tracing::debug!(inputs = ?plan.inputs, multiple = plan.multiple, "normalized request");

    let options = flags.dispatch_options();

    if flags.debug {
        let client = Arc::new(ArenaClient::new(InspectTransport));
        dispatch::execute(client, &plan, &options, &ExternalEditor).await?;
        return Ok(());
    }

    let token = config.access_token().map(|(token, source)| {
        tracing::debug!(%source, "using access token");
        token
    });
    let transport = HttpTransport::new(api_url, token)?;
    let client = Arc::new(ArenaClient::new(transport));
    let report = dispatch::execute(client, &plan, &options, &ExternalEditor).await?;

    let format_options = FormatOptions {
        resource: plan.resource,
        selection: plan.selection.clone(),
        join: flags.join.clone(),
        json: flags.json,
        pretty: flags.pretty,
        multiple: plan.multiple,
    };
    format::print(&report, &format_options)
}

fn run_auth(cmd: AuthCommands, config: &Config) -> Result<()> {
    match cmd {
        AuthCommands::Login { token } => {
            let token = match token {
                Some(token) => token,
                None => prompts::prompt_token()?,
            };
            config.set_token(token.trim())?;
            println!("{} Access token saved successfully", "✓".green());
        }
        AuthCommands::Logout => {
            config.remove_token()?;
            println!("{} Access token removed", "✓".green());
        }
        AuthCommands::Status => match config.access_token() {
            Some((token, source)) => {
                println!("{} Authenticated", "✓".green());
                println!("  Token: {} (from {})", mask(&token), source);
            }
            None => {
                println!("{} Not authenticated", "✗".red());
                println!(
                    "  Run 'arena auth login' or set {} to authenticate",
                    crate::config::TOKEN_ENV
                );
            }
        },
    }
    Ok(())
}

fn run_config(cmd: ConfigCommands, config: &Config) -> Result<()> {
    match cmd {
        ConfigCommands::Set { key, value } => {
            config
                .set(&key, &value)
                .with_context(|| format!("Failed to set {key}"))?;
            println!("{} Configuration updated: {} = {}", "✓".green(), key, value);
        }
        ConfigCommands::Get { key } => match config.get(&key)? {
            Some(val) => println!("{}", val),
            None => println!("Configuration key '{}' not found", key),
        },
    }
    Ok(())
}
