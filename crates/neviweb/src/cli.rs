//! Clap derive structures for the `neviweb` CLI.
//!
//! Defines the complete command tree, global flags, and shared types.

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// neviweb -- command-line client for Neviweb smart-home devices
#[derive(Debug, Parser)]
#[command(
    name = "neviweb",
    version,
    about = "Control Neviweb thermostats, switches and sensors from the command line",
    long_about = "A CLI for the Neviweb cloud service.\n\n\
        Logs in with your Neviweb account, selects up to three networks\n\
        (locations), and reads or writes device attributes through the cloud.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Account profile to use
    #[arg(long, short = 'p', env = "NEVIWEB_PROFILE", global = true)]
    pub profile: Option<String>,

    /// Account e-mail (overrides profile)
    #[arg(long, short = 'u', env = "NEVIWEB_USERNAME", global = true)]
    pub username: Option<String>,

    /// Account password (prefer the keyring: `neviweb config set-password`)
    #[arg(long, env = "NEVIWEB_PASSWORD", global = true, hide_env_values = true)]
    pub password: Option<String>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "NEVIWEB_OUTPUT",
        default_value = "table",
        global = true
    )]
    pub output: OutputFormat,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Request timeout in seconds (overrides profile)
    #[arg(long, env = "NEVIWEB_TIMEOUT", global = true)]
    pub timeout: Option<u64>,
}

// ── Output Enum ──────────────────────────────────────────────────────

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// YAML
    Yaml,
    /// Plain text, one value per line (scripting)
    Plain,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// List networks and change their occupancy mode
    #[command(alias = "net", alias = "n")]
    Networks(NetworksArgs),

    /// List devices and read their status
    #[command(alias = "dev", alias = "d")]
    Devices(DevicesArgs),

    /// Read and write device attributes
    #[command(alias = "attr", alias = "a")]
    Attributes(AttributesArgs),

    /// Energy consumption history
    Stats(StatsArgs),

    /// Poll every device, once or continuously
    Poll(PollArgs),

    /// Manage CLI configuration and profiles
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ── Networks ─────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct NetworksArgs {
    #[command(subcommand)]
    pub command: NetworksCommand,
}

#[derive(Debug, Subcommand)]
pub enum NetworksCommand {
    /// List the account's locations and which ones are selected
    #[command(alias = "ls")]
    List,

    /// Show pending notifications of a selected network
    Notifications {
        /// Network name or ID
        network: String,
    },

    /// Switch a selected network between home and away
    Occupancy {
        /// Network name or ID
        network: String,
        /// Occupancy mode
        mode: OccupancyArg,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OccupancyArg {
    Home,
    Away,
}

// ── Devices ──────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct DevicesArgs {
    #[command(subcommand)]
    pub command: DevicesCommand,
}

#[derive(Debug, Subcommand)]
pub enum DevicesCommand {
    /// List devices of the selected networks
    #[command(alias = "ls")]
    List,

    /// Poll one device and show its attributes
    Get {
        /// Device name or ID
        device: String,
    },

    /// Show a device's connectivity status
    Status {
        /// Device name or ID
        device: String,
    },

    /// Show a device's active alerts
    Alert {
        /// Device name or ID
        device: String,
    },

    /// Show a device's error-code attribute
    ErrorCode {
        /// Device name or ID
        device: String,
    },
}

// ── Attributes ───────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct AttributesArgs {
    #[command(subcommand)]
    pub command: AttributesCommand,
}

#[derive(Debug, Subcommand)]
pub enum AttributesCommand {
    /// Read named attributes
    Get {
        /// Device name or ID
        device: String,
        /// Attribute names (e.g. roomTemperature roomSetpoint)
        #[arg(required = true)]
        attributes: Vec<String>,
    },

    /// Write attributes
    Set {
        /// Device name or ID
        device: String,
        /// Assignments as name=value; values are parsed as JSON when possible
        #[arg(required_unless_present = "json")]
        assignments: Vec<String>,
        /// Full JSON object to send instead of assignments
        #[arg(long, conflicts_with = "assignments")]
        json: Option<String>,
    },
}

// ── Stats ────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct StatsArgs {
    /// Device name or ID
    pub device: String,

    /// Bucket granularity
    #[arg(long, default_value = "daily")]
    pub period: PeriodArg,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum PeriodArg {
    Hourly,
    Daily,
    Monthly,
}

// ── Poll ─────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct PollArgs {
    /// Run a single poll cycle and exit
    #[arg(long)]
    pub once: bool,
}

// ── Config ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Create or update a profile
    Init {
        /// Account e-mail
        #[arg(long)]
        username: String,
        /// Primary network name
        #[arg(long)]
        network: Option<String>,
        /// Second network name
        #[arg(long)]
        network2: Option<String>,
        /// Third network name
        #[arg(long)]
        network3: Option<String>,
    },

    /// Show the current configuration (secrets redacted)
    Show,

    /// Print the config file path
    Path,

    /// List profiles
    Profiles,

    /// Set the default profile
    Use {
        /// Profile name
        name: String,
    },

    /// Store a profile's password in the system keyring
    SetPassword {
        /// Profile name (defaults to the active profile)
        #[arg(long)]
        profile: Option<String>,
    },
}

// ── Completions ──────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Target shell
    pub shell: clap_complete::Shell,
}
