//! Clap derive structures for the `unifiled` CLI.
//!
//! Defines the command tree, global flags, and shared types.

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// unifiled -- control UniFi LED lights from the command line
#[derive(Debug, Parser)]
#[command(
    name = "unifiled",
    version,
    about = "Control UniFi LED lights and read their power draw",
    long_about = "Talks to a UniFi LED controller: lists and switches its dimmable\n\
        lights, reports per-device power draw, and can watch every device\n\
        on a polling interval.",
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
    /// Controller profile to use
    #[arg(long, short = 'p', env = "UNIFILED_PROFILE", global = true)]
    pub profile: Option<String>,

    /// Controller URL, e.g. https://192.168.1.20:20443 (overrides profile)
    #[arg(long, short = 'c', env = "UNIFILED_CONTROLLER", global = true)]
    pub controller: Option<String>,

    /// Controller host (overrides profile)
    #[arg(long, env = "UNIFILED_HOST", global = true)]
    pub host: Option<String>,

    /// Controller port (overrides profile)
    #[arg(long, env = "UNIFILED_PORT", global = true)]
    pub port: Option<u16>,

    /// Controller username (overrides profile)
    #[arg(long, short = 'u', env = "UNIFILED_USERNAME", global = true)]
    pub username: Option<String>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "UNIFILED_OUTPUT",
        default_value = "table",
        global = true
    )]
    pub output: OutputFormat,

    /// When to use color output
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorMode,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Accept self-signed TLS certificates
    #[arg(long, short = 'k', env = "UNIFILED_INSECURE", global = true)]
    pub insecure: bool,

    /// Request timeout in seconds (overrides profile)
    #[arg(long, env = "UNIFILED_TIMEOUT", global = true)]
    pub timeout: Option<u64>,
}

// ── Output & Color Enums ─────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
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

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ColorMode {
    /// Auto-detect (color if terminal is interactive)
    Auto,
    /// Always emit color codes
    Always,
    /// Never emit color codes
    Never,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// List and switch lights
    #[command(alias = "light", alias = "l")]
    Lights(LightsArgs),

    /// Read power sensors
    #[command(alias = "sensor", alias = "s")]
    Sensors(SensorsArgs),

    /// Poll every device and log state changes until interrupted
    Watch(WatchArgs),

    /// Manage CLI configuration and profiles
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ── Lights ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct LightsArgs {
    #[command(subcommand)]
    pub command: LightsCommand,
}

#[derive(Debug, Subcommand)]
pub enum LightsCommand {
    /// List lights with on/off state and brightness (0-255)
    #[command(alias = "ls")]
    List,

    /// Turn a light on
    On {
        /// Device ID
        id: String,

        /// Brightness, 0-255 (default: full)
        #[arg(long, short = 'b')]
        brightness: Option<u8>,
    },

    /// Turn a light off
    Off {
        /// Device ID
        id: String,
    },
}

// ── Sensors ──────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct SensorsArgs {
    #[command(subcommand)]
    pub command: SensorsCommand,
}

#[derive(Debug, Subcommand)]
pub enum SensorsCommand {
    /// List power readings in kW
    #[command(alias = "ls")]
    List,
}

// ── Watch ────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct WatchArgs {
    /// Poll interval in seconds (default: profile scan_interval)
    #[arg(long, short = 'i')]
    pub interval: Option<u64>,

    /// Retry setup this many times while the controller is not ready
    #[arg(long, default_value = "5")]
    pub attempts: u32,
}

// ── Config ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Interactive configuration wizard
    Init,

    /// Show the current configuration (secrets masked)
    Show,

    /// Set a value on the active profile
    Set {
        /// Key: host, port, username, password_env, ca_cert, insecure, timeout, scan_interval
        key: String,
        value: String,
    },

    /// List configured profiles
    Profiles,

    /// Make a profile the default
    Use {
        /// Profile name
        name: String,
    },

    /// Store the active profile's password in the system keyring
    SetPassword,
}

// ── Completions ──────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Target shell
    pub shell: clap_complete::Shell,
}
