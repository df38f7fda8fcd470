//! CLI argument definitions using clap derive macros.

use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand};

use ignition_core::OutputFormat;

/// Command-line client for the Ignition gateway REST API.
///
/// Connection settings come from `--gateway`/`--url`/`--token`, then the
/// `IGNITION_GATEWAY_PROFILE`, `IGNITION_GATEWAY_URL` and `IGNITION_API_TOKEN`
/// environment variables, then the default profile in the config file.
#[derive(Parser, Debug)]
#[command(name = "ignition-cli")]
#[command(author, version, about)]
pub struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Only log errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Gateway profile to use
    #[arg(short = 'g', long = "gateway", value_name = "PROFILE", global = true)]
    pub gateway: Option<String>,

    /// Gateway URL override (also the profile URL for `config add`)
    #[arg(long, global = true)]
    pub url: Option<String>,

    /// API token override (also the profile token for `config add`)
    #[arg(long, global = true)]
    pub token: Option<String>,

    /// Output format
    #[arg(short = 'f', long, value_enum, global = true)]
    pub format: Option<OutputFormat>,

    #[command(subcommand)]
    pub command: Command,
}

/// Top-level command groups.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Manage gateway profiles and CLI configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
    /// Gateway status, backups, modules and logs
    Gateway {
        #[command(subcommand)]
        command: GatewayCommand,
    },
    /// Manage projects
    Project {
        #[command(subcommand)]
        command: ProjectCommand,
    },
    /// Manage Perspective views, pages, styles and session properties
    Perspective {
        #[command(subcommand)]
        command: PerspectiveCommand,
    },
    /// Generic CRUD for gateway resources (module/type format)
    Resource {
        #[command(subcommand)]
        command: ResourceCommand,
    },
    /// Manage deployment modes
    Mode {
        #[command(subcommand)]
        command: ModeCommand,
    },
    /// Browse, read, write and manage tags
    Tag {
        #[command(subcommand)]
        command: TagCommand,
    },
    /// Manage device connections
    Device {
        #[command(subcommand)]
        command: DeviceCommand,
    },
    /// Raw API access and endpoint discovery
    Api {
        #[command(subcommand)]
        command: ApiCommand,
    },
}

/// `config` subcommands.
#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Interactive setup: create a gateway profile
    Init,
    /// Add or replace a profile (URL and token come from --url/--token)
    Add {
        /// Profile name
        name: String,
        /// Basic auth username
        #[arg(long)]
        username: Option<String>,
        /// Basic auth password
        #[arg(long)]
        password: Option<String>,
        /// Disable TLS certificate verification
        #[arg(long)]
        no_verify_ssl: bool,
        /// Request timeout in seconds (1-3600)
        #[arg(long, value_name = "SECS")]
        timeout: Option<u64>,
        /// Make this the default profile
        #[arg(long)]
        default: bool,
    },
    /// List configured profiles
    List,
    /// Show one profile with secrets masked
    Show {
        /// Profile name
        name: String,
    },
    /// Set the default profile
    SetDefault {
        /// Profile name
        name: String,
    },
    /// Test connectivity to a gateway
    Test {
        /// Profile name (default profile when omitted)
        name: Option<String>,
    },
    /// Remove a profile
    Remove {
        /// Profile name
        name: String,
        #[command(flatten)]
        confirm: ForceArgs,
    },
}

/// `--force` for destructive commands.
#[derive(Args, Debug, Clone, Copy, Default)]
pub struct ForceArgs {
    /// Skip the confirmation prompt
    #[arg(long)]
    pub force: bool,
}

/// `-o/--output` destination.
#[derive(Args, Debug, Clone, Default)]
pub struct OutputFileArgs {
    /// Output file path
    #[arg(short, long = "output", value_name = "FILE")]
    pub output: Option<PathBuf>,
}

/// `gateway` subcommands.
#[derive(Subcommand, Debug)]
pub enum GatewayCommand {
    /// Concise status: name, version, edition, mode
    Status,
    /// Full gateway information
    Info,
    /// Download a gateway backup (.gwbk)
    Backup(OutputFileArgs),
    /// Restore a gateway backup
    Restore {
        /// Backup file (.gwbk)
        file: PathBuf,
        #[command(flatten)]
        confirm: ForceArgs,
    },
    /// List installed modules
    Modules {
        /// Show quarantined modules instead
        #[arg(long)]
        quarantined: bool,
    },
    /// View gateway logs
    Logs {
        /// Number of log lines
        #[arg(short = 'n', long, default_value_t = 50)]
        lines: u32,
        /// Minimum log level
        #[arg(short = 'l', long)]
        level: Option<String>,
    },
    /// Download the gateway log archive
    LogDownload(OutputFileArgs),
    /// List loggers and their levels
    Loggers,
    /// Trigger a project scan
    ScanProjects,
    /// Trigger a configuration scan
    ScanConfig,
    /// Browse the gateway entity tree
    EntityBrowse {
        /// Entity path to browse
        #[arg(short, long)]
        path: Option<String>,
        /// Browse depth
        #[arg(short, long, default_value_t = 1)]
        depth: u32,
    },
}

/// `project` subcommands.
#[derive(Subcommand, Debug)]
pub enum ProjectCommand {
    /// List projects
    List {
        /// Case-insensitive name filter
        #[arg(long)]
        filter: Option<String>,
    },
    /// Show project details
    Show {
        /// Project name
        name: String,
    },
    /// Create a project
    Create {
        /// Project name
        name: String,
        /// Project title
        #[arg(short, long)]
        title: Option<String>,
        /// Project description
        #[arg(short, long)]
        description: Option<String>,
    },
    /// Delete a project
    Delete {
        /// Project name
        name: String,
        #[command(flatten)]
        confirm: ForceArgs,
    },
    /// Export a project as a zip archive
    Export {
        /// Project name
        name: String,
        #[command(flatten)]
        output: OutputFileArgs,
    },
    /// Import a project from a zip archive
    Import {
        /// Project archive (.zip)
        file: PathBuf,
        /// Project name (defaults to the file stem)
        #[arg(short, long)]
        name: Option<String>,
        /// Overwrite an existing project
        #[arg(long)]
        overwrite: bool,
        #[command(flatten)]
        confirm: ForceArgs,
    },
    /// Copy a project to a new name
    Copy {
        /// Source project name
        name: String,
        /// New project name
        #[arg(short = 'n', long = "name")]
        new_name: String,
    },
    /// Rename a project
    Rename {
        /// Current project name
        name: String,
        /// New project name
        #[arg(short = 'n', long = "name")]
        new_name: String,
    },
    /// List a project's resources
    Resources {
        /// Project name
        name: String,
    },
    /// Diff a project between this gateway and another profile's gateway
    Diff {
        /// Project name
        name: String,
        /// Profile of the gateway to compare against
        #[arg(short, long, value_name = "PROFILE")]
        target: String,
    },
    /// Watch a local directory and push changes to a project
    Watch {
        /// Project name
        name: String,
        /// Directory to watch
        path: PathBuf,
    },
}

/// `perspective` subcommands.
#[derive(Subcommand, Debug)]
pub enum PerspectiveCommand {
    /// Perspective views
    View {
        #[command(subcommand)]
        command: ViewCommand,
    },
    /// Perspective page configuration
    Page {
        #[command(subcommand)]
        command: PageCommand,
    },
    /// Perspective style classes
    Style {
        #[command(subcommand)]
        command: StyleCommand,
    },
    /// Perspective session properties
    Session {
        #[command(subcommand)]
        command: SessionCommand,
    },
}

/// JSON payload given literally or as `@path`.
#[derive(Args, Debug, Clone)]
pub struct JsonPayloadArgs {
    /// JSON string or @file path
    #[arg(short = 'j', long = "json", value_name = "JSON")]
    pub json: String,
}

/// `perspective view` subcommands.
#[derive(Subcommand, Debug)]
pub enum ViewCommand {
    /// List views
    List {
        /// Project name
        project: String,
    },
    /// Show a view definition
    Show {
        /// Project name
        project: String,
        /// View path (e.g. Page/Home)
        view: String,
    },
    /// Create a view
    Create {
        /// Project name
        project: String,
        /// View path (e.g. Folder/View)
        view: String,
        #[command(flatten)]
        payload: JsonPayloadArgs,
    },
    /// Replace a view definition
    Update {
        /// Project name
        project: String,
        /// View path
        view: String,
        #[command(flatten)]
        payload: JsonPayloadArgs,
    },
    /// Delete a view
    Delete {
        /// Project name
        project: String,
        /// View path
        view: String,
        #[command(flatten)]
        confirm: ForceArgs,
    },
    /// Show the view hierarchy as a tree
    Tree {
        /// Project name
        project: String,
    },
}

/// `perspective page` subcommands.
#[derive(Subcommand, Debug)]
pub enum PageCommand {
    /// Show the page configuration
    Show {
        /// Project name
        project: String,
    },
    /// List page routes
    List {
        /// Project name
        project: String,
    },
    /// Replace the page configuration
    Update {
        /// Project name
        project: String,
        #[command(flatten)]
        payload: JsonPayloadArgs,
    },
}

/// `perspective style` subcommands.
#[derive(Subcommand, Debug)]
pub enum StyleCommand {
    /// List style classes
    List {
        /// Project name
        project: String,
    },
    /// Show a style class
    Show {
        /// Project name
        project: String,
        /// Style class name
        style: String,
    },
    /// Create a style class
    Create {
        /// Project name
        project: String,
        /// Style class name
        style: String,
        #[command(flatten)]
        payload: JsonPayloadArgs,
    },
    /// Replace a style class
    Update {
        /// Project name
        project: String,
        /// Style class name
        style: String,
        #[command(flatten)]
        payload: JsonPayloadArgs,
    },
    /// Delete a style class
    Delete {
        /// Project name
        project: String,
        /// Style class name
        style: String,
        #[command(flatten)]
        confirm: ForceArgs,
    },
}

/// `perspective session` subcommands.
#[derive(Subcommand, Debug)]
pub enum SessionCommand {
    /// Show the session properties
    Show {
        /// Project name
        project: String,
    },
    /// Replace the session properties
    Update {
        /// Project name
        project: String,
        #[command(flatten)]
        payload: JsonPayloadArgs,
    },
}

/// `resource` subcommands.
#[derive(Subcommand, Debug)]
pub enum ResourceCommand {
    /// List resources of a type
    List {
        /// Resource type (e.g. ignition/database-connection)
        resource_type: String,
    },
    /// Show a resource
    Show {
        /// Resource type
        resource_type: String,
        /// Resource name
        name: String,
    },
    /// Create a resource
    Create {
        /// Resource type
        resource_type: String,
        /// Resource name
        #[arg(short, long)]
        name: String,
        /// JSON config string or @file path
        #[arg(short, long)]
        config: Option<String>,
    },
    /// Update a resource (signature fetched when absent)
    Update {
        /// Resource type
        resource_type: String,
        /// Resource name
        name: String,
        /// JSON config string or @file path
        #[arg(short, long)]
        config: String,
    },
    /// Delete a resource
    Delete {
        /// Resource type
        resource_type: String,
        /// Resource name
        name: String,
        /// Resource signature (fetched when omitted)
        #[arg(short, long)]
        signature: Option<String>,
        #[command(flatten)]
        confirm: ForceArgs,
    },
    /// List resource names of a type
    Names {
        /// Resource type
        resource_type: String,
    },
    /// Upload a data file to a resource
    Upload {
        /// Resource type (e.g. com.inductiveautomation.perspective/themes)
        resource_type: String,
        /// Resource name
        name: String,
        /// Local file to upload
        file: PathBuf,
        /// Resource signature (fetched when omitted)
        #[arg(short, long)]
        signature: Option<String>,
        /// Remote file name (defaults to the local file name)
        #[arg(long)]
        filename: Option<String>,
    },
    /// Download a data file from a resource
    Download {
        /// Resource type
        resource_type: String,
        /// Resource name
        name: String,
        /// Remote file name
        filename: String,
        #[command(flatten)]
        output: OutputFileArgs,
    },
    /// List resource types known to the gateway
    Types,
}

/// `mode` subcommands.
#[derive(Subcommand, Debug)]
pub enum ModeCommand {
    /// List deployment modes
    List,
    /// Show one deployment mode
    Show {
        /// Mode name
        name: String,
    },
    /// Create a deployment mode
    Create {
        /// Mode name
        name: String,
        /// Short title
        #[arg(short, long)]
        title: Option<String>,
        /// Description
        #[arg(short, long)]
        description: Option<String>,
    },
    /// Update or rename a deployment mode
    Update {
        /// Mode name
        name: String,
        /// New name
        #[arg(short = 'n', long = "name")]
        new_name: Option<String>,
        /// Short title
        #[arg(short, long)]
        title: Option<String>,
        /// Description
        #[arg(short, long)]
        description: Option<String>,
    },
    /// Delete a deployment mode
    Delete {
        /// Mode name
        name: String,
        #[command(flatten)]
        confirm: ForceArgs,
    },
    /// Assign a resource to a mode (omit the name for singletons)
    Assign {
        /// Mode name
        mode: String,
        /// Resource type
        resource_type: String,
        /// Resource name
        name: Option<String>,
    },
    /// Remove a resource from a mode (omit the name for singletons)
    Unassign {
        /// Mode name
        mode: String,
        /// Resource type
        resource_type: String,
        /// Resource name
        name: Option<String>,
    },
}

/// `--provider` for tag commands.
#[derive(Args, Debug, Clone)]
pub struct ProviderArgs {
    /// Tag provider
    #[arg(short, long, default_value = "default")]
    pub provider: String,
}

/// `tag` subcommands.
#[derive(Subcommand, Debug)]
pub enum TagCommand {
    /// Browse the tag tree
    Browse {
        /// Tag path to browse
        path: Option<String>,
        /// Browse recursively
        #[arg(short, long)]
        recursive: bool,
        #[command(flatten)]
        provider: ProviderArgs,
    },
    /// Read tag values (needs a custom endpoint)
    Read {
        /// Tag paths
        #[arg(required = true)]
        paths: Vec<String>,
        #[command(flatten)]
        provider: ProviderArgs,
    },
    /// Write a tag value (needs a custom endpoint)
    Write {
        /// Tag path
        path: String,
        /// Value; parsed as JSON when possible
        value: String,
        #[command(flatten)]
        provider: ProviderArgs,
    },
    /// Export tag configuration as JSON
    Export {
        /// Tag path (root when omitted)
        path: Option<String>,
        #[command(flatten)]
        output: OutputFileArgs,
        #[command(flatten)]
        provider: ProviderArgs,
    },
    /// Import tag configuration (JSON, XML or CSV)
    Import {
        /// Tag file
        file: PathBuf,
        /// Abort, Overwrite, Rename, Ignore or MergeOverwrite
        #[arg(short = 'c', long, default_value = "MergeOverwrite")]
        collision_policy: String,
        /// Target path
        #[arg(long)]
        path: Option<String>,
        #[command(flatten)]
        provider: ProviderArgs,
    },
    /// List tag providers
    Providers,
}

/// Module and type under which devices live.
#[derive(Args, Debug, Clone)]
pub struct DeviceTarget {
    /// Resource module
    #[arg(long, default_value = "com.inductiveautomation.opcua")]
    pub module: String,
    /// Resource type
    #[arg(long = "type", default_value = "device")]
    pub device_type: String,
}

/// `device` subcommands.
#[derive(Subcommand, Debug)]
pub enum DeviceCommand {
    /// List device connections
    List {
        /// Case-insensitive state filter
        #[arg(long)]
        status: Option<String>,
        #[command(flatten)]
        target: DeviceTarget,
    },
    /// Show a device connection
    Show {
        /// Device name
        name: String,
        #[command(flatten)]
        target: DeviceTarget,
    },
    /// Restart a device by toggling its enabled state
    Restart {
        /// Device name
        name: String,
        #[command(flatten)]
        target: DeviceTarget,
    },
}

/// `api` subcommands.
#[derive(Subcommand, Debug)]
pub enum ApiCommand {
    /// GET an API path
    Get {
        /// Path under the API base (e.g. /gateway-info)
        path: String,
    },
    /// POST to an API path
    Post {
        /// API path
        path: String,
        /// JSON body or @file path
        #[arg(short, long)]
        data: Option<String>,
    },
    /// PUT to an API path
    Put {
        /// API path
        path: String,
        /// JSON body or @file path
        #[arg(short, long)]
        data: Option<String>,
    },
    /// DELETE an API path
    Delete {
        /// API path
        path: String,
    },
    /// Browse endpoints from the OpenAPI document
    Discover {
        /// Case-insensitive path filter
        #[arg(long)]
        filter: Option<String>,
        /// HTTP method filter
        #[arg(short, long)]
        method: Option<String>,
    },
    /// Download the OpenAPI document
    Spec(OutputFileArgs),
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_cli_verbose_flag_increments_count() {
        let cli = Cli::try_parse_from(["ignition-cli", "-vv", "gateway", "info"]).unwrap();
        assert_eq!(cli.verbose, 2);
        assert!(!cli.quiet);
    }

    #[test]
    fn test_cli_quiet_conflicts_with_verbose() {
        let err = Cli::try_parse_from(["ignition-cli", "-q", "-v", "gateway", "info"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::ArgumentConflict);
    }

    #[test]
    fn test_cli_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "ignition-cli",
            "project",
            "list",
            "-g",
            "dev",
            "--format",
            "json",
        ])
        .unwrap();
        assert_eq!(cli.gateway.as_deref(), Some("dev"));
        assert_eq!(cli.format, Some(OutputFormat::Json));
    }

    #[test]
    fn test_cli_config_add_takes_url_and_token_from_globals() {
        let cli = Cli::try_parse_from([
            "ignition-cli",
            "config",
            "add",
            "dev",
            "--url",
            "https://gw:8043",
            "--token",
            "key:secret",
            "--timeout",
            "45",
        ])
        .unwrap();
        assert_eq!(cli.url.as_deref(), Some("https://gw:8043"));
        assert_eq!(cli.token.as_deref(), Some("key:secret"));
        match cli.command {
            Command::Config {
                command: ConfigCommand::Add { name, timeout, .. },
            } => {
                assert_eq!(name, "dev");
                assert_eq!(timeout, Some(45));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_cli_view_create_requires_json() {
        let err = Cli::try_parse_from(["ignition-cli", "perspective", "view", "create", "P", "V"])
            .unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::MissingRequiredArgument);
    }

    #[test]
    fn test_cli_device_target_defaults() {
        let cli = Cli::try_parse_from(["ignition-cli", "device", "list"]).unwrap();
        match cli.command {
            Command::Device {
                command: DeviceCommand::List { target, status },
            } => {
                assert_eq!(target.module, "com.inductiveautomation.opcua");
                assert_eq!(target.device_type, "device");
                assert!(status.is_none());
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_cli_invalid_format_rejected() {
        let err = Cli::try_parse_from(["ignition-cli", "-f", "xml", "gateway", "info"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::InvalidValue);
    }

    #[test]
    fn test_cli_help_flag_shows_usage() {
        let err = Cli::try_parse_from(["ignition-cli", "--help"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::DisplayHelp);
    }
}
