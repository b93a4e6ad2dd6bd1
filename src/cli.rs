// Command-line surface: `cbrain [global flags] <resource> <action> [args]`.

use crate::api::resource::{DEFAULT_PAGE, DEFAULT_PER_PAGE};
use crate::api::{ListQuery, Pagination};
use crate::error::Result;
use crate::output::OutputFormat;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Command-line client for the CBRAIN REST API
#[derive(Parser, Debug)]
#[command(name = "cbrain", bin_name = "cbrain", version, about, long_about = None)]
#[command(disable_help_subcommand = true)]
pub struct Cli {
    /// Output as indented JSON
    #[arg(short, long, global = true)]
    pub json: bool,

    /// Output as JSON Lines (one compact object per line)
    #[arg(short = 'l', long, global = true)]
    pub jsonl: bool,

    /// Prompt for missing values
    #[arg(short, long, global = true)]
    pub interactive: bool,

    /// Debug logging on stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

impl Cli {
    pub fn output_format(&self) -> OutputFormat {
        OutputFormat::from_flags(self.json, self.jsonl)
    }
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Log in to a CBRAIN server
    Login,

    /// Log out and remove the stored credentials
    Logout,

    /// Show the logged-in user
    Whoami {
        /// Also show credential details and verify the token
        #[arg(long)]
        version: bool,
    },

    /// Show the client version
    Version,

    /// Files (userfiles)
    #[command(arg_required_else_help = true)]
    File(FileArgs),

    /// Data providers
    #[command(arg_required_else_help = true)]
    Dataprovider(DataProviderArgs),

    /// Projects (groups)
    #[command(arg_required_else_help = true)]
    Project(ProjectArgs),

    /// Tools
    #[command(arg_required_else_help = true)]
    Tool(ToolArgs),

    /// Tool configurations
    #[command(name = "tool-config", arg_required_else_help = true)]
    ToolConfig(ToolConfigArgs),

    /// Tags
    #[command(arg_required_else_help = true)]
    Tag(TagArgs),

    /// Background activities
    #[command(arg_required_else_help = true)]
    Background(BackgroundArgs),

    /// Tasks
    #[command(arg_required_else_help = true)]
    Task(TaskArgs),

    /// Remote resources (execution servers)
    #[command(
        name = "remote-resource",
        visible_alias = "remote-resources",
        arg_required_else_help = true
    )]
    RemoteResource(RemoteResourceArgs),
}

/// `--page` / `--per-page`, validated before any request.
#[derive(Args, Debug, Clone, Copy)]
pub struct PageArgs {
    /// Page number
    #[arg(long, default_value_t = DEFAULT_PAGE, allow_negative_numbers = true)]
    pub page: i64,

    /// Results per page (5 to 1000)
    #[arg(long = "per-page", default_value_t = DEFAULT_PER_PAGE, allow_negative_numbers = true)]
    pub per_page: i64,
}

impl PageArgs {
    pub fn query(&self) -> Result<ListQuery> {
        Ok(ListQuery::paged(Pagination::new(self.page, self.per_page)?))
    }
}

#[derive(Args, Debug)]
pub struct FileArgs {
    #[command(subcommand)]
    pub command: FileCommand,
}

#[derive(Subcommand, Debug)]
pub enum FileCommand {
    /// List files
    List {
        #[arg(long = "group-id")]
        group_id: Option<u64>,
        #[arg(long = "dp-id")]
        dp_id: Option<u64>,
        #[arg(long = "user-id")]
        user_id: Option<u64>,
        #[arg(long = "parent-id")]
        parent_id: Option<u64>,
        #[arg(long = "file-type")]
        file_type: Option<String>,
        #[command(flatten)]
        page: PageArgs,
    },

    /// Show one file
    Show { id: u64 },

    /// Upload a local file
    Upload(UploadArgs),

    /// Copy files to another data provider
    Copy(TransferArgs),

    /// Move files to another data provider
    Move(TransferArgs),

    /// Delete a file
    Delete { id: u64 },
}

#[derive(Args, Debug)]
pub struct UploadArgs {
    /// Local file to upload
    pub path: PathBuf,

    /// Destination data provider
    #[arg(long = "data-provider")]
    pub data_provider: u64,

    /// Owning group
    #[arg(long = "group-id", default_value_t = 2)]
    pub group_id: u64,

    #[arg(long = "TextFile", group = "file_type")]
    pub text_file: bool,

    #[arg(long = "SingleFile", group = "file_type")]
    pub single_file: bool,

    #[arg(long = "FileCollection", group = "file_type")]
    pub file_collection: bool,
}

impl UploadArgs {
    /// Userfile type sent to the server; `SingleFile` unless told otherwise.
    pub fn file_type(&self) -> &'static str {
        if self.text_file {
            "TextFile"
        } else if self.file_collection {
            "FileCollection"
        } else {
            "SingleFile"
        }
    }
}

#[derive(Args, Debug)]
pub struct TransferArgs {
    /// File to transfer (repeatable)
    #[arg(long = "file-id", num_args = 1.., required = true)]
    pub file_ids: Vec<u64>,

    /// Destination data provider
    #[arg(long = "dp-id")]
    pub dp_id: u64,
}

#[derive(Args, Debug)]
pub struct DataProviderArgs {
    #[command(subcommand)]
    pub command: DataProviderCommand,
}

#[derive(Subcommand, Debug)]
pub enum DataProviderCommand {
    /// List data providers
    List(PageArgs),
    /// Show one data provider
    Show { id: u64 },
    /// Check whether a data provider is reachable
    IsAlive { id: u64 },
    /// Remove files on the provider that are not registered in CBRAIN
    DeleteUnregisteredFiles { id: u64 },
}

#[derive(Args, Debug)]
pub struct ProjectArgs {
    #[command(subcommand)]
    pub command: ProjectCommand,
}

#[derive(Subcommand, Debug)]
pub enum ProjectCommand {
    /// List projects
    List(PageArgs),
    /// Show a project, or the current one when no id is given
    Show { id: Option<u64> },
    /// Make a project the current one
    Switch { id: u64 },
}

#[derive(Args, Debug)]
pub struct ToolArgs {
    #[command(subcommand)]
    pub command: ToolCommand,
}

#[derive(Subcommand, Debug)]
pub enum ToolCommand {
    /// List tools
    List(PageArgs),
    /// Show one tool
    Show { id: u64 },
}

#[derive(Args, Debug)]
pub struct ToolConfigArgs {
    #[command(subcommand)]
    pub command: ToolConfigCommand,
}

#[derive(Subcommand, Debug)]
pub enum ToolConfigCommand {
    /// List tool configurations
    List(PageArgs),
    /// Show one tool configuration
    Show { id: u64 },
    /// Boutiques descriptor of a tool configuration
    BoutiquesDescriptor { id: u64 },
}

#[derive(Args, Debug)]
pub struct TagArgs {
    #[command(subcommand)]
    pub command: TagCommand,
}

#[derive(Subcommand, Debug)]
pub enum TagCommand {
    /// List tags
    List(PageArgs),
    /// Show one tag
    Show { id: u64 },
    /// Create a tag
    Create(TagFields),
    /// Update a tag
    Update {
        id: Option<u64>,
        #[command(flatten)]
        fields: TagFields,
    },
    /// Delete a tag
    Delete { id: Option<u64> },
}

#[derive(Args, Debug, Clone, Default)]
pub struct TagFields {
    #[arg(long)]
    pub name: Option<String>,
    #[arg(long = "user-id")]
    pub user_id: Option<u64>,
    #[arg(long = "group-id")]
    pub group_id: Option<u64>,
}

#[derive(Args, Debug)]
pub struct BackgroundArgs {
    #[command(subcommand)]
    pub command: BackgroundCommand,
}

#[derive(Subcommand, Debug)]
pub enum BackgroundCommand {
    /// List background activities
    List(PageArgs),
    /// Show one background activity
    Show { id: u64 },
}

#[derive(Args, Debug)]
pub struct TaskArgs {
    #[command(subcommand)]
    pub command: TaskCommand,
}

#[derive(Subcommand, Debug)]
pub enum TaskCommand {
    /// List tasks, optionally for one execution server
    List {
        #[command(subcommand)]
        filter: Option<TaskFilter>,
        #[command(flatten)]
        page: PageArgs,
    },
    /// Show one task
    Show { id: u64 },
    /// Apply an operation (e.g. hold, suspend, terminate) to tasks
    Operation {
        name: String,
        #[arg(long = "task-id", num_args = 1.., required = true)]
        task_ids: Vec<u64>,
    },
}

#[derive(Subcommand, Debug, Clone, Copy)]
pub enum TaskFilter {
    /// Tasks on one execution server
    #[command(name = "bourreau-id")]
    BourreauId { id: u64 },
}

#[derive(Args, Debug)]
pub struct RemoteResourceArgs {
    #[command(subcommand)]
    pub command: RemoteResourceCommand,
}

#[derive(Subcommand, Debug)]
pub enum RemoteResourceCommand {
    /// List remote resources
    List(PageArgs),
    /// Show one remote resource
    Show { id: u64 },
}
