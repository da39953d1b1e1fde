//! CLI argument parsing using clap

use alliant_client::{Action, ResourceKind, Verbosity};
use clap::{Parser, Subcommand};
use std::time::Duration;

/// Alliant REST API client
#[derive(Parser, Debug)]
#[command(name = "alliant", about = "Work with the Alliant REST API", version)]
pub struct Args {
    /// Server base URL; `/api` is appended when missing
    #[arg(long, env = "ALLIANT_BASE_URL")]
    pub base_url: String,

    /// User ID to log in with
    #[arg(short, long, env = "ALLIANT_USER")]
    pub user: Option<String>,

    /// System layer key
    #[arg(long, env = "ALLIANT_SYSTEM_LAYER", default_value = "default")]
    pub system_layer: String,

    /// Application layer (environment) to log in to
    #[arg(short, long, env = "ALLIANT_APPLICATION_LAYER")]
    pub application_layer: Option<String>,

    /// Request timeout, e.g. `30s` or `2m`
    #[arg(
        long,
        env = "ALLIANT_TIMEOUT",
        default_value = "30s",
        value_parser = humantime::parse_duration
    )]
    pub timeout: Duration,

    /// Enable debug logging (RUST_LOG takes precedence)
    #[arg(short, long)]
    pub verbose: bool,

    /// Quiet mode - only print the result JSON
    #[arg(short, long)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// List the system layers (no login)
    SystemLayers,

    /// List the application layers of a system layer (no login)
    ApplicationLayers {
        /// System layer key
        system_layer: String,
    },

    /// Look up records of a resource, optionally filtered by one field
    Lookup {
        /// adjustment, contract, contact or tc<N>
        resource: ResourceKind,

        /// Field to filter on
        #[arg(long, requires = "filter_value")]
        filter_field: Option<String>,

        /// Value the field must equal
        #[arg(long, requires = "filter_field")]
        filter_value: Option<String>,

        /// Maximum number of records
        #[arg(long)]
        top: Option<u32>,

        /// Number of records to skip
        #[arg(long)]
        skip: Option<u32>,

        /// minimal, default or verbose
        #[arg(long, default_value = "default")]
        verbosity: Verbosity,
    },

    /// Fetch one record by GUID
    Get {
        resource: ResourceKind,
        guid: String,

        /// Related fields to include (comma-separated)
        #[arg(long, value_delimiter = ',')]
        include: Vec<String>,
    },

    /// Run a status action on a record
    Action {
        resource: ResourceKind,
        guid: String,
        /// e.g. complete, approve, post, revise
        action: Action,

        /// Comment sent with the action; approve and clearRequest need one
        #[arg(short, long)]
        comment: Option<String>,
    },

    /// Delete a record by GUID
    Delete { resource: ResourceKind, guid: String },
}

impl Command {
    /// Whether the command runs inside a logged-in session
    pub fn needs_session(&self) -> bool {
        !matches!(self, Command::SystemLayers | Command::ApplicationLayers { .. })
    }
}
