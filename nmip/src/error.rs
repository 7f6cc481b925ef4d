use std::io;
use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

pub type Result<T, E = NmipError> = std::result::Result<T, E>;

#[derive(Error, Debug, Diagnostic)]
pub enum NmipError {
    #[error("invalid connection properties: {0}")]
    #[diagnostic(
        code(nmip::properties),
        help("properties must be an object of groups, each an object of key/value pairs")
    )]
    InvalidProperties(String),

    #[error("invalid parameters for {action}: {reason}")]
    #[diagnostic(code(nmip::params))]
    InvalidParams { action: String, reason: String },

    #[error("unknown action {0}")]
    #[diagnostic(
        code(nmip::action),
        help("supported actions: define_connection, up_connection, down_connection, delete_connection, configure_connection")
    )]
    UnknownAction(String),

    #[error("failed to write profile {}", .path.display())]
    #[diagnostic(code(nmip::io))]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to execute {program}")]
    #[diagnostic(code(nmip::spawn), help("is NetworkManager's nmcli installed and in PATH?"))]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    /// A command whose failure is not translated into an operation result.
    #[error("exec {command:?}: failed with exit code {code}: {stderr}")]
    #[diagnostic(code(nmip::unrecovered))]
    Unrecovered {
        command: Vec<String>,
        code: i32,
        stderr: String,
    },

    #[error("failed to load configuration from {}: {reason}", .path.display())]
    #[diagnostic(code(nmip::config))]
    Config { path: PathBuf, reason: String },
}
