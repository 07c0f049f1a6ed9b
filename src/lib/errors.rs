use std::{io, path::PathBuf};

use config::ConfigError as ConfigLoaderError;
use thiserror::Error;

/// Errors that can occur while loading or validating configuration files.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to build (read) the configuration file.
    #[error("Failed to read configuration file {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: ConfigLoaderError,
    },
    /// Failed to deserialize TOML into a struct.
    #[error("Failed to parse configuration file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: ConfigLoaderError,
    },
    /// Field failed validation.
    #[error("Configuration file {path} has invalid `{field}`: {message}")]
    InvalidField {
        path: PathBuf,
        field: &'static str,
        message: String,
    },
    /// The current directory could not be resolved for a relative path.
    #[error("Failed to resolve the current directory: {source}")]
    CurrentDir {
        #[source]
        source: io::Error,
    },
}

impl ConfigError {
    /// Helper to wrap `config::ConfigError` as a read failure.
    pub fn from_read_error(path: PathBuf, source: ConfigLoaderError) -> Self {
        Self::FileRead { path, source }
    }

    /// Helper to wrap `config::ConfigError` as a parse failure.
    pub fn from_parse_error(path: PathBuf, source: ConfigLoaderError) -> Self {
        Self::Parse { path, source }
    }
}

/// Conflicts detected while assembling the command tree. These are startup
/// failures: the binary refuses to dispatch anything when one occurs.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistrationError {
    #[error("command `{path}` is already registered with a different handler")]
    DuplicateCommand { path: String },
    #[error("command `{path}` is already registered with a different visibility")]
    VisibilityConflict { path: String },
    #[error("`{path}` is already registered as a {existing}")]
    NameConflict { path: String, existing: &'static str },
    #[error("group `{path}` does not exist")]
    UnknownGroup { path: String },
    #[error("cannot alias `{path}`: no such command")]
    UnknownAliasTarget { path: String },
    #[error("invalid command name `{name}`: {reason}")]
    InvalidName { name: String, reason: &'static str },
}

/// User-facing failures while resolving argv to a handler.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("No such command '{name}'{}.", in_group(.group))]
    UnknownCommand {
        group: String,
        name: String,
        suggestions: Vec<String>,
        available: Vec<String>,
    },
    #[error("Missing command{}.", in_group(.group))]
    MissingCommand {
        group: String,
        available: Vec<String>,
    },
    #[error("{message}")]
    MalformedArguments { command: String, message: String },
}

fn in_group(group: &str) -> String {
    if group.is_empty() {
        String::new()
    } else {
        format!(" in '{group}'")
    }
}

impl DispatchError {
    /// Multi-line diagnostic including suggestions or the available names.
    pub fn render(&self) -> String {
        match self {
            DispatchError::UnknownCommand {
                suggestions,
                available,
                ..
            } => {
                if suggestions.is_empty() {
                    format!("Error: {self}\n{}", list_available(available))
                } else {
                    format!("Error: {self}\nDid you mean: {}?", suggestions.join(", "))
                }
            }
            DispatchError::MissingCommand { available, .. } => {
                format!("Error: {self}\n{}", list_available(available))
            }
            DispatchError::MalformedArguments { message, .. } => message.trim_end().to_string(),
        }
    }
}

fn list_available(available: &[String]) -> String {
    if available.is_empty() {
        "No commands are available here.".to_string()
    } else {
        format!("Available commands: {}", available.join(", "))
    }
}

/// Failure kinds of a single caller-identity lookup.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum IdentityError {
    /// No credentials could be discovered by the provider chain.
    #[error("no credentials could be loaded")]
    NoCredentials,
    /// Credentials were found but are missing parts or misconfigured.
    #[error("credentials are incomplete: {message}")]
    IncompleteCredentials { message: String },
    /// The service rejected the request with a structured error code.
    #[error("request rejected ({code}){}", .message.as_deref().map(|m| format!(": {m}")).unwrap_or_default())]
    Rejected {
        code: String,
        message: Option<String>,
    },
    /// Anything else: transport failures, timeouts, malformed responses.
    #[error("{message}")]
    Unclassified { message: String },
}

/// Errors reported by command handlers.
#[derive(Debug, Error)]
pub enum CommandError {
    /// Credential pre-flight check failed with a diagnostic.
    #[error("{message}")]
    Credentials { message: String },
    /// A cloud lookup the command depends on failed.
    #[error("Failed to resolve AWS account: {source}")]
    Identity {
        #[source]
        source: IdentityError,
    },
    #[error("Invalid value for `{name}`: {message}")]
    InvalidArgument { name: &'static str, message: String },
    #[error("Failed to write command output: {source}")]
    Output {
        #[from]
        source: io::Error,
    },
    #[error("Failed to render command output: {message}")]
    Render { message: String },
}

impl From<serde_json::Error> for CommandError {
    fn from(value: serde_json::Error) -> Self {
        CommandError::Render {
            message: value.to_string(),
        }
    }
}

impl From<toml::ser::Error> for CommandError {
    fn from(value: toml::ser::Error) -> Self {
        CommandError::Render {
            message: value.to_string(),
        }
    }
}
