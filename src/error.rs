// src/error.rs

use std::path::PathBuf;
use thiserror::Error;

/// Core error types for pacbundle
#[derive(Error, Debug)]
pub enum Error {
    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The config file does not exist
    #[error("Cannot find config file at {}", .0.display())]
    ConfigNotFound(PathBuf),

    /// The config file exists but is not a valid manifest
    #[error("The config file is invalid:\n{0}")]
    InvalidConfig(String),

    /// A bundle requested on the command line is missing from the config
    #[error("Bundle {0} does not exist in config.")]
    NoSuchBundle(String),

    /// A bundle member references a bundle missing from the config
    #[error("There is no bundle called {0}")]
    UnknownBundle(String),

    /// A bundle member references a group pacman does not know about
    #[error("There is no group called {0}")]
    UnknownGroup(String),

    /// An external command exited unsuccessfully
    #[error("Command `{command}` failed: {status}")]
    CommandFailed { command: String, status: String },

    /// The local pacman database could not be read
    #[error("Malformed pacman database: {0}")]
    Database(String),

    /// $EDITOR is not set
    #[error("$EDITOR is not set")]
    EditorNotSet,

    /// The user declined a confirmation prompt
    #[error("Aborted!")]
    Aborted,
}

/// Result type alias using pacbundle's Error type
pub type Result<T> = std::result::Result<T, Error>;
