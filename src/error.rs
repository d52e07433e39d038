//! Error handling for prept.
//! Defines the error kinds surfaced by boilerplate loading, provider resolution,
//! variable resolution and project generation.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Every failure names the file, field or provider reference it concerns.
#[derive(Error, Debug)]
pub enum Error {
    /// The boilerplate directory has no configuration file.
    #[error("No boilerplate configuration found in '{}'.", .path.display())]
    ConfigNotFound { path: PathBuf },

    /// A configuration file is already present where a new one would be written.
    #[error("Configuration file '{}' already exists.", .path.display())]
    ConfigExists { path: PathBuf },

    /// The configuration file exists but is not well-formed JSON or YAML.
    #[error("Malformed configuration file '{}': {reason}.", .path.display())]
    InvalidSchema { path: PathBuf, reason: String },

    /// The configuration is well-formed but a field fails validation.
    #[error("Invalid configuration for '{field}': {reason}.")]
    InvalidConfig { field: String, reason: String },

    /// Neither path nor installed-name resolution found the boilerplate.
    #[error("Boilerplate '{identifier}' not found as a path or as an installed boilerplate.")]
    BoilerplateNotFound { identifier: String },

    #[error("Template provider '{reference}' not found: {reason}.")]
    TemplateProviderNotFound { reference: String, reason: String },

    /// Raised by a provider module's own resolver, e.g. a missing optional dependency.
    #[error("Template provider '{provider}' is unavailable: {reason}.")]
    ProviderUnavailable { provider: String, reason: String },

    /// A provider failed while transforming a path or content.
    #[error("Template provider '{provider}' failed: {reason}.")]
    ProviderError { provider: String, reason: String },

    #[error("Unknown template variables: {}. This boilerplate does not allow extra variables.", .names.join(", "))]
    ExtraVariables { names: Vec<String> },

    #[error("Rendered path '{path}' is not a valid relative path.")]
    InvalidRenderedPath { path: String },

    /// An I/O failure while generating files.
    #[error("{stage} failed for '{}': {source}.", .path.display())]
    GenerationError {
        stage: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The output directory exists and overwriting it was declined.
    #[error("Output directory '{output_dir}' already exists.")]
    OutputDirectoryExists { output_dir: String },

    /// Generating into the boilerplate itself would overwrite its sources.
    #[error("Output directory '{output_dir}' is the boilerplate directory.")]
    OutputIsBoilerplate { output_dir: String },

    #[error("Interrupted by user.")]
    Interrupted,

    #[error("Prompt error: {0}.")]
    PromptError(String),

    #[error("IO error: {0}.")]
    IoError(#[from] io::Error),
}

impl Error {
    /// Shorthand for [`Error::InvalidConfig`].
    pub fn invalid_config(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::InvalidConfig { field: field.into(), reason: reason.into() }
    }

    pub fn provider_not_found(reference: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::TemplateProviderNotFound { reference: reference.into(), reason: reason.into() }
    }
}

impl From<dialoguer::Error> for Error {
    fn from(err: dialoguer::Error) -> Self {
        match err {
            dialoguer::Error::IO(e) if e.kind() == io::ErrorKind::Interrupted => Error::Interrupted,
            #[allow(unreachable_patterns)]
            other => Error::PromptError(other.to_string()),
        }
    }
}

/// Convenience type alias for results carrying [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// Default error handler that prints the error and exits the program.
///
/// # Arguments
/// * `err` - The error to report
///
/// # Behavior
/// Prints the error message to stderr and exits with status code 1
pub fn default_error_handler(err: Error) {
    eprintln!("{err}");
    std::process::exit(1);
}
