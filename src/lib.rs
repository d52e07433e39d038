//! prept generates projects from reusable boilerplates.
//! A boilerplate is a directory with a `preptconfig` file declaring its name,
//! ignored paths, template files, template provider and variables.

/// Command-line interface module for the prept application
pub mod cli;

/// Boilerplate configuration loading, validation and serialization
/// Supports JSON and YAML formats (preptconfig.json, preptconfig.yml, preptconfig.yaml)
pub mod config;

pub mod constants;

/// Generation state passed to template providers
pub mod context;

/// Error types and handling for the prept application
pub mod error;

/// Global installation of boilerplates
pub mod install;

pub mod logger;

/// Gitignore-style path matching
pub mod matcher;

/// Project generation with rollback of the output directory
pub mod processor;

/// User input and interaction handling
pub mod prompt;

/// Template providers and provider resolution
pub mod providers;

/// Template variable declarations and resolution
pub mod variables;
