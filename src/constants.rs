//! Common constants used throughout prept.

/// Supported boilerplate configuration file names, tried in order
pub const CONFIG_FILES: [&str; 3] = ["preptconfig.json", "preptconfig.yml", "preptconfig.yaml"];

/// Module name of the built-in template providers
pub const BUILTIN_PROVIDER_MODULE: &str = "prept";

/// Separator between a provider module and a provider name
pub const PROVIDER_SEPARATOR: &str = "::";

/// Environment variable overriding the installation root
pub const HOME_ENV: &str = "PREPT_HOME";

/// Subdirectory of the installation root holding installed boilerplates
pub const BOILERPLATES_DIR: &str = "boilerplates";

/// Subdirectory of the installation root holding external provider modules
pub const PROVIDERS_DIR: &str = "providers";

/// Prefix of provider module executables looked up on `PATH`
pub const PROVIDER_EXECUTABLE_PREFIX: &str = "prept-";
