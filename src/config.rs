//! Boilerplate configuration handling.
//! Loads, validates and serializes the `preptconfig` schema of a boilerplate
//! directory. Supports JSON and YAML (preptconfig.json, preptconfig.yml,
//! preptconfig.yaml).

use crate::constants::CONFIG_FILES;
use crate::error::{Error, Result};
use crate::install::InstallRoot;
use crate::matcher::PathMatcher;
use crate::variables::VariableSpec;
use indexmap::IndexMap;
use log::{debug, warn};
use regex::Regex;
use semver::Version;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

static BOILERPLATE_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_-]*$").expect("valid regex"));

const KNOWN_FIELDS: [&str; 9] = [
    "name",
    "summary",
    "version",
    "ignore_paths",
    "default_generate_directory",
    "template_provider",
    "template_files",
    "template_variables",
    "allow_extra_variables",
];

/// Returns true if `name` is a valid boilerplate name.
pub fn is_valid_name(name: &str) -> bool {
    BOILERPLATE_NAME.is_match(name)
}

/// Finds the configuration file of a boilerplate directory.
///
/// # Arguments
/// * `dir` - Boilerplate directory
///
/// # Returns
/// * `Option<PathBuf>` - The first of [`CONFIG_FILES`] that exists
pub fn find_config_file<P: AsRef<Path>>(dir: P) -> Option<PathBuf> {
    CONFIG_FILES.iter().map(|file| dir.as_ref().join(file)).find(|path| path.is_file())
}

/// Parses configuration content, trying JSON first and YAML second.
fn parse_content(content: &str) -> std::result::Result<IndexMap<String, Value>, String> {
    match serde_json::from_str(content) {
        Ok(data) => Ok(data),
        Err(json_err) => serde_yaml::from_str(content)
            .map_err(|yaml_err| format!("not valid JSON ({json_err}) or YAML ({yaml_err})")),
    }
}

fn optional_string(data: &IndexMap<String, Value>, field: &str) -> Result<Option<String>> {
    match data.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(_) => Err(Error::invalid_config(field, "must be a string")),
    }
}

fn string_list(data: &IndexMap<String, Value>, field: &str) -> Result<Vec<String>> {
    match data.get(field) {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| match item {
                Value::String(s) => Ok(s.clone()),
                _ => Err(Error::invalid_config(field, "cannot contain non-string entries")),
            })
            .collect(),
        Some(_) => Err(Error::invalid_config(field, "must be a list of strings")),
    }
}

/// Configuration of one boilerplate directory.
///
/// Instances are validated on construction and never cached: every load reads
/// and validates the file again.
#[derive(Debug, Clone)]
pub struct BoilerplateConfig {
    path: PathBuf,
    config_file: PathBuf,
    name: String,
    summary: Option<String>,
    version: Option<Version>,
    ignore_paths: Vec<String>,
    default_generate_directory: Option<String>,
    template_provider: Option<String>,
    template_files: Vec<String>,
    template_variables: IndexMap<String, VariableSpec>,
    allow_extra_variables: bool,
    ignore_matcher: PathMatcher,
    template_matcher: PathMatcher,
}

impl BoilerplateConfig {
    /// Creates a configuration with only a name, for a boilerplate at `path`.
    ///
    /// # Errors
    /// * `Error::InvalidConfig` on `name` if the name is invalid
    pub fn new<P: AsRef<Path>>(path: P, name: &str) -> Result<Self> {
        let mut data = IndexMap::new();
        data.insert("name".to_string(), Value::String(name.to_string()));
        Self::from_data(path.as_ref(), path.as_ref().join(CONFIG_FILES[0]), &data)
    }

    pub fn with_summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = Some(summary.into());
        self
    }

    /// Loads the configuration of the boilerplate at `path`.
    ///
    /// `path` is either the boilerplate directory or its configuration file.
    ///
    /// # Errors
    /// * `Error::ConfigNotFound` if no configuration file exists
    /// * `Error::InvalidSchema` if the file is not well-formed
    /// * `Error::InvalidConfig` naming the first field that fails validation
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let (root, config_file) = if path.is_file() {
            let root = path
                .parent()
                .filter(|parent| !parent.as_os_str().is_empty())
                .unwrap_or(Path::new("."));
            (root.to_path_buf(), path.to_path_buf())
        } else {
            let config_file = find_config_file(path)
                .ok_or_else(|| Error::ConfigNotFound { path: path.to_path_buf() })?;
            (path.to_path_buf(), config_file)
        };

        debug!("Loading configuration from {}", config_file.display());
        let content = std::fs::read_to_string(&config_file)?;
        let data = parse_content(&content)
            .map_err(|reason| Error::InvalidSchema { path: config_file.clone(), reason })?;

        Self::from_data(&root, config_file, &data)
    }

    /// Resolves a boilerplate from a path or an installed boilerplate name.
    ///
    /// A path is tried first. If it has no configuration file, the identifier
    /// is looked up by name in `install_root`. A configuration that exists but
    /// is invalid is reported right away instead of falling through.
    ///
    /// # Errors
    /// * `Error::BoilerplateNotFound` if neither lookup finds a boilerplate
    /// * Validation errors from [`BoilerplateConfig::load`]
    pub fn resolve(identifier: &str, install_root: &InstallRoot) -> Result<Self> {
        let path = Path::new(identifier);
        if path.exists() {
            match Self::load(path) {
                Ok(config) => return Ok(config),
                Err(Error::ConfigNotFound { .. }) => {
                    debug!("No configuration at path '{identifier}', trying installed boilerplates")
                }
                Err(e) => return Err(e),
            }
        }
        Self::from_installation(identifier, install_root)
    }

    /// Loads an installed boilerplate by name (case-insensitive).
    pub fn from_installation(name: &str, install_root: &InstallRoot) -> Result<Self> {
        if !is_valid_name(name) {
            return Err(Error::BoilerplateNotFound { identifier: name.to_string() });
        }
        let dir = install_root.boilerplate_dir(name);
        if !dir.is_dir() {
            return Err(Error::BoilerplateNotFound { identifier: name.to_string() });
        }
        Self::load(dir)
    }

    fn from_data(root: &Path, config_file: PathBuf, data: &IndexMap<String, Value>) -> Result<Self> {
        for key in data.keys() {
            if !KNOWN_FIELDS.contains(&key.as_str()) {
                warn!("Ignoring unknown configuration field '{key}' in {}", config_file.display());
            }
        }

        let name = match data.get("name") {
            None | Some(Value::Null) => {
                return Err(Error::invalid_config("name", "missing required field"))
            }
            Some(Value::String(name)) => name.clone(),
            Some(_) => return Err(Error::invalid_config("name", "must be a string")),
        };
        if !is_valid_name(&name) {
            return Err(Error::invalid_config(
                "name",
                format!("'{name}' is not a valid boilerplate name"),
            ));
        }

        let summary = optional_string(data, "summary")?;
        let version = optional_string(data, "version")?
            .map(|version| {
                Version::parse(&version).map_err(|e| {
                    Error::invalid_config(
                        "version",
                        format!("'{version}' is not a valid semantic version: {e}"),
                    )
                })
            })
            .transpose()?;
        let ignore_paths = string_list(data, "ignore_paths")?;
        let default_generate_directory = optional_string(data, "default_generate_directory")?;
        let template_provider = optional_string(data, "template_provider")?;
        let template_files = string_list(data, "template_files")?;

        let template_variables = match data.get("template_variables") {
            None | Some(Value::Null) => IndexMap::new(),
            Some(Value::Object(vars)) => vars
                .iter()
                .map(|(name, value)| Ok((name.clone(), VariableSpec::from_value(name, value)?)))
                .collect::<Result<IndexMap<_, _>>>()?,
            Some(_) => return Err(Error::invalid_config("template_variables", "must be a mapping")),
        };

        let allow_extra_variables = match data.get("allow_extra_variables") {
            None | Some(Value::Null) => false,
            Some(Value::Bool(b)) => *b,
            Some(_) => return Err(Error::invalid_config("allow_extra_variables", "must be a boolean")),
        };

        // Schema files never land in generated projects.
        let mut excluded = ignore_paths.clone();
        excluded.extend(CONFIG_FILES.iter().map(|file| format!("/{file}")));
        if let Some(file_name) = config_file.file_name() {
            excluded.push(format!("/{}", file_name.to_string_lossy()));
        }
        let ignore_matcher = PathMatcher::new(root, "ignore_paths", &excluded)?;
        let template_matcher = PathMatcher::new(root, "template_files", &template_files)?;

        Ok(Self {
            path: root.to_path_buf(),
            config_file,
            name,
            summary,
            version,
            ignore_paths,
            default_generate_directory,
            template_provider,
            template_files,
            template_variables,
            allow_extra_variables,
            ignore_matcher,
            template_matcher,
        })
    }

    /// Serializes the fields that differ from their defaults back into the
    /// configuration schema shape.
    pub fn dump(&self) -> IndexMap<String, Value> {
        let mut data = IndexMap::new();
        data.insert("name".to_string(), Value::String(self.name.clone()));

        if let Some(summary) = &self.summary {
            data.insert("summary".to_string(), Value::String(summary.clone()));
        }
        if let Some(version) = &self.version {
            data.insert("version".to_string(), Value::String(version.to_string()));
        }
        if !self.ignore_paths.is_empty() {
            data.insert("ignore_paths".to_string(), self.ignore_paths.clone().into());
        }
        if let Some(dir) = &self.default_generate_directory {
            data.insert("default_generate_directory".to_string(), Value::String(dir.clone()));
        }
        if let Some(provider) = &self.template_provider {
            data.insert("template_provider".to_string(), Value::String(provider.clone()));
        }
        if !self.template_files.is_empty() {
            data.insert("template_files".to_string(), self.template_files.clone().into());
        }
        if !self.template_variables.is_empty() {
            let vars = self
                .template_variables
                .iter()
                .map(|(name, spec)| (name.clone(), spec.dump()))
                .collect();
            data.insert("template_variables".to_string(), Value::Object(vars));
        }
        if self.allow_extra_variables {
            data.insert("allow_extra_variables".to_string(), Value::Bool(true));
        }

        data
    }

    /// Writes [`BoilerplateConfig::dump`] to the configuration file, as YAML
    /// when the file has a YAML extension and as JSON otherwise.
    pub fn save(&self) -> Result<()> {
        let data = self.dump();
        let is_yaml = self
            .config_file
            .extension()
            .is_some_and(|ext| ext == "yml" || ext == "yaml");
        let content = if is_yaml {
            serde_yaml::to_string(&data).map_err(|e| Error::InvalidSchema {
                path: self.config_file.clone(),
                reason: e.to_string(),
            })?
        } else {
            let mut content = serde_json::to_string_pretty(&data).map_err(|e| {
                Error::InvalidSchema { path: self.config_file.clone(), reason: e.to_string() }
            })?;
            content.push('\n');
            content
        };
        std::fs::write(&self.config_file, content).map_err(|source| Error::GenerationError {
            stage: "Writing configuration",
            path: self.config_file.clone(),
            source,
        })
    }

    /// Files generated from this boilerplate: everything except ignored paths
    /// and the configuration files, in a stable order.
    pub fn generated_files(&self) -> Result<Vec<PathBuf>> {
        self.ignore_matcher.included_files(&self.path)
    }

    /// Files copied on installation: every file of the boilerplate.
    pub fn installation_files(&self) -> Result<Vec<PathBuf>> {
        PathMatcher::new::<_, &str>(&self.path, "ignore_paths", &[])?.included_files(&self.path)
    }

    /// Returns true if the relative path is matched by `template_files`.
    pub fn is_template<P: AsRef<Path>>(&self, relative: P) -> bool {
        self.template_matcher.is_match(relative, false)
    }

    /// The boilerplate directory.
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn config_file(&self) -> &Path {
        &self.config_file
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn summary(&self) -> Option<&str> {
        self.summary.as_deref()
    }

    pub fn version(&self) -> Option<&Version> {
        self.version.as_ref()
    }

    pub fn ignore_paths(&self) -> &[String] {
        &self.ignore_paths
    }

    /// Directory generated into when no output directory is given; falls back
    /// to the boilerplate name.
    pub fn default_generate_directory(&self) -> &str {
        self.default_generate_directory.as_deref().unwrap_or(&self.name)
    }

    pub fn template_provider(&self) -> Option<&str> {
        self.template_provider.as_deref()
    }

    pub fn template_files(&self) -> &[String] {
        &self.template_files
    }

    pub fn template_variables(&self) -> &IndexMap<String, VariableSpec> {
        &self.template_variables
    }

    pub fn allow_extra_variables(&self) -> bool {
        self.allow_extra_variables
    }
}
