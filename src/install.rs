//! Global boilerplate installation.

use crate::config::BoilerplateConfig;
use crate::constants::{BOILERPLATES_DIR, PROVIDERS_DIR};
use crate::error::{Error, Result};
use crate::processor::{copy_file, same_dir, OutputDir, Progress, Reporter};
use crate::prompt::Prompter;
use log::{debug, warn};
use std::io;
use std::path::{Path, PathBuf};

/// Directory holding installed boilerplates and external provider modules.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallRoot {
    path: PathBuf,
}

impl InstallRoot {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }

    /// Uses `path` when given, the platform data directory otherwise.
    pub fn from_override(path: Option<PathBuf>) -> Result<Self> {
        match path {
            Some(path) => Ok(Self::new(path)),
            None => dirs::data_dir().map(|dir| Self::new(dir.join("prept"))).ok_or_else(|| {
                Error::IoError(io::Error::new(
                    io::ErrorKind::NotFound,
                    "could not determine the installation root, pass --home",
                ))
            }),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Directory of the installed boilerplate `name`; names are case-insensitive.
    pub fn boilerplate_dir(&self, name: &str) -> PathBuf {
        self.path.join(BOILERPLATES_DIR).join(name.to_lowercase())
    }

    pub fn providers_dir(&self) -> PathBuf {
        self.path.join(PROVIDERS_DIR)
    }
}

/// Installs a boilerplate into `install_root`.
///
/// Every file of the boilerplate is copied, including ignored paths and the
/// configuration file. If a boilerplate with the same name is installed, the
/// user is asked before it is overwritten.
///
/// # Returns
/// * `Result<Option<PathBuf>>` - The installation directory, or `None` if
///   overwriting was declined
pub fn install(
    boilerplate: &BoilerplateConfig,
    install_root: &InstallRoot,
    prompt: &dyn Prompter,
    skip_overwrite_check: bool,
    reporter: &dyn Reporter,
) -> Result<Option<PathBuf>> {
    let target = install_root.boilerplate_dir(boilerplate.name());

    if target.exists() {
        let installed = match BoilerplateConfig::load(&target) {
            Ok(installed) => installed.version().map(ToString::to_string),
            Err(e) => {
                warn!("Existing installation at '{}' is unreadable: {e}", target.display());
                None
            }
        };
        let message = format!(
            "Boilerplate '{}' is already installed (installed: {}, installing: {}). Overwrite?",
            boilerplate.name(),
            installed.as_deref().unwrap_or("N/A"),
            boilerplate.version().map(ToString::to_string).as_deref().unwrap_or("N/A"),
        );
        if !prompt.confirm(skip_overwrite_check, message)? {
            debug!("Installation of '{}' declined", boilerplate.name());
            return Ok(None);
        }
        if same_dir(boilerplate.path(), &target) {
            debug!("'{}' is already the installed copy", target.display());
            return Ok(Some(target));
        }
    }

    let files = boilerplate.installation_files()?;
    let mut output = OutputDir::create(&target)?;

    for relative in &files {
        let source = boilerplate.path().join(relative);
        let destination = output.path().join(relative);
        reporter.report(Progress::Writing { source: &source, target: &destination });

        if let Some(parent) = destination.parent() {
            output.create_dir_all(parent)?;
        }
        output.track_file(&destination)?;
        copy_file(&source, &destination).map_err(|e| Error::GenerationError {
            stage: "Installing file",
            path: destination.clone(),
            source: e,
        })?;
        reporter.report(Progress::Written { target: &destination });
    }

    Ok(Some(output.commit()))
}
