//! Per-invocation generation state handed to template providers.

use indexmap::IndexMap;
use std::io;
use std::path::{Path, PathBuf};

/// A boilerplate file being generated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateFile {
    name: String,
    relative: PathBuf,
    path: PathBuf,
}

impl TemplateFile {
    /// # Arguments
    /// * `relative` - Path relative to the boilerplate directory
    /// * `path` - Full path of the source file
    pub fn new<R: Into<PathBuf>, P: Into<PathBuf>>(relative: R, path: P) -> Self {
        let relative = relative.into();
        let name = relative
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self { name, relative, path: path.into() }
    }

    /// File name without directories.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn relative(&self) -> &Path {
        &self.relative
    }

    /// Source path inside the boilerplate.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the original (untransformed) content of the file.
    pub fn read(&self) -> io::Result<Vec<u8>> {
        std::fs::read(&self.path)
    }
}

/// State of one generation run. Created once variables are resolved and
/// dropped when the run ends; never persisted.
#[derive(Debug, Clone)]
pub struct GenerationContext {
    output_dir: PathBuf,
    variables: IndexMap<String, String>,
    current_file: Option<TemplateFile>,
}

impl GenerationContext {
    pub fn new<P: Into<PathBuf>>(output_dir: P, variables: IndexMap<String, String>) -> Self {
        Self { output_dir: output_dir.into(), variables, current_file: None }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn variables(&self) -> &IndexMap<String, String> {
        &self.variables
    }

    /// The file currently being processed, if generation has started.
    pub fn current_file(&self) -> Option<&TemplateFile> {
        self.current_file.as_ref()
    }

    pub(crate) fn set_current_file(&mut self, file: TemplateFile) {
        self.current_file = Some(file);
    }
}
