//! Project generation.
//! Walks the boilerplate files, runs template providers over the template
//! files and writes the result into the output directory. A failed run leaves
//! the output directory as it was before the run.

use crate::config::BoilerplateConfig;
use crate::context::{GenerationContext, TemplateFile};
use crate::error::{Error, Result};
use crate::prompt::Prompter;
use crate::providers::{ProviderRegistry, TemplateProvider};
use crate::variables::resolve_variables;
use log::{debug, warn};
use std::fs::{self, File, FileTimes};
use std::io;
use std::path::{Component, Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Per-file progress of a generation or installation run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Progress<'a> {
    /// About to write `target` from `source`.
    Writing { source: &'a Path, target: &'a Path },
    /// `target` has been written.
    Written { target: &'a Path },
    /// `source` produced no output.
    Skipped { source: &'a Path, reason: &'a str },
}

/// Receives progress events for display.
pub trait Reporter {
    fn report(&self, event: Progress<'_>);
}

/// Prints progress to stdout.
#[derive(Debug, Default)]
pub struct ConsoleReporter;

impl Reporter for ConsoleReporter {
    fn report(&self, event: Progress<'_>) {
        match event {
            Progress::Writing { target, .. } => debug!("Writing '{}'", target.display()),
            Progress::Written { target } => println!("Created: '{}'", target.display()),
            Progress::Skipped { source, reason } => {
                println!("Skipped: '{}' ({reason})", source.display())
            }
        }
    }
}

/// Checks whether `output_dir` may be written to.
///
/// # Returns
/// * `Result<bool>` - Whether the directory already exists
///
/// # Errors
/// * `Error::OutputDirectoryExists` if it exists and overwriting is declined
pub fn ensure_output_dir<P: AsRef<Path>>(
    output_dir: P,
    prompt: &dyn Prompter,
    skip_overwrite_check: bool,
) -> Result<bool> {
    let output_dir = output_dir.as_ref();
    if !output_dir.exists() {
        return Ok(false);
    }

    let overwrite = prompt.confirm(
        skip_overwrite_check,
        format!(
            "Directory '{}' already exists. Content that can be overwritten will be lost. Proceed?",
            output_dir.display()
        ),
    )?;
    if !overwrite {
        return Err(Error::OutputDirectoryExists { output_dir: output_dir.display().to_string() });
    }
    Ok(true)
}

/// A change made inside a pre-existing output directory, undone on rollback.
#[derive(Debug)]
enum Change {
    CreatedDir(PathBuf),
    CreatedFile(PathBuf),
    Replaced { path: PathBuf, original: Vec<u8>, permissions: fs::Permissions },
}

impl Change {
    fn path(&self) -> &Path {
        match self {
            Change::CreatedDir(path) | Change::CreatedFile(path) => path,
            Change::Replaced { path, .. } => path,
        }
    }
}

/// Output directory of a run, restored on drop unless committed.
///
/// A directory created by this run is removed as a whole. Inside a directory
/// that already existed, every directory and file this run creates is removed
/// again and every file it overwrites gets its original content back. The
/// pre-existing directory itself is never removed.
#[derive(Debug)]
pub struct OutputDir {
    path: PathBuf,
    created: Option<PathBuf>,
    changes: Vec<Change>,
    committed: bool,
}

/// Topmost ancestor of `path` (or `path` itself) that does not exist yet.
fn topmost_missing(path: &Path) -> Option<PathBuf> {
    path.ancestors()
        .take_while(|dir| !dir.as_os_str().is_empty() && !dir.exists())
        .last()
        .map(Path::to_path_buf)
}

impl OutputDir {
    /// Opens `path`, creating it and any missing parents.
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let created = topmost_missing(&path);

        fs::create_dir_all(&path).map_err(|source| Error::GenerationError {
            stage: "Creating output directory",
            path: path.clone(),
            source,
        })?;
        if created.is_some() {
            debug!("Created output directory '{}'", path.display());
        }

        Ok(Self { path, created, changes: Vec::new(), committed: false })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether this run created the directory.
    pub fn is_created(&self) -> bool {
        self.created.is_some()
    }

    /// Creates `dir` and its missing parents, remembering what was created.
    pub fn create_dir_all(&mut self, dir: &Path) -> Result<()> {
        let missing = topmost_missing(dir);
        fs::create_dir_all(dir).map_err(|source| Error::GenerationError {
            stage: "Creating directory",
            path: dir.to_path_buf(),
            source,
        })?;
        if let (None, Some(missing)) = (&self.created, missing) {
            self.changes.push(Change::CreatedDir(missing));
        }
        Ok(())
    }

    /// Records the state of `target` before it is written.
    ///
    /// Must be called before every write into the directory.
    pub fn track_file(&mut self, target: &Path) -> Result<()> {
        if self.created.is_some() {
            return Ok(());
        }
        let backup_error = |source: io::Error| Error::GenerationError {
            stage: "Backing up file",
            path: target.to_path_buf(),
            source,
        };

        match fs::metadata(target) {
            Ok(metadata) if metadata.is_file() => {
                let original = fs::read(target).map_err(backup_error)?;
                self.changes.push(Change::Replaced {
                    path: target.to_path_buf(),
                    original,
                    permissions: metadata.permissions(),
                });
            }
            // Writing over a directory fails on its own.
            Ok(_) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                self.changes.push(Change::CreatedFile(target.to_path_buf()));
            }
            Err(e) => return Err(backup_error(e)),
        }
        Ok(())
    }

    /// Keeps the directory.
    pub fn commit(mut self) -> PathBuf {
        self.committed = true;
        std::mem::take(&mut self.path)
    }

    fn undo(change: &Change) -> io::Result<()> {
        match change {
            Change::CreatedDir(dir) => fs::remove_dir_all(dir),
            Change::CreatedFile(file) => match fs::remove_file(file) {
                Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
                other => other,
            },
            Change::Replaced { path, original, permissions } => {
                fs::write(path, original)?;
                fs::set_permissions(path, permissions.clone())
            }
        }
    }
}

impl Drop for OutputDir {
    fn drop(&mut self) {
        if self.committed {
            return;
        }
        if let Some(created) = &self.created {
            debug!("Rolling back output directory '{}'", created.display());
            if let Err(e) = fs::remove_dir_all(created) {
                warn!("Failed to remove '{}': {e}", created.display());
            }
            return;
        }

        debug!("Restoring output directory '{}'", self.path.display());
        for change in self.changes.iter().rev() {
            if let Err(e) = Self::undo(change) {
                warn!("Failed to restore '{}': {e}", change.path().display());
            }
        }
    }
}

/// Whether both paths exist and point at the same directory.
pub(crate) fn same_dir(a: &Path, b: &Path) -> bool {
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

/// Validates a path rendered by a provider: relative, no empty segments and
/// no parent directory components.
pub fn is_rendered_path_valid(path: &str) -> bool {
    !path.is_empty()
        && !path.contains("//")
        && Path::new(path)
            .components()
            .all(|component| matches!(component, Component::Normal(_) | Component::CurDir))
}

/// Copies `source` to `target`, keeping permissions and timestamps.
pub fn copy_file<P: AsRef<Path>, Q: AsRef<Path>>(source: P, target: Q) -> io::Result<()> {
    let (source, target) = (source.as_ref(), target.as_ref());
    fs::copy(source, target)?;

    let metadata = fs::metadata(source)?;
    let mut times = FileTimes::new();
    if let Ok(accessed) = metadata.accessed() {
        times = times.set_accessed(accessed);
    }
    if let Ok(modified) = metadata.modified() {
        times = times.set_modified(modified);
    }
    File::options().write(true).open(target)?.set_times(times)
}

/// Generates a project from a boilerplate.
pub struct Processor<'a> {
    config: &'a BoilerplateConfig,
    registry: &'a ProviderRegistry,
    prompt: &'a dyn Prompter,
    reporter: &'a dyn Reporter,
    skip_overwrite_check: bool,
    interrupted: Option<Arc<AtomicBool>>,
}

impl<'a> Processor<'a> {
    pub fn new(
        config: &'a BoilerplateConfig,
        registry: &'a ProviderRegistry,
        prompt: &'a dyn Prompter,
        reporter: &'a dyn Reporter,
    ) -> Self {
        Self {
            config,
            registry,
            prompt,
            reporter,
            skip_overwrite_check: false,
            interrupted: None,
        }
    }

    /// Overwrites an existing output directory without asking.
    pub fn skip_overwrite_check(mut self, skip: bool) -> Self {
        self.skip_overwrite_check = skip;
        self
    }

    /// Flag checked before every file; once set the run is aborted.
    pub fn interrupt_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.interrupted = Some(flag);
        self
    }

    fn check_interrupted(&self) -> Result<()> {
        match &self.interrupted {
            Some(flag) if flag.load(Ordering::SeqCst) => Err(Error::Interrupted),
            _ => Ok(()),
        }
    }

    /// Runs the generation.
    ///
    /// The provider is resolved and variables are collected before anything
    /// is written. Then every generated file is copied and, when it matches
    /// the template patterns, transformed. Any failure restores the output
    /// directory to its state before the run.
    ///
    /// # Arguments
    /// * `output` - Output directory; defaults to the boilerplate's
    /// * `variables` - Variables supplied on invocation, in order
    ///
    /// # Returns
    /// * `Result<PathBuf>` - The output directory
    ///
    /// # Errors
    /// * `Error::OutputIsBoilerplate` if the output is the boilerplate directory
    pub fn generate(&self, output: Option<&Path>, variables: &[(String, String)]) -> Result<PathBuf> {
        let provider = self
            .config
            .template_provider()
            .map(|reference| self.registry.resolve(reference).map(|handle| handle.create()))
            .transpose()?;

        let output = output
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from(self.config.default_generate_directory()));
        if same_dir(&output, self.config.path()) {
            return Err(Error::OutputIsBoilerplate { output_dir: output.display().to_string() });
        }
        ensure_output_dir(&output, self.prompt, self.skip_overwrite_check)?;

        let variables = resolve_variables(
            self.config.template_variables(),
            variables,
            self.config.allow_extra_variables(),
            self.prompt,
        )?;
        let files = self.config.generated_files()?;
        self.check_interrupted()?;

        let mut output_dir = OutputDir::create(&output)?;
        let mut context = GenerationContext::new(output_dir.path(), variables);

        for relative in &files {
            self.check_interrupted()?;
            self.process_file(provider.as_deref(), &mut output_dir, &mut context, relative)?;
        }

        Ok(output_dir.commit())
    }

    fn process_file(
        &self,
        provider: Option<&dyn TemplateProvider>,
        output_dir: &mut OutputDir,
        context: &mut GenerationContext,
        relative: &Path,
    ) -> Result<()> {
        let source = self.config.path().join(relative);
        let file = TemplateFile::new(relative, &source);
        context.set_current_file(file.clone());

        let provider = provider.filter(|_| self.config.is_template(relative));
        let target_relative = match provider {
            Some(provider) => {
                let rendered = provider
                    .transform_path(relative, context)
                    .map_err(|e| with_file(e, relative))?;
                let rendered = rendered.to_string_lossy().into_owned();
                if rendered.trim().is_empty() {
                    self.reporter.report(Progress::Skipped {
                        source: relative,
                        reason: "rendered path is empty",
                    });
                    return Ok(());
                }
                if !is_rendered_path_valid(&rendered) {
                    return Err(Error::InvalidRenderedPath { path: rendered });
                }
                PathBuf::from(rendered)
            }
            None => relative.to_path_buf(),
        };

        let target = context.output_dir().join(&target_relative);
        self.reporter.report(Progress::Writing { source: &source, target: &target });

        if let Some(parent) = target.parent() {
            output_dir.create_dir_all(parent)?;
        }
        output_dir.track_file(&target)?;
        copy_file(&source, &target).map_err(|e| Error::GenerationError {
            stage: "Copying file",
            path: target.clone(),
            source: e,
        })?;

        if let Some(provider) = provider {
            let content =
                provider.transform_content(&file, context).map_err(|e| with_file(e, relative))?;

            fs::write(&target, content.as_bytes()).map_err(|e| Error::GenerationError {
                stage: "Writing template",
                path: target.clone(),
                source: e,
            })?;
        }

        self.reporter.report(Progress::Written { target: &target });
        Ok(())
    }
}

/// Adds the file being processed to provider failures.
fn with_file(err: Error, relative: &Path) -> Error {
    match err {
        Error::ProviderError { provider, reason } => Error::ProviderError {
            provider,
            reason: format!("while processing '{}': {reason}", relative.display()),
        },
        other => other,
    }
}
