//! Template providers and their resolution.
//!
//! A provider reference is either `provider` (a built-in provider) or
//! `module::provider`, where `module` is a provider module registered in
//! process or an external executable module. Modules expose providers through
//! a resolver entry point or, without one, through named exports. Whatever a
//! module hands back must carry the provider capability marker to be used.

pub mod command;
#[cfg(feature = "jinja")]
pub mod jinja;
pub mod string;

use crate::constants::{BUILTIN_PROVIDER_MODULE, PROVIDER_SEPARATOR};
use crate::context::{GenerationContext, TemplateFile};
use crate::error::{Error, Result};
use crate::install::InstallRoot;
use command::CommandModule;
use indexmap::IndexMap;
use log::debug;
use std::fmt;
use std::path::{Path, PathBuf};
use std::rc::Rc;

/// Value of the capability marker carried by every provider export.
pub const PROVIDER_MARKER: u64 = 1;

/// Transformed file content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Content {
    Text(String),
    Binary(Vec<u8>),
}

impl Content {
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Content::Text(text) => text.as_bytes(),
            Content::Binary(bytes) => bytes,
        }
    }
}

/// Transforms boilerplate file paths and content at generation time.
pub trait TemplateProvider {
    fn name(&self) -> &str;

    /// Rewrites a path relative to the output directory. An empty result
    /// means the file is skipped.
    fn transform_path(&self, path: &Path, context: &GenerationContext) -> Result<PathBuf>;

    /// Produces the content written for `file`.
    fn transform_content(&self, file: &TemplateFile, context: &GenerationContext)
        -> Result<Content>;
}

pub type ProviderFactory = Rc<dyn Fn() -> Box<dyn TemplateProvider>>;

/// Something a provider module exposes under a name.
#[derive(Clone)]
pub struct Export {
    name: String,
    marker: Option<u64>,
    factory: Option<ProviderFactory>,
}

impl Export {
    /// A provider export carrying the capability marker.
    pub fn provider<F>(name: impl Into<String>, factory: F) -> Self
    where
        F: Fn() -> Box<dyn TemplateProvider> + 'static,
    {
        Self { name: name.into(), marker: Some(PROVIDER_MARKER), factory: Some(Rc::new(factory)) }
    }

    /// An export with an arbitrary marker, as declared by an external module.
    pub fn with_marker(name: impl Into<String>, marker: Option<u64>, factory: ProviderFactory) -> Self {
        Self { name: name.into(), marker, factory: Some(factory) }
    }

    /// An export that is not a provider.
    pub fn value(name: impl Into<String>) -> Self {
        Self { name: name.into(), marker: None, factory: None }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Checks the capability marker and returns a usable provider handle.
    fn into_handle(self) -> Option<ProviderHandle> {
        match (self.marker, self.factory) {
            (Some(PROVIDER_MARKER), Some(factory)) => Some(ProviderHandle { name: self.name, factory }),
            _ => None,
        }
    }
}

impl fmt::Debug for Export {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Export")
            .field("name", &self.name)
            .field("marker", &self.marker)
            .field("factory", &self.factory.is_some())
            .finish()
    }
}

/// A resolved provider, ready to be instantiated.
#[derive(Clone)]
pub struct ProviderHandle {
    name: String,
    factory: ProviderFactory,
}

impl ProviderHandle {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn create(&self) -> Box<dyn TemplateProvider> {
        (self.factory)()
    }
}

impl fmt::Debug for ProviderHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderHandle").field("name", &self.name).finish()
    }
}

/// A unit that provides template providers.
pub trait ProviderModule {
    /// Whether the module has a resolver entry point. Modules without one are
    /// searched by export name instead.
    fn has_resolver(&self) -> bool {
        false
    }

    /// Resolves a bare provider name. May fail with a user-facing
    /// `Error::ProviderUnavailable`, which is reported as is.
    fn resolve(&self, _name: &str) -> Result<Option<Export>> {
        Ok(None)
    }

    /// Looks up an export by its exact name.
    fn export(&self, name: &str) -> Option<Export>;
}

/// The module holding prept's own providers.
#[derive(Debug, Default)]
pub struct BuiltinModule;

impl ProviderModule for BuiltinModule {
    fn has_resolver(&self) -> bool {
        true
    }

    fn resolve(&self, name: &str) -> Result<Option<Export>> {
        match name {
            string::NAME | "string-template" => self.resolve(string::EXPORT),
            "jinja" | "minijinja" => self.resolve("MiniJinjaTemplateProvider"),
            #[cfg(not(feature = "jinja"))]
            "MiniJinjaTemplateProvider" => Err(Error::ProviderUnavailable {
                provider: name.to_string(),
                reason: "optional dependency minijinja is not installed, \
                         rebuild prept with the `jinja` feature"
                    .to_string(),
            }),
            other => Ok(self.export(other)),
        }
    }

    fn export(&self, name: &str) -> Option<Export> {
        match name {
            string::EXPORT => Some(Export::provider(string::NAME, || {
                Box::new(string::StringTemplateProvider::new())
            })),
            #[cfg(feature = "jinja")]
            jinja::EXPORT => Some(Export::provider(jinja::NAME, || {
                Box::new(jinja::MiniJinjaTemplateProvider::new())
            })),
            _ => None,
        }
    }
}

/// Resolves provider references to providers.
pub struct ProviderRegistry {
    modules: IndexMap<String, Rc<dyn ProviderModule>>,
    search_dirs: Vec<PathBuf>,
    search_path: bool,
}

impl Default for ProviderRegistry {
    fn default() -> Self {
        ProviderRegistry::new()
    }
}

impl ProviderRegistry {
    /// A registry with only the built-in module; external modules are not
    /// searched for.
    pub fn new() -> Self {
        let mut modules: IndexMap<String, Rc<dyn ProviderModule>> = IndexMap::new();
        modules.insert(BUILTIN_PROVIDER_MODULE.to_string(), Rc::new(BuiltinModule));
        Self { modules, search_dirs: Vec::new(), search_path: false }
    }

    /// A registry that also finds external modules in the installation root
    /// and on `PATH`.
    pub fn with_install_root(install_root: &InstallRoot) -> Self {
        let mut registry = Self::new();
        registry.search_dirs.push(install_root.providers_dir());
        registry.search_path = true;
        registry
    }

    /// Adds a directory searched for external module executables.
    pub fn add_search_dir<P: Into<PathBuf>>(&mut self, dir: P) {
        self.search_dirs.push(dir.into());
    }

    /// Registers an in-process module. Replaces a module of the same name.
    pub fn register<M: ProviderModule + 'static>(&mut self, name: impl Into<String>, module: M) {
        self.modules.insert(name.into(), Rc::new(module));
    }

    fn find_module(&self, name: &str, reference: &str) -> Result<Rc<dyn ProviderModule>> {
        if let Some(module) = self.modules.get(name) {
            return Ok(Rc::clone(module));
        }

        let program = CommandModule::locate(name, &self.search_dirs, self.search_path)
            .ok_or_else(|| Error::provider_not_found(reference, format!("module '{name}' not found")))?;
        debug!("Loading provider module '{name}' from {}", program.display());

        let module = CommandModule::load(program).map_err(|e| {
            Error::provider_not_found(reference, format!("module '{name}' failed to load: {e}"))
        })?;
        Ok(Rc::new(module))
    }

    /// Resolves a provider reference.
    ///
    /// # Errors
    /// * `Error::TemplateProviderNotFound` if the reference is malformed, the
    ///   module cannot be found or loaded, or it exposes no valid provider
    ///   under that name
    /// * `Error::ProviderUnavailable` raised by the module's own resolver
    pub fn resolve(&self, reference: &str) -> Result<ProviderHandle> {
        let parts: Vec<&str> = reference.split(PROVIDER_SEPARATOR).collect();
        let (module_name, provider_name) = match parts.as_slice() {
            [provider] => (BUILTIN_PROVIDER_MODULE, provider.trim()),
            [module, provider] if module.trim().is_empty() => {
                (BUILTIN_PROVIDER_MODULE, provider.trim())
            }
            [module, provider] => (module.trim(), provider.trim()),
            _ => return Err(Error::provider_not_found(reference, "too many separators")),
        };
        if provider_name.is_empty() {
            return Err(Error::provider_not_found(reference, "empty provider name"));
        }

        let module = self.find_module(module_name, reference)?;

        let export = if module.has_resolver() {
            match module.resolve(provider_name) {
                Ok(export) => export,
                Err(e @ Error::ProviderUnavailable { .. }) => return Err(e),
                Err(Error::TemplateProviderNotFound { reason, .. }) => {
                    return Err(Error::provider_not_found(reference, reason))
                }
                Err(e) => {
                    return Err(Error::provider_not_found(reference, format!("resolver failed: {e}")))
                }
            }
        } else {
            module.export(provider_name)
        };

        let export = export.ok_or_else(|| {
            Error::provider_not_found(
                reference,
                format!("module '{module_name}' has no provider named '{provider_name}'"),
            )
        })?;
        debug!("Resolved provider reference '{reference}' to export '{}'", export.name());

        export
            .into_handle()
            .ok_or_else(|| Error::provider_not_found(reference, "not a valid provider"))
    }
}
