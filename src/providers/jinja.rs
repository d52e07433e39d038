//! MiniJinja-backed provider. Undefined variables follow MiniJinja's own
//! default behavior.

use super::{Content, TemplateProvider};
use crate::context::{GenerationContext, TemplateFile};
use crate::error::{Error, Result};
use cruet::Inflector;
use minijinja::Environment;
use std::path::{Path, PathBuf};

pub const NAME: &str = "minijinja";
pub const EXPORT: &str = "MiniJinjaTemplateProvider";

/// Provider rendering paths and content as MiniJinja templates.
pub struct MiniJinjaTemplateProvider {
    env: Environment<'static>,
}

impl Default for MiniJinjaTemplateProvider {
    fn default() -> Self {
        MiniJinjaTemplateProvider::new()
    }
}

impl MiniJinjaTemplateProvider {
    /// Creates the environment with the case conversion filters registered.
    pub fn new() -> Self {
        let mut env = Environment::new();
        env.set_keep_trailing_newline(true);
        env.add_filter("snake_case", |value: String| value.to_snake_case());
        env.add_filter("camel_case", |value: String| value.to_camel_case());
        env.add_filter("pascal_case", |value: String| value.to_pascal_case());
        env.add_filter("kebab_case", |value: String| value.to_kebab_case());
        env.add_filter("screaming_snake_case", |value: String| value.to_screaming_snake_case());
        env.add_filter("title_case", |value: String| value.to_title_case());
        Self { env }
    }

    /// Renders `template` with the context variables.
    ///
    /// # Errors
    /// * `Error::ProviderError` if MiniJinja fails to parse or render
    pub fn render(&self, name: &str, template: &str, context: &GenerationContext) -> Result<String> {
        self.env
            .render_named_str(name, template, context.variables())
            .map_err(|e| Error::ProviderError { provider: NAME.to_string(), reason: e.to_string() })
    }
}

impl TemplateProvider for MiniJinjaTemplateProvider {
    fn name(&self) -> &str {
        NAME
    }

    fn transform_path(&self, path: &Path, context: &GenerationContext) -> Result<PathBuf> {
        let path = path.to_string_lossy();
        self.render(&path, &path, context).map(PathBuf::from)
    }

    fn transform_content(&self, file: &TemplateFile, context: &GenerationContext) -> Result<Content> {
        let bytes = file.read().map_err(|source| Error::GenerationError {
            stage: "Reading template",
            path: file.path().to_path_buf(),
            source,
        })?;
        let text = String::from_utf8(bytes).map_err(|_| Error::ProviderError {
            provider: NAME.to_string(),
            reason: format!("'{}' is not valid UTF-8", file.relative().display()),
        })?;

        let name = file.relative().to_string_lossy();
        self.render(&name, &text, context).map(Content::Text)
    }
}
