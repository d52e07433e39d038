//! `$`-substitution provider.
//!
//! Replaces `$name` and `${name}` with variable values and `$$` with `$`.
//! Substitution is safe: unknown variables and stray `$` signs stay as they
//! are instead of raising an error.

use super::{Content, TemplateProvider};
use crate::context::{GenerationContext, TemplateFile};
use crate::error::{Error, Result};
use indexmap::IndexMap;
use log::debug;
use regex::{Captures, Regex};
use std::path::{Path, PathBuf};

pub const NAME: &str = "stringsub";
pub const EXPORT: &str = "StringTemplateProvider";

pub struct StringTemplateProvider {
    pattern: Regex,
}

impl Default for StringTemplateProvider {
    fn default() -> Self {
        StringTemplateProvider::new()
    }
}

impl StringTemplateProvider {
    pub fn new() -> Self {
        let pattern = Regex::new(
            r"\$(?:(?P<escaped>\$)|(?P<named>[_A-Za-z][_A-Za-z0-9]*)|\{(?P<braced>[_A-Za-z][_A-Za-z0-9]*)\})",
        )
        .expect("valid regex");
        Self { pattern }
    }

    /// Substitutes `variables` into `template`.
    pub fn substitute(&self, template: &str, variables: &IndexMap<String, String>) -> String {
        self.pattern
            .replace_all(template, |caps: &Captures| {
                if caps.name("escaped").is_some() {
                    return "$".to_string();
                }
                let name = caps.name("named").or_else(|| caps.name("braced"));
                name.and_then(|name| variables.get(name.as_str()))
                    .cloned()
                    .unwrap_or_else(|| caps[0].to_string())
            })
            .into_owned()
    }
}

impl TemplateProvider for StringTemplateProvider {
    fn name(&self) -> &str {
        NAME
    }

    fn transform_path(&self, path: &Path, context: &GenerationContext) -> Result<PathBuf> {
        Ok(PathBuf::from(self.substitute(&path.to_string_lossy(), context.variables())))
    }

    fn transform_content(&self, file: &TemplateFile, context: &GenerationContext) -> Result<Content> {
        let bytes = file.read().map_err(|source| Error::GenerationError {
            stage: "Reading template",
            path: file.path().to_path_buf(),
            source,
        })?;

        match String::from_utf8(bytes) {
            Ok(text) => Ok(Content::Text(self.substitute(&text, context.variables()))),
            Err(e) => {
                debug!("'{}' is not UTF-8, leaving it untouched", file.relative().display());
                Ok(Content::Binary(e.into_bytes()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> IndexMap<String, String> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn test_substitutes_both_forms() {
        let provider = StringTemplateProvider::new();
        let variables = vars(&[("name", "demo"), ("version", "1.0")]);

        assert_eq!(provider.substitute("$name v${version}", &variables), "demo v1.0");
        assert_eq!(provider.substitute("${name}_lib", &variables), "demo_lib");
    }

    #[test]
    fn test_missing_variables_are_left_alone() {
        let provider = StringTemplateProvider::new();
        let variables = vars(&[("name", "demo")]);

        assert_eq!(provider.substitute("$name $missing ${other}", &variables), "demo $missing ${other}");
    }

    #[test]
    fn test_escape_and_stray_dollars() {
        let provider = StringTemplateProvider::new();
        let variables = vars(&[("price", "5")]);

        assert_eq!(provider.substitute("$$price costs $$ $price $1 ${", &variables), "$price costs $ 5 $1 ${");
    }

    #[test]
    fn test_transform_path() {
        let provider = StringTemplateProvider::new();
        let context = GenerationContext::new("out", vars(&[("pkg", "core")]));

        let path = provider.transform_path(Path::new("src/$pkg/mod.rs"), &context).unwrap();
        assert_eq!(path, PathBuf::from("src/core/mod.rs"));
    }
}
